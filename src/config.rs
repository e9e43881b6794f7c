use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::ScraperError;

pub const DEFAULT_TARGET_URL: &str = "https://defillama.com/chains";
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;
/// 実行間隔の上限（1週間）
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// プロキシ設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub enabled: bool,
    pub server: String,
    pub username: String,
    pub password: String,
}

impl ProxySettings {
    /// Chromium 起動引数（有効かつサーバー指定ありの場合のみ）
    pub fn server_arg(&self) -> Option<String> {
        (self.enabled && !self.server.is_empty()).then(|| format!("--proxy-server={}", self.server))
    }

    /// プロキシ認証情報 (username, password)
    pub fn credentials(&self) -> Option<(&str, &str)> {
        (self.enabled && !self.username.is_empty())
            .then_some((self.username.as_str(), self.password.as_str()))
    }
}

/// アプリケーション設定
///
/// プロセス起動時に一度だけ構築し、スケジューラとオーケストレータへ渡す。
/// JSON に存在しないキーはすべてデフォルト値になる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub interval_minutes: u64,
    pub proxy_settings: ProxySettings,
    pub target_url: String,
    pub output_path: PathBuf,
    pub headless: bool,
    /// 1ステップあたりのスクロール量（px）
    pub scroll_step: u32,
    /// 初回描画を促すためのスクロール量（px）
    pub warm_up_step: u32,
    /// 最下部検出後の追加スクロール回数
    pub bottom_retries: u32,
    /// スクロール後、仮想リストの再描画を待つ時間（ミリ秒）
    pub scroll_settle_ms: u64,
    pub page_ready_timeout_secs: u64,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            proxy_settings: ProxySettings::default(),
            target_url: DEFAULT_TARGET_URL.to_string(),
            output_path: PathBuf::from("output/result.json"),
            headless: true,
            scroll_step: 500,
            warm_up_step: 300,
            bottom_retries: 3,
            scroll_settle_ms: 250,
            page_ready_timeout_secs: 30,
            debug: false,
        }
    }
}

impl AppConfig {
    /// 設定ファイルを読み込む。存在しなければデフォルトを書き出して返す。
    ///
    /// 読み込みに失敗してもエラーにはせず、デフォルト設定で続行する。
    pub fn load_or_create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Config file not found: {:?}. Using default configuration.", path);
            let config = Self::default();
            match config.write_to(path) {
                Ok(()) => info!(
                    "Created default config file: {:?}. Please review and configure it.",
                    path
                ),
                Err(e) => error!("Failed to create default config file {:?}: {}", path, e),
            }
            return config;
        }

        match Self::read_from(path) {
            Ok(config) => {
                info!("Config loaded from {:?}", path);
                config.validated()
            }
            Err(e) => {
                error!("Error loading config: {}. Using default configuration.", e);
                Self::default()
            }
        }
    }

    /// キー単位でデフォルトに上書きする。型の合わないキーは警告してデフォルトのまま残す
    fn read_from(path: &Path) -> Result<Self, ScraperError> {
        let text = std::fs::read_to_string(path)?;
        let loaded: Value =
            serde_json::from_str(&text).map_err(|e| ScraperError::Config(e.to_string()))?;
        let Value::Object(loaded) = loaded else {
            return Err(ScraperError::Config(
                "config root must be a JSON object".to_string(),
            ));
        };

        let mut merged = serde_json::to_value(Self::default())?;
        for (key, value) in loaded {
            let mut candidate = merged.clone();
            candidate[key.as_str()] = value;
            match serde_json::from_value::<Self>(candidate.clone()) {
                Ok(_) => merged = candidate,
                Err(e) => warn!("Ignoring invalid config key '{}': {}", key, e),
            }
        }

        serde_json::from_value(merged).map_err(|e| ScraperError::Config(e.to_string()))
    }

    fn write_to(&self, path: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validated(mut self) -> Self {
        if self.interval_minutes == 0 {
            warn!(
                "interval_minutes must be positive, falling back to {}",
                DEFAULT_INTERVAL_MINUTES
            );
            self.interval_minutes = DEFAULT_INTERVAL_MINUTES;
        }
        if self.interval_minutes > MAX_INTERVAL_MINUTES {
            warn!(
                "interval_minutes {} is too large, clamping to {}",
                self.interval_minutes, MAX_INTERVAL_MINUTES
            );
            self.interval_minutes = MAX_INTERVAL_MINUTES;
        }
        if self.scroll_step == 0 {
            warn!("scroll_step must be positive, falling back to 500");
            self.scroll_step = 500;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_bottom_retries(mut self, retries: u32) -> Self {
        self.bottom_retries = retries;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy_settings = proxy;
        self
    }
}
