//! ログ初期化
//!
//! ファイル（ANSIなし）と標準出力の二系統に出力する。

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ScraperError;

pub const DEFAULT_LOG_PATH: &str = "logs/scraper.log";

/// グローバルなtracing subscriberを設定する
///
/// 戻り値のガードはプロセス終了まで保持すること（dropするとファイル出力が止まる）。
pub fn init_logging(log_path: &Path) -> Result<WorkerGuard, ScraperError> {
    let dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_path
        .file_name()
        .ok_or_else(|| ScraperError::Config(format!("invalid log path: {:?}", log_path)))?;

    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stdout))
        .try_init()
        .map_err(|e| ScraperError::Config(format!("logger already initialized: {}", e)))?;

    Ok(guard)
}
