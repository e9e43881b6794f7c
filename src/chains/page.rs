//! chromiumoxide による DefiLlama チェーン一覧ページの操作

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::auth::Credentials;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::traits::{RowFieldReader, TablePage, Viewport};

use super::types::{FieldSlot, ScrollMetrics};

const TABLE_SELECTOR: &str = "#table-wrapper";
/// 仮想リストの行: `position: absolute` + `transform: translateY(...)`
const ROW_SELECTOR: &str =
    "#table-wrapper > div:last-child div[style*='position: absolute'][style*='transform: translateY']";
const DETAIL_LINK_SELECTOR: &str = "a[href*='/chain/']";

const METRICS_SCRIPT: &str = r#"
    (() => ({
        scrollY: window.scrollY,
        viewportHeight: window.innerHeight,
        documentHeight: document.body.scrollHeight
    }))()
"#;

/// 行要素を `this` として呼び出す。非表示・存在しない場合は null
fn cell_probe_script(selector: &str) -> String {
    format!(
        r#"
        function() {{
            const el = this.querySelector("{}");
            if (!el) return null;
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            const visible = style.display !== 'none' &&
                            style.visibility !== 'hidden' &&
                            (rect.width > 0 || rect.height > 0);
            return visible ? el.textContent : null;
        }}
        "#,
        selector
    )
}

/// ブラウザ1セッション分のページ
pub struct ChainPage {
    config: Arc<AppConfig>,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl ChainPage {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler: None,
        }
    }

    fn get_page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::Navigation("Page is not open".to_string()))
    }

    async fn launch_browser(&mut self) -> Result<(), ScraperError> {
        info!("Initializing browser for chain scraper...");

        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .unwrap_or_else(|_| "chromium".to_string());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1280, 800);

        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage");

        if let Some(proxy_arg) = self.config.proxy_settings.server_arg() {
            info!("Using proxy {}", self.config.proxy_settings.server);
            builder = builder.arg(proxy_arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        self.handler = Some(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        }));
        self.browser = Some(browser);

        info!("Browser initialized successfully");
        Ok(())
    }

    /// テーブルの出現を待機
    async fn wait_for_table(&self, page: &Page) -> Result<(), ScraperError> {
        let attempts = self.config.page_ready_timeout_secs.max(1);
        let probe = format!("document.querySelector('{}') !== null", TABLE_SELECTOR);

        for i in 0..attempts {
            let found = page
                .evaluate(probe.as_str())
                .await
                .map_err(|e| ScraperError::Navigation(e.to_string()))?;

            if found.into_value::<bool>().unwrap_or(false) {
                info!("Chain table detected");
                return Ok(());
            }

            if i % 5 == 0 {
                info!("Waiting for chain table... ({}/{})", i + 1, attempts);
            }
            sleep(Duration::from_secs(1)).await;
        }

        Err(ScraperError::Navigation(format!(
            "{} not found after {}s",
            TABLE_SELECTOR, attempts
        )))
    }

    async fn debug_screenshot(&self, page: &Page) {
        if let Ok(screenshot) = page
            .screenshot(ScreenshotParams::builder().full_page(false).build())
            .await
        {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
            debug!("Page screenshot: data:image/png;base64,{}", encoded);
        }
    }

    async fn settle(&self) {
        sleep(Duration::from_millis(self.config.scroll_settle_ms)).await;
    }
}

#[async_trait]
impl Viewport for ChainPage {
    async fn advance(&mut self, step: u32) -> Result<ScrollMetrics, ScraperError> {
        let page = self.get_page()?;

        page.evaluate(format!("window.scrollBy(0, {})", step))
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        self.settle().await;

        let metrics = page
            .evaluate(METRICS_SCRIPT)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        metrics
            .into_value::<ScrollMetrics>()
            .map_err(|e| ScraperError::JavaScript(format!("scroll metrics: {}", e)))
    }
}

#[async_trait]
impl RowFieldReader for ChainPage {
    type Row = Element;

    async fn has_detail_link(&self, row: &Element) -> Result<bool, ScraperError> {
        row.find_elements(DETAIL_LINK_SELECTOR)
            .await
            .map(|links| !links.is_empty())
            .map_err(|e| ScraperError::Element(e.to_string()))
    }

    async fn read_field(
        &self,
        row: &Element,
        slot: FieldSlot,
    ) -> Result<Option<String>, ScraperError> {
        let returns = row
            .call_js_fn(cell_probe_script(slot.selector()), false)
            .await
            .map_err(|e| ScraperError::Element(e.to_string()))?;

        if let Some(details) = returns.exception_details {
            return Err(ScraperError::Element(details.text));
        }

        Ok(returns
            .result
            .value
            .and_then(|value| value.as_str().map(str::to_string)))
    }
}

#[async_trait]
impl TablePage for ChainPage {
    async fn open(&mut self) -> Result<(), ScraperError> {
        self.launch_browser().await?;

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Browser not initialized".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        if let Some((username, password)) = self.config.proxy_settings.credentials() {
            page.authenticate(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(|e| ScraperError::BrowserInit(format!("proxy authentication: {}", e)))?;
        }

        info!("Navigating to {}", self.config.target_url);
        page.goto(self.config.target_url.as_str())
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        self.wait_for_table(&page).await?;

        if self.config.debug {
            self.debug_screenshot(&page).await;
        }

        self.page = Some(page);
        Ok(())
    }

    async fn warm_up(&mut self) -> Result<(), ScraperError> {
        let page = self.get_page()?;
        let script = format!(
            r#"
            (() => {{
                const first = document.querySelector('{} > div:first-child');
                if (first) first.scrollIntoView({{ block: 'nearest' }});
                window.scrollBy(0, {});
            }})()
            "#,
            TABLE_SELECTOR, self.config.warm_up_step
        );

        page.evaluate(script)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        self.settle().await;
        Ok(())
    }

    async fn rendered_rows(&self) -> Result<Vec<Element>, ScraperError> {
        self.get_page()?
            .find_elements(ROW_SELECTOR)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if self.browser.is_none() && self.page.is_none() {
            return Ok(());
        }
        info!("Closing browser...");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser process: {}", e);
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        info!("Browser closed");
        Ok(())
    }
}
