use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::info;

use crate::chains::{ChainPage, ResultBatch, ScrapeOrchestrator};
use crate::config::AppConfig;
use crate::error::ScraperError;

/// スクレイピングリクエスト
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    pub cancel: CancellationToken,
}

impl ScrapeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// tower::Serviceを実装したチェーン一覧スクレイパー
///
/// 呼び出しごとにブラウザを起動し、終了時に必ず閉じる。
#[derive(Debug, Clone)]
pub struct ChainScrapeService {
    config: Arc<AppConfig>,
}

impl ChainScrapeService {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl Service<ScrapeRequest> for ChainScrapeService {
    type Response = ResultBatch;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("Scrape requested: target={}", self.config.target_url);
        let config = self.config.clone();

        Box::pin(async move {
            let orchestrator = ScrapeOrchestrator::from_config(&config);
            let mut page = ChainPage::new(config);

            let batch = orchestrator.run(&mut page, &req.cancel).await?;

            info!("Scrape completed: {} ({} chains)", batch.label(), batch.len());
            Ok(batch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_request_builder() {
        let token = CancellationToken::new();
        let req = ScrapeRequest::new().with_cancellation(token.clone());

        token.cancel();
        assert!(req.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_request_never_launches_browser() {
        let config = Arc::new(AppConfig::default().with_target_url("about:blank"));
        let mut service = ChainScrapeService::new(config);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service
            .call(ScrapeRequest::new().with_cancellation(cancel))
            .await;

        assert!(matches!(result, Err(ScraperError::Cancelled)));
    }
}
