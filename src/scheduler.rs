//! 一定間隔でスクレイプを実行するスケジューラ

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};
use tracing::{error, info};

use crate::chains::ResultBatch;
use crate::config::MAX_INTERVAL_MINUTES;
use crate::error::ScraperError;
use crate::service::ScrapeRequest;
use crate::store::ResultStore;

const MIN_PERIOD: Duration = Duration::from_secs(1);
const MAX_PERIOD: Duration = Duration::from_secs(MAX_INTERVAL_MINUTES * 60);

/// 実行は1つずつ順番に行う。前回の実行が終わるまで次のtickは発火しない。
pub struct Scheduler<S> {
    service: S,
    store: ResultStore,
    period: Duration,
}

impl<S> Scheduler<S>
where
    S: Service<ScrapeRequest, Response = ResultBatch, Error = ScraperError>,
{
    /// `period` は1秒〜1週間の範囲に切り詰める
    pub fn new(service: S, store: ResultStore, period: Duration) -> Self {
        Self {
            service,
            store,
            period: period.clamp(MIN_PERIOD, MAX_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// `cancel` が発火するまで実行し続ける
    ///
    /// 最初の実行は1周期後。実行中にキャンセルされた場合、その回の結果は保存しない。
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Scheduler was started with interval of {:?}.", self.period);

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick(&cancel).await,
            }
        }

        info!("Scheduler stopped.");
    }

    /// 失敗してもループは止めない。結果はここでログに出す
    async fn tick(&mut self, cancel: &CancellationToken) {
        match self.scrape_and_store(cancel).await {
            Ok(total) => info!("Run finished, {} batches stored", total),
            Err(ScraperError::Cancelled) => info!("Run cancelled, partial data discarded"),
            Err(e) => error!("Scrape run failed, skipping until next tick: {}", e),
        }
    }

    /// 1回分: スクレイプ → 保存。保存後の件数を返す
    pub async fn scrape_and_store(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<usize, ScraperError> {
        let request = ScrapeRequest::new().with_cancellation(cancel.child_token());
        let batch = self.service.ready().await?.call(request).await?;
        self.store.append(&batch)
    }
}
