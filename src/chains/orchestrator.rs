//! スクレイプ実行の制御
//!
//! ページを開く → 初回スクロール → {描画中の行を抽出 → スクロール → 終了判定} を
//! 終了判定が `Done` になるまで繰り返す。

use std::future::Future;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::traits::TablePage;

use super::accumulator::DedupAccumulator;
use super::extractor::RowExtractor;
use super::termination::{ScrollPhase, TerminationPolicy, DEFAULT_BOTTOM_RETRIES};
use super::types::{ChainRow, ResultBatch, RowExtraction};

pub const DEFAULT_SCROLL_STEP: u32 = 500;

/// 1回のスクレイプ実行
#[derive(Debug, Clone)]
pub struct ScrapeOrchestrator {
    scroll_step: u32,
    bottom_retries: u32,
}

impl Default for ScrapeOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_STEP, DEFAULT_BOTTOM_RETRIES)
    }
}

impl ScrapeOrchestrator {
    pub fn new(scroll_step: u32, bottom_retries: u32) -> Self {
        Self {
            scroll_step,
            bottom_retries,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.scroll_step, config.bottom_retries)
    }

    /// テーブル全体を取得する
    ///
    /// どの経路で終了しても `page.close()` を呼ぶ。キャンセルされた場合、途中までの
    /// 結果は破棄して `ScraperError::Cancelled` を返す。
    pub async fn run<P: TablePage>(
        &self,
        page: &mut P,
        cancel: &CancellationToken,
    ) -> Result<ResultBatch, ScraperError> {
        let started_at = Local::now();

        let opened = guarded(cancel, page.open()).await;
        let result = match opened {
            Ok(()) => self.scan(page, cancel).await,
            Err(e) => Err(e),
        };

        if let Err(e) = page.close().await {
            warn!("Failed to release page: {}", e);
        }

        let rows = result?;
        info!("Parsing was finished. Collected {} elements.", rows.len());
        Ok(ResultBatch::new(started_at, rows))
    }

    async fn scan<P: TablePage>(
        &self,
        page: &mut P,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChainRow>, ScraperError> {
        guarded(cancel, page.warm_up()).await?;

        let mut accumulator = DedupAccumulator::new();
        let mut policy = TerminationPolicy::new(self.bottom_retries);
        let mut steps = 0u32;

        while !policy.is_done() {
            self.harvest(&*page, &mut accumulator, cancel).await?;

            let metrics = guarded(cancel, page.advance(self.scroll_step)).await?;
            steps += 1;

            let previous = policy.phase();
            match policy.observe(&metrics) {
                ScrollPhase::AtBottomPending(k) => {
                    info!("Scrolling reached the end of page ({} retries left)", k)
                }
                ScrollPhase::Scanning if previous != ScrollPhase::Scanning => {
                    info!(
                        "Document grew to {}px, continuing to scroll",
                        metrics.document_height
                    )
                }
                ScrollPhase::Scanning => debug!(
                    "Scrolled to {} / {}",
                    metrics.scroll_y, metrics.document_height
                ),
                ScrollPhase::Done => info!("End of page confirmed after {} scroll steps", steps),
            }
        }

        Ok(accumulator.into_rows())
    }

    /// 現在描画されているチェーン行を抽出して蓄積する
    async fn harvest<P: TablePage>(
        &self,
        page: &P,
        accumulator: &mut DedupAccumulator,
        cancel: &CancellationToken,
    ) -> Result<(), ScraperError> {
        let rows = guarded(cancel, page.rendered_rows()).await?;
        debug!("{} rows rendered", rows.len());

        for row in &rows {
            if cancel.is_cancelled() {
                return Err(ScraperError::Cancelled);
            }

            match page.has_detail_link(row).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) if !e.is_fatal() => {
                    debug!("Skipping row while probing link: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            }

            match RowExtractor::extract(page, row).await {
                RowExtraction::Row(chain) => {
                    if accumulator.offer(chain) {
                        if let Some(added) = accumulator.rows().last() {
                            info!("Element '{}' was added", added.name);
                        }
                    }
                }
                RowExtraction::Skipped(reason) => warn!("Row skipped: {}", reason),
            }
        }

        Ok(())
    }
}

/// キャンセルされたら待機を打ち切る
async fn guarded<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, ScraperError>>,
) -> Result<T, ScraperError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ScraperError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::testing::{FakeRow, FakeTable};
    use crate::chains::types::ScrollMetrics;

    fn names(batch: &ResultBatch) -> Vec<&str> {
        batch.rows().iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_duplicate_across_windows_is_collected_once() {
        let mut table = FakeTable::new(vec![
            vec![FakeRow::chain("A", "10"), FakeRow::chain("B", "20")],
            vec![FakeRow::chain("A", "10"), FakeRow::chain("C", "30")],
        ]);

        let batch = ScrapeOrchestrator::default()
            .run(&mut table, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&batch), ["A", "B", "C"]);
        assert!(table.warmed_up);
        assert_eq!(table.close_calls, 1);
        // 最下部検出(1) + 確認(4)
        assert_eq!(table.advances, 5);
    }

    #[tokio::test]
    async fn test_non_chain_and_broken_rows_are_skipped() {
        let mut table = FakeTable::new(vec![vec![
            FakeRow::plain("Header"),
            FakeRow::chain("Ethereum", "1200"),
            FakeRow::chain("Gone", "1").evicted(),
            FakeRow::chain("Hidden", "1").hidden_name(),
            FakeRow::chain("Tron", "30").without_tvl(),
        ]]);

        let batch = ScrapeOrchestrator::default()
            .run(&mut table, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&batch), ["Ethereum", "Tron"]);
        assert_eq!(batch.rows()[1].tvl, "N/A");
    }

    #[tokio::test]
    async fn test_late_growth_is_followed() {
        let short = ScrollMetrics {
            scroll_y: 500.0,
            viewport_height: 800.0,
            document_height: 1300.0,
        };
        let grown = ScrollMetrics {
            document_height: 2100.0,
            ..short
        };
        let bottom = ScrollMetrics {
            scroll_y: 1300.0,
            ..grown
        };
        let mut table = FakeTable::new(vec![
            vec![FakeRow::chain("A", "1")],
            vec![FakeRow::chain("B", "1")],
            vec![FakeRow::chain("C", "1")],
            vec![FakeRow::chain("D", "1")],
        ])
        .with_metrics(vec![short, grown, bottom]);

        let batch = ScrapeOrchestrator::default()
            .run(&mut table, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(names(&batch), ["A", "B", "C", "D"]);
        // 最下部(1) → 伸長(2) → 最下部(3) + 確認(4)
        assert_eq!(table.advances, 7);
    }

    #[tokio::test]
    async fn test_navigation_failure_releases_page() {
        let mut table = FakeTable::new(vec![
            vec![FakeRow::chain("A", "1")],
            vec![FakeRow::chain("B", "1")],
            vec![FakeRow::chain("C", "1")],
        ])
        .failing_advance_at(2);

        let err = ScrapeOrchestrator::default()
            .run(&mut table, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ScraperError::Navigation(_)));
        assert_eq!(table.close_calls, 1);
        assert!(!table.opened);
    }

    #[tokio::test]
    async fn test_open_failure_still_closes() {
        let mut table = FakeTable::new(vec![]).failing_open();

        let err = ScrapeOrchestrator::default()
            .run(&mut table, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ScraperError::Navigation(_)));
        assert_eq!(table.close_calls, 1);
        assert_eq!(table.advances, 0);
    }

    #[tokio::test]
    async fn test_cancellation_discards_partial_batch() {
        let cancel = CancellationToken::new();
        let mut table = FakeTable::new(vec![
            vec![FakeRow::chain("A", "1")],
            vec![FakeRow::chain("B", "1")],
            vec![FakeRow::chain("C", "1")],
        ])
        .cancelling_at(1, cancel.clone());

        let err = ScrapeOrchestrator::default()
            .run(&mut table, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ScraperError::Cancelled));
        assert_eq!(table.advances, 1);
        assert_eq!(table.close_calls, 1);
    }
}
