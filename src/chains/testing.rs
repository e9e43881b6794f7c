//! ブラウザなしで仮想スクロールテーブルを再現するテスト用実装

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::traits::{RowFieldReader, TablePage, Viewport};

use super::types::{FieldSlot, ScrollMetrics};

const FAKE_VIEWPORT: f64 = 800.0;
const FAKE_STEP: f64 = 500.0;

#[derive(Debug, Clone)]
pub struct FakeRow {
    name: Option<String>,
    protocols: Option<String>,
    tvl: Option<String>,
    chain_link: bool,
    evicted: bool,
}

impl FakeRow {
    pub fn chain(name: &str, protocols: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            protocols: Some(protocols.to_string()),
            tvl: Some("$1b".to_string()),
            chain_link: true,
            evicted: false,
        }
    }

    /// `/chain/` へのリンクを持たない行（ヘッダ等）
    pub fn plain(name: &str) -> Self {
        Self {
            chain_link: false,
            ..Self::chain(name, "0")
        }
    }

    pub fn with_tvl(mut self, tvl: &str) -> Self {
        self.tvl = Some(tvl.to_string());
        self
    }

    pub fn without_tvl(mut self) -> Self {
        self.tvl = None;
        self
    }

    pub fn hidden_name(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn evicted(mut self) -> Self {
        self.evicted = true;
        self
    }
}

/// スクロール位置ごとに描画される行のウィンドウを持つテーブル
pub struct FakeTable {
    windows: Vec<Vec<FakeRow>>,
    metrics: Vec<ScrollMetrics>,
    fail_open: bool,
    fail_advance_at: Option<usize>,
    cancel_at: Option<(usize, CancellationToken)>,
    pub opened: bool,
    pub warmed_up: bool,
    pub close_calls: usize,
    pub advances: usize,
}

impl FakeTable {
    /// ドキュメントの高さは一定。最後のウィンドウで最下部に達する
    pub fn new(windows: Vec<Vec<FakeRow>>) -> Self {
        let last = windows.len().saturating_sub(1);
        let document_height = FAKE_VIEWPORT + FAKE_STEP * last as f64;
        let metrics = (1..=last.max(1))
            .map(|k| ScrollMetrics {
                scroll_y: FAKE_STEP * k.min(last) as f64,
                viewport_height: FAKE_VIEWPORT,
                document_height,
            })
            .collect();

        Self {
            windows,
            metrics,
            fail_open: false,
            fail_advance_at: None,
            cancel_at: None,
            opened: false,
            warmed_up: false,
            close_calls: 0,
            advances: 0,
        }
    }

    /// n回目のスクロール後の位置を指定する（範囲外は最後の値を繰り返す）
    pub fn with_metrics(mut self, metrics: Vec<ScrollMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// n回目のスクロールでページが閉じられたことにする
    pub fn failing_advance_at(mut self, n: usize) -> Self {
        self.fail_advance_at = Some(n);
        self
    }

    /// n回目のスクロールの直後にトークンをキャンセルする
    pub fn cancelling_at(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_at = Some((n, token));
        self
    }

    fn current_metrics(&self) -> ScrollMetrics {
        let idx = self.advances.saturating_sub(1);
        self.metrics
            .get(idx)
            .or_else(|| self.metrics.last())
            .copied()
            .unwrap_or(ScrollMetrics {
                scroll_y: 0.0,
                viewport_height: FAKE_VIEWPORT,
                document_height: FAKE_VIEWPORT,
            })
    }
}

#[async_trait]
impl Viewport for FakeTable {
    async fn advance(&mut self, _step: u32) -> Result<ScrollMetrics, ScraperError> {
        if !self.opened {
            return Err(ScraperError::Navigation("page is closed".into()));
        }
        self.advances += 1;

        if self.fail_advance_at == Some(self.advances) {
            return Err(ScraperError::Navigation("target closed".into()));
        }
        if let Some((n, token)) = &self.cancel_at {
            if *n == self.advances {
                token.cancel();
            }
        }

        Ok(self.current_metrics())
    }
}

#[async_trait]
impl RowFieldReader for FakeTable {
    type Row = FakeRow;

    async fn has_detail_link(&self, row: &FakeRow) -> Result<bool, ScraperError> {
        Ok(row.chain_link)
    }

    async fn read_field(
        &self,
        row: &FakeRow,
        slot: FieldSlot,
    ) -> Result<Option<String>, ScraperError> {
        if row.evicted {
            return Err(ScraperError::Element("node is detached from document".into()));
        }
        Ok(match slot {
            FieldSlot::Name => row.name.clone(),
            FieldSlot::Protocols => row.protocols.clone(),
            FieldSlot::Tvl => row.tvl.clone(),
        })
    }
}

#[async_trait]
impl TablePage for FakeTable {
    async fn open(&mut self) -> Result<(), ScraperError> {
        if self.fail_open {
            return Err(ScraperError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        self.opened = true;
        Ok(())
    }

    async fn warm_up(&mut self) -> Result<(), ScraperError> {
        self.warmed_up = true;
        Ok(())
    }

    async fn rendered_rows(&self) -> Result<Vec<FakeRow>, ScraperError> {
        if !self.opened {
            return Err(ScraperError::Navigation("page is closed".into()));
        }
        let last = self.windows.len().saturating_sub(1);
        Ok(self
            .windows
            .get(self.advances.min(last))
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.opened = false;
        self.close_calls += 1;
        Ok(())
    }
}
