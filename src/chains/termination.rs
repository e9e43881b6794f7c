//! スクロール終了判定
//!
//! 遅延描画のため「最下部に到達した」という判定は一度では信用できない。
//! 最下部を検出した後も予算分だけスクロールを続け、その間ずっと最下部のままなら終了する。

use super::types::ScrollMetrics;

/// 最下部検出後の追加スクロール回数のデフォルト
pub const DEFAULT_BOTTOM_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    Scanning,
    /// 最下部を検出済み。値は残りのリトライ回数
    AtBottomPending(u32),
    Done,
}

#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    budget: u32,
    phase: ScrollPhase,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BOTTOM_RETRIES)
    }
}

impl TerminationPolicy {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            phase: ScrollPhase::Scanning,
        }
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == ScrollPhase::Done
    }

    /// スクロール1回ごとに呼ぶ
    pub fn observe(&mut self, metrics: &ScrollMetrics) -> ScrollPhase {
        let at_bottom = metrics.is_at_bottom();

        self.phase = match self.phase {
            ScrollPhase::Scanning if at_bottom => ScrollPhase::AtBottomPending(self.budget),
            ScrollPhase::Scanning => ScrollPhase::Scanning,
            // ドキュメントが伸びた（追加の行が読み込まれた）
            ScrollPhase::AtBottomPending(_) if !at_bottom => ScrollPhase::Scanning,
            ScrollPhase::AtBottomPending(0) => ScrollPhase::Done,
            ScrollPhase::AtBottomPending(k) => ScrollPhase::AtBottomPending(k - 1),
            ScrollPhase::Done => ScrollPhase::Done,
        };
        self.phase
    }
}
