//! DefiLlama チェーン一覧スクレイパー
//!
//! 仮想スクロールのテーブルを少しずつスクロールしながら、描画された行だけを抽出し、
//! Name で重複を除いて1回分の結果にまとめる。

mod accumulator;
mod extractor;
mod orchestrator;
mod page;
mod termination;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use accumulator::DedupAccumulator;
pub use extractor::RowExtractor;
pub use orchestrator::{ScrapeOrchestrator, DEFAULT_SCROLL_STEP};
pub use page::ChainPage;
pub use termination::{ScrollPhase, TerminationPolicy, DEFAULT_BOTTOM_RETRIES};
pub use types::{
    ChainRow, FieldSlot, ResultBatch, RowExtraction, ScrollMetrics, SkipReason, NOT_AVAILABLE,
};
