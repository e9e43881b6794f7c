//! DefiLlama チェーン一覧スクレイパー
//!
//! - 仮想スクロールのテーブルをスクロールしながら全行を取得（Name で重複排除）
//! - 一定間隔で実行し、結果を JSON ファイルに追記
//!
//! # 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chain_scraper::{AppConfig, ChainScrapeService, ScrapeRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(AppConfig::default().with_headless(false));
//!     let mut service = ChainScrapeService::new(config);
//!
//!     let batch = service.call(ScrapeRequest::new()).await.unwrap();
//!     println!("{}: {} chains", batch.label(), batch.len());
//! }
//! ```
//!
//! # スケジューラ
//!
//! ```rust,ignore
//! use chain_scraper::{ResultStore, Scheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = ResultStore::new(&config.output_path);
//! let scheduler = Scheduler::new(service, store, config.interval());
//! scheduler.run(CancellationToken::new()).await;
//! ```

pub mod chains;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod traits;

// 主要な型をリエクスポート
pub use config::{AppConfig, ProxySettings};
pub use error::ScraperError;
pub use logging::{init_logging, DEFAULT_LOG_PATH};
pub use scheduler::Scheduler;
pub use service::{ChainScrapeService, ScrapeRequest};
pub use store::ResultStore;
pub use traits::{RowFieldReader, TablePage, Viewport};

pub use chains::{
    ChainPage, ChainRow, DedupAccumulator, ResultBatch, RowExtractor, ScrapeOrchestrator,
    TerminationPolicy,
};
