use std::path::{Path, PathBuf};
use std::sync::Arc;

use chain_scraper::{
    init_logging, AppConfig, ChainScrapeService, ResultStore, Scheduler, DEFAULT_LOG_PATH,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _log_guard = match init_logging(Path::new(DEFAULT_LOG_PATH)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("ログ初期化に失敗しました: {}", e);
            None
        }
    };

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let config = Arc::new(AppConfig::load_or_create(&config_path));

    let service = ChainScrapeService::new(config.clone());
    let store = ResultStore::new(&config.output_path);
    let scheduler = Scheduler::new(service, store, config.interval());

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Program was stopped by user.");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    scheduler.run(cancel).await;
}
