use std::sync::Arc;

use chain_scraper::{AppConfig, ChainScrapeService, ResultStore, ScrapeRequest};
use tower::Service;

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Arc::new(
        AppConfig::default()
            .with_headless(false) // デバッグ用に表示モード
            .with_output_path("./output/scrape_once.json"),
    );

    let mut service = ChainScrapeService::new(config.clone());

    println!("=== Chain Scraper Test ===");

    match service.call(ScrapeRequest::new()).await {
        Ok(batch) => {
            println!("成功! {}: {} chains", batch.label(), batch.len());
            for row in batch.rows().iter().take(10) {
                println!("  - {} (protocols={}, tvl={})", row.name, row.protocols, row.tvl);
            }
            match ResultStore::new(&config.output_path).append(&batch) {
                Ok(total) => println!("保存先: {:?} ({} batches)", config.output_path, total),
                Err(e) => eprintln!("保存エラー: {}", e),
            }
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }
}
