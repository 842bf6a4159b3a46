//! News Scanner worker.
//!
//! Writes `news-scan.json` and keeps the seen-title set in `news-seen.json`.

use market_pulse::application::Launch;
use market_pulse::application::agents::NewsScanner;
use market_pulse::application::agents::news_scanner::{STALE_LOCK_AFTER, WORKER};
use market_pulse::application::bootstrap::run_worker;

#[tokio::main]
async fn main() {
    run_worker(WORKER, STALE_LOCK_AFTER, |config| {
        let scanner = NewsScanner::from_config(config)?;
        Ok(Launch::Run(async move { scanner.run().await }))
    })
    .await;
}
