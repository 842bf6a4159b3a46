//! Opportunity Scanner worker.
//!
//! Scores liquid USDT pairs and writes `watchlist.json`. Intended to run on
//! a ~30 minute cadence.

use market_pulse::application::Launch;
use market_pulse::application::agents::OpportunityScanner;
use market_pulse::application::agents::scanner::{STALE_LOCK_AFTER, WORKER};
use market_pulse::application::bootstrap::run_worker;

#[tokio::main]
async fn main() {
    run_worker(WORKER, STALE_LOCK_AFTER, |config| {
        let scanner = OpportunityScanner::from_config(config);
        Ok(Launch::Run(async move { scanner.run().await }))
    })
    .await;
}
