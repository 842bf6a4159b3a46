//! Health Monitor worker.
//!
//! Reads every worker's snapshot, pings Binance and writes `health.json`.
//! Prints one warning line when the pipeline is not healthy.

use market_pulse::application::Launch;
use market_pulse::application::agents::HealthMonitor;
use market_pulse::application::agents::health_monitor::{STALE_LOCK_AFTER, WORKER};
use market_pulse::application::bootstrap::run_worker;

#[tokio::main]
async fn main() {
    run_worker(WORKER, STALE_LOCK_AFTER, |config| {
        let monitor = HealthMonitor::from_config(config);
        Ok(Launch::Run(async move { monitor.run().await }))
    })
    .await;
}
