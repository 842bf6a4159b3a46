//! Macro Pulse worker.
//!
//! Writes `macro-pulse.json` and maintains `macro-history.json`. Intended to
//! run on a ~15-30 minute cadence.

use market_pulse::application::Launch;
use market_pulse::application::agents::MacroPulseMonitor;
use market_pulse::application::agents::macro_pulse::{STALE_LOCK_AFTER, WORKER};
use market_pulse::application::bootstrap::run_worker;

#[tokio::main]
async fn main() {
    run_worker(WORKER, STALE_LOCK_AFTER, |config| {
        let monitor = MacroPulseMonitor::from_config(config)?;
        Ok(Launch::Run(async move { monitor.run().await }))
    })
    .await;
}
