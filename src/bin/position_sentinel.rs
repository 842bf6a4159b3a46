//! Position Sentinel worker.
//!
//! Needs `TRADE_BOARD_API_KEY` in the credentials file; without it the run
//! is skipped. Intended to run every minute.

use market_pulse::application::agents::PositionSentinel;
use market_pulse::application::agents::position_sentinel::{STALE_LOCK_AFTER, WORKER};
use market_pulse::application::bootstrap::run_worker;

#[tokio::main]
async fn main() {
    run_worker(WORKER, STALE_LOCK_AFTER, |config| {
        Ok(PositionSentinel::prepare(config).map(|sentinel| async move { sentinel.run().await }))
    })
    .await;
}
