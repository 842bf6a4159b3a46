mod logging;
mod worker;

pub use logging::init_tracing;
pub use worker::{WorkerArgs, run_worker};
