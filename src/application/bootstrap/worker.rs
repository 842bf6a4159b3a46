use super::logging::init_tracing;
use crate::application::runner::{Launch, RunOutcome, run_launch};
use crate::config::{Config, LogFormat};
use anyhow::Result;
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Common command line of every worker binary.
#[derive(Debug, Parser)]
#[command(version, about = "Run one market-pulse worker cycle")]
pub struct WorkerArgs {
    /// Directory holding snapshot and state files (overrides PULSE_STATE_DIR)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

/// Process entry shared by the worker binaries.
///
/// Loads `.env`, configures logging, builds the agent with `build` and runs
/// it once behind the guard. `build` may skip the cycle before the state
/// directory is touched. Every failure, including a bad configuration, ends
/// as a `RunOutcome`.
pub async fn run_worker<B, F>(worker: &str, stale_lock_after: Duration, build: B) -> RunOutcome
where
    B: FnOnce(&Config) -> Result<Launch<F>>,
    F: Future<Output = Result<RunOutcome>> + Send + 'static,
{
    dotenvy::dotenv().ok();
    let args = WorkerArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config.with_state_dir(args.state_dir),
        Err(e) => {
            init_tracing(LogFormat::Compact);
            debug!("{} configuration rejected: {:#}", worker, e);
            return RunOutcome::failed(format!("{:#}", e));
        }
    };
    init_tracing(config.observability.log_format);

    let launch = match build(&config) {
        Ok(launch) => launch,
        Err(e) => {
            debug!("{} could not be built: {:#}", worker, e);
            return RunOutcome::failed(format!("{:#}", e));
        }
    };

    run_launch(worker, config.storage.state_dir(), stale_lock_after, launch).await
}
