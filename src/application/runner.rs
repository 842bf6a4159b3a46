//! The single top-level boundary every worker runs behind.
//!
//! A run either completes, is skipped, or fails; none of these escape as an
//! error or a panic, and the process always exits normally.

use crate::infrastructure::persistence::RunLock;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { summary: String },
    Skipped { reason: String },
    Failed { error: String },
}

impl RunOutcome {
    pub fn completed(summary: impl Into<String>) -> Self {
        Self::Completed {
            summary: summary.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { summary } => write!(f, "completed: {}", summary),
            Self::Skipped { reason } => write!(f, "skipped: {}", reason),
            Self::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// What a worker's setup step decided before any state is touched.
pub enum Launch<F> {
    Run(F),
    /// Nothing to do this cycle; no lock is taken and nothing is written.
    Skip(String),
}

impl<F> Launch<F> {
    pub fn map<G>(self, f: impl FnOnce(F) -> G) -> Launch<G> {
        match self {
            Launch::Run(run) => Launch::Run(f(run)),
            Launch::Skip(reason) => Launch::Skip(reason),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs one worker cycle under its lock file.
///
/// The run executes on its own task so a panic is observed as a `JoinError`
/// and folded into `Failed`. The lock is released when this returns.
pub async fn run_guarded<F>(
    worker: &str,
    lock_dir: &Path,
    stale_lock_after: Duration,
    run: F,
) -> RunOutcome
where
    F: Future<Output = anyhow::Result<RunOutcome>> + Send + 'static,
{
    let _lock = match RunLock::acquire(lock_dir, worker, stale_lock_after) {
        Ok(Some(lock)) => lock,
        Ok(None) => return report(worker, RunOutcome::skipped("previous run still active")),
        Err(e) => return report(worker, RunOutcome::failed(format!("{:#}", e))),
    };

    let outcome = match tokio::spawn(run).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => RunOutcome::failed(format!("{:#}", e)),
        Err(join_error) if join_error.is_panic() => {
            RunOutcome::failed(format!("panicked: {}", panic_message(join_error.into_panic())))
        }
        Err(join_error) => RunOutcome::failed(join_error.to_string()),
    };
    report(worker, outcome)
}

/// Runs a launched cycle behind the guard. A skip returns before the lock
/// directory is touched.
pub async fn run_launch<F>(
    worker: &str,
    lock_dir: &Path,
    stale_lock_after: Duration,
    launch: Launch<F>,
) -> RunOutcome
where
    F: Future<Output = anyhow::Result<RunOutcome>> + Send + 'static,
{
    match launch {
        Launch::Run(run) => run_guarded(worker, lock_dir, stale_lock_after, run).await,
        Launch::Skip(reason) => report(worker, RunOutcome::skipped(reason)),
    }
}

fn report(worker: &str, outcome: RunOutcome) -> RunOutcome {
    debug!("{} {}", worker, outcome);
    outcome
}
