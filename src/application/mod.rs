// Worker agents, one per binary
pub mod agents;

// Process entry: CLI, environment, logging
pub mod bootstrap;

// Top-level run boundary
pub mod runner;

pub use runner::{Launch, RunOutcome, run_guarded, run_launch};
