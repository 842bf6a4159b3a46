//! Configuration module for the pipeline workers.
//!
//! Thresholds are compiled-in; endpoints, the state directory and the
//! credentials location are overridable from environment variables,
//! organized by concern: Upstream, Storage, Scanner, Monitors and
//! Observability.

mod broker_config;
mod monitor_config;
mod observability_config;
mod scanner_config;
pub mod storage_config;

pub use broker_config::{BinanceConfig, DataSourceConfig, TradeBoardConfig, UpstreamEnvConfig};
pub use monitor_config::{
    FeedConfig, HealthEnvConfig, MacroEnvConfig, NewsEnvConfig, SentinelEnvConfig,
};
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use scanner_config::ScannerEnvConfig;
pub use storage_config::StorageEnvConfig;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Full configuration shared by all worker binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream: UpstreamEnvConfig,
    pub storage: StorageEnvConfig,
    pub scanner: ScannerEnvConfig,
    pub macro_pulse: MacroEnvConfig,
    pub news: NewsEnvConfig,
    pub sentinel: SentinelEnvConfig,
    pub health: HealthEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            upstream: UpstreamEnvConfig::from_env(),
            storage: StorageEnvConfig::from_env(),
            scanner: ScannerEnvConfig::from_env().context("Failed to load scanner config")?,
            macro_pulse: MacroEnvConfig::from_env().context("Failed to load macro config")?,
            news: NewsEnvConfig::from_env().context("Failed to load news config")?,
            sentinel: SentinelEnvConfig::default(),
            health: HealthEnvConfig::default(),
            observability: ObservabilityEnvConfig::from_env(),
        })
    }

    /// Overrides the state directory (e.g. from a CLI flag).
    pub fn with_state_dir(mut self, state_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = state_dir {
            self.storage = StorageEnvConfig::with_state_dir(dir);
        }
        self
    }
}
