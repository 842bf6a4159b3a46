//! Snapshot/state file locations.
//!
//! Every worker owns its own files under a single state directory.

use std::env;
use std::path::{Path, PathBuf};

pub const WATCHLIST_FILE: &str = "watchlist.json";
pub const MACRO_SNAPSHOT_FILE: &str = "macro-pulse.json";
pub const MACRO_HISTORY_FILE: &str = "macro-history.json";
pub const SENTINEL_PRICES_FILE: &str = "sentinel-prices.json";
pub const SENTINEL_ALERTS_FILE: &str = "sentinel-alerts.json";
pub const NEWS_SNAPSHOT_FILE: &str = "news-scan.json";
pub const NEWS_SEEN_FILE: &str = "news-seen.json";
pub const HEALTH_REPORT_FILE: &str = "health.json";
pub const HEALTH_STATE_FILE: &str = "health-state.json";

#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub state_dir: PathBuf,
    pub credentials_file: PathBuf,
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let state_dir = PathBuf::from(
            env::var("PULSE_STATE_DIR").unwrap_or_else(|_| "./data".to_string()),
        );
        Self::with_state_dir(state_dir)
    }

    /// Rebases every path on `state_dir`, keeping an explicit credentials override.
    pub fn with_state_dir(state_dir: PathBuf) -> Self {
        let credentials_file = env::var("SENTINEL_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| state_dir.join(".credentials"));
        Self {
            state_dir,
            credentials_file,
        }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.state_dir.join(file_name)
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}
