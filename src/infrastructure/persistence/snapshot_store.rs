//! JSON snapshot files under the state directory.
//!
//! Every write goes to a temporary sibling first and is renamed into place,
//! so concurrent readers see either the previous or the new file, never a
//! partial one.

use crate::domain::errors::StateError;
use crate::domain::health::SnapshotProbe;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// `Ok(None)` when the file does not exist.
    pub fn load<T: DeserializeOwned>(&self, file_name: &str) -> Result<Option<T>, StateError> {
        let path = self.path(file_name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Read { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StateError::Parse { path, source })
    }

    /// Prior state for a read-modify-write cycle. Unreadable state restarts from empty.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, file_name: &str) -> T {
        match self.load(file_name) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Discarding unreadable state: {}", e);
                T::default()
            }
        }
    }

    pub fn save<T: Serialize>(&self, file_name: &str, value: &T) -> Result<(), StateError> {
        let path = self.path(file_name);
        let content = serde_json::to_string_pretty(value).map_err(|source| StateError::Parse {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.dir).map_err(|source| StateError::Write {
            path: self.dir.clone(),
            source,
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = self.dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));
        if let Err(source) = fs::write(&temp_path, content) {
            let _ = fs::remove_file(&temp_path);
            return Err(StateError::Write { path: temp_path, source });
        }
        if let Err(source) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StateError::Write { path, source });
        }

        debug!("Saved {:?}", path);
        Ok(())
    }

    /// Inspects another worker's snapshot without interpreting its schema.
    ///
    /// The run time is the top-level `timestamp` field (RFC 3339 or epoch
    /// milliseconds), falling back to the file's modification time.
    pub fn probe(&self, file_name: &str) -> SnapshotProbe {
        let path = self.path(file_name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return SnapshotProbe::Absent,
            Err(e) => return SnapshotProbe::Corrupt(e.to_string()),
        };
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => return SnapshotProbe::Corrupt(e.to_string()),
        };

        let last_run = value
            .get("timestamp")
            .and_then(timestamp_from_json)
            .or_else(|| modified_time(&path));
        SnapshotProbe::Readable { last_run }
    }
}

fn timestamp_from_json(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        serde_json::Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        _ => None,
    }
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
