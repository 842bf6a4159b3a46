//! Per-worker lock file preventing two runs of the same worker from
//! overlapping on the same snapshot files.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Held for the duration of a run; the lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn lock_path(dir: &Path, worker: &str) -> PathBuf {
        dir.join(format!(".{}.lock", worker))
    }

    /// Returns `Ok(None)` while another run holds a lock younger than `stale_after`.
    pub fn acquire(dir: &Path, worker: &str, stale_after: Duration) -> Result<Option<Self>> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        let path = Self::lock_path(dir, worker);

        if Self::try_create(&path)? {
            return Ok(Some(Self { path }));
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();
        if age < stale_after {
            debug!("{} lock held for {:?}, skipping run", worker, age);
            return Ok(None);
        }

        warn!("Taking over stale {} lock ({:?} old)", worker, age);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("Failed to remove {:?}", path)),
        }
        // Another process may win the race after removal.
        if Self::try_create(&path)? {
            Ok(Some(Self { path }))
        } else {
            Ok(None)
        }
    }

    fn try_create(path: &Path) -> Result<bool> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to create lock {:?}", path)),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!("Failed to remove lock {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_until_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let first = RunLock::acquire(tmp.path(), "scanner", Duration::from_secs(600)).unwrap();
        assert!(first.is_some());
        assert!(RunLock::acquire(tmp.path(), "scanner", Duration::from_secs(600)).unwrap().is_none());

        drop(first);
        assert!(!RunLock::lock_path(tmp.path(), "scanner").exists());
        assert!(RunLock::acquire(tmp.path(), "scanner", Duration::from_secs(600)).unwrap().is_some());
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(RunLock::lock_path(tmp.path(), "news_scanner"), "999\n").unwrap();
        let lock = RunLock::acquire(tmp.path(), "news_scanner", Duration::ZERO).unwrap();
        assert!(lock.is_some());
    }

    #[test]
    fn test_locks_are_per_worker() {
        let tmp = tempfile::tempdir().unwrap();
        let _a = RunLock::acquire(tmp.path(), "scanner", Duration::from_secs(600)).unwrap();
        assert!(RunLock::acquire(tmp.path(), "macro_pulse", Duration::from_secs(600)).unwrap().is_some());
    }
}
