//! Exclusive lock file guarding a store's read-modify-write cycle.

use crate::error::{AgentError, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// A lock file older than this was left by a run that died while holding it.
///
/// A live run holds the lock only for one workbook read and rewrite.
pub const STALE_AFTER: Duration = Duration::from_secs(120);

/// How long [`StoreLock::acquire`] waits for a live holder to finish.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Held while a run rewrites a store; removed on drop.
///
/// The lock is a sibling file `<store>.lock` created with create-new
/// semantics, so a second process waits instead of racing the first one
/// past the novelty check. A lock file whose mtime is older than
/// [`STALE_AFTER`] is evicted.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Acquire the lock for `store_path`, waiting up to [`WAIT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Storage`] if another run still holds the lock
    /// after the wait, or the lock file cannot be created.
    pub fn acquire(store_path: &Path) -> Result<Self> {
        Self::acquire_within(store_path, WAIT_TIMEOUT)
    }

    /// Like [`StoreLock::acquire`] with an explicit wait.
    ///
    /// # Errors
    ///
    /// Same as [`StoreLock::acquire`].
    pub fn acquire_within(store_path: &Path, timeout: Duration) -> Result<Self> {
        let path = lock_path_for(store_path);
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // Owner pid helps when a stale lock has to be inspected by hand.
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        tracing::debug!(
                            lock = %path.display(),
                            error = %e,
                            "could not record pid in store lock"
                        );
                    }
                    tracing::debug!(lock = %path.display(), "store lock acquired");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if evict_stale_lock(&path, STALE_AFTER) {
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(AgentError::Storage(format!(
                            "{} is locked by another run (remove {} if no run is active)",
                            store_path.display(),
                            path.display()
                        )));
                    }
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(AgentError::Storage(format!(
                        "cannot create lock {}: {e}",
                        path.display()
                    )));
                }
            }
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to remove store lock");
        }
    }
}

/// Remove `lock_path` if it was last modified more than `max_age` ago.
///
/// Returns whether a stale lock was removed.
fn evict_stale_lock(lock_path: &Path, max_age: Duration) -> bool {
    let Ok(modified) = std::fs::metadata(lock_path).and_then(|m| m.modified()) else {
        return false;
    };
    let Ok(age) = SystemTime::now().duration_since(modified) else {
        return false;
    };
    if age <= max_age {
        return false;
    }

    let holder = std::fs::read_to_string(lock_path).unwrap_or_default();
    match std::fs::remove_file(lock_path) {
        Ok(()) => {
            tracing::warn!(
                lock = %lock_path.display(),
                age_secs = age.as_secs(),
                holder_pid = holder.trim(),
                "evicted stale store lock"
            );
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(
                lock = %lock_path.display(),
                error = %e,
                "cannot evict stale store lock"
            );
            false
        }
    }
}

/// `<store>.lock` next to the store file.
pub fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
