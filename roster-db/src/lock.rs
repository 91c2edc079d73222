// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Hard-link database locks shared with the package-manager tooling.
//!
//! Each database file `<file>` is protected by `<file>.lock`, taken by
//! linking a process-unique temp file onto the lock path. `link(2)` is
//! atomic and fails if the destination exists, so the protocol excludes
//! any process that follows the same convention, no matter what it is
//! built with. This is not an in-process primitive: `flock()` or a mutex
//! would be invisible to the external tools writing the same files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, IoContext, Result};

/// Delay between acquisition attempts.
pub const LOCK_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Attempts before giving up (5 minutes at [`LOCK_RETRY_INTERVAL`]).
pub const LOCK_MAX_ATTEMPTS: u32 = 300;

/// Distinguishes temp files when several threads share one pid.
static LOCK_SEQ: AtomicU64 = AtomicU64::new(0);

/// An exclusive lock on a database file, held as `<file>.lock`.
///
/// Release with [`DbLock::release`] so that a failed unlink surfaces as an
/// error; dropping an unreleased lock unlinks it best-effort.
#[derive(Debug)]
pub struct DbLock {
    lock_path: PathBuf,
    released: bool,
}

impl DbLock {
    /// Acquire the lock for `path` (blocking, bounded by the retry budget).
    pub fn acquire(path: &Path) -> Result<Self> {
        Self::acquire_with(path, LOCK_MAX_ATTEMPTS, LOCK_RETRY_INTERVAL)
    }

    fn acquire_with(path: &Path, max_attempts: u32, retry_interval: Duration) -> Result<Self> {
        let lock_path = PathBuf::from(format!("{}.lock", path.display()));
        let tmp_path = PathBuf::from(format!(
            "{}.{}.{}",
            lock_path.display(),
            std::process::id(),
            LOCK_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp_path, b"")
            .io_context(|| format!("Failed to create lock temp file at {}", tmp_path.display()))?;

        for attempt in 0..max_attempts {
            match fs::hard_link(&tmp_path, &lock_path) {
                Ok(()) => {
                    // The link itself is the held lock; the temp file has
                    // served its purpose.
                    fs::remove_file(&tmp_path).io_context(|| {
                        format!("Failed to remove lock temp file at {}", tmp_path.display())
                    })?;
                    debug!("Acquired lock at {}", lock_path.display());
                    return Ok(Self {
                        lock_path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if attempt == 0 {
                        debug!("Waiting for lock at {}", lock_path.display());
                    }
                    thread::sleep(retry_interval);
                }
                Err(e) => {
                    let _ = fs::remove_file(&tmp_path);
                    return Err(Error::io(
                        format!("Failed to link lock at {}", lock_path.display()),
                        e,
                    ));
                }
            }
        }

        let _ = fs::remove_file(&tmp_path);
        Err(Error::LockTimeout {
            path: lock_path,
            attempts: max_attempts,
        })
    }

    /// Release the lock. Failure to unlink the lock file is fatal: the
    /// file can only be missing or unremovable through programmer error,
    /// never through contention.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.lock_path).map_err(|e| Error::LockRelease {
            path: self.lock_path.clone(),
            source: e,
        })?;
        debug!("Released lock at {}", self.lock_path.display());
        Ok(())
    }
}

impl Drop for DbLock {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = fs::remove_file(&self.lock_path) {
                warn!("Leaked lock at {}: {e}", self.lock_path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier, Mutex};
    use std::time::Instant;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_lock_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        std::fs::write(&path, "").unwrap();

        let lock = DbLock::acquire(&path).unwrap();
        let lock_file = dir.path().join("passwd.lock");
        assert!(lock_file.exists(), "Lock file should be created");

        lock.release().unwrap();
        assert!(!lock_file.exists(), "Lock file should be gone after release");
    }

    #[test]
    fn test_temp_file_is_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        std::fs::write(&path, "").unwrap();

        let lock = DbLock::acquire(&path).unwrap();
        let extras: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|n| n != "passwd" && n != "passwd.lock")
            .collect();
        assert!(extras.is_empty(), "no temp files should remain: {extras:?}");
        lock.release().unwrap();
    }

    #[test]
    fn test_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contested");
        std::fs::write(&path, "").unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let barrier = Arc::new(Barrier::new(2));

        let mut handles = Vec::new();
        for id in [1u32, 2] {
            let path = path.clone();
            let order = order.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                let lock = DbLock::acquire_with(&path, 50, Duration::from_millis(20)).unwrap();
                order.lock().unwrap().push((id, "in"));
                thread::sleep(Duration::from_millis(50));
                order.lock().unwrap().push((id, "out"));
                lock.release().unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // Critical sections must not interleave: each "in" is followed by
        // the same thread's "out".
        let order = order.lock().unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0].0, order[1].0);
        assert_eq!(order[2].0, order[3].0);
    }

    #[test]
    fn test_acquire_times_out_while_held_externally() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        std::fs::write(&path, "").unwrap();
        // Simulate a foreign process holding the lock.
        std::fs::write(dir.path().join("passwd.lock"), "").unwrap();

        let start = Instant::now();
        let err = DbLock::acquire_with(&path, 3, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, Error::LockTimeout { attempts: 3, .. }));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_drop_releases_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        std::fs::write(&path, "").unwrap();

        {
            let _lock = DbLock::acquire(&path).unwrap();
        }
        assert!(!dir.path().join("passwd.lock").exists());
        // And the lock can be taken again.
        DbLock::acquire(&path).unwrap().release().unwrap();
    }
}
