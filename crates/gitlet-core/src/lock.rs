//! Repository locking for concurrent safety.
//!
//! Uses advisory file locks (`flock(2)` on Unix) via the `fs2` crate,
//! taken on the object-store directory itself so no extra file is
//! reserved under `.gitlet/`. The OS releases the lock automatically
//! when a process exits, so no stale lock detection is needed.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{GitletError, GitletResult};

/// An exclusive repository lock.
///
/// Held for the lifetime of the value; dropping it releases the lock.
pub struct RepoLock {
    _file: File,
}

impl RepoLock {
    /// Acquire an exclusive lock on the object-store directory.
    ///
    /// Polls with a short sleep interval until the lock is acquired or
    /// the timeout expires.
    pub fn acquire(objects_dir: &Path, timeout: Duration) -> GitletResult<Self> {
        let file = File::open(objects_dir)?;

        let start = Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(RepoLock { _file: file }),
                Err(_) if start.elapsed() >= timeout => {
                    return Err(GitletError::LockTimeout);
                }
                Err(_) => std::thread::sleep(poll_interval),
            }
        }
    }
}
