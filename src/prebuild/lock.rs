//! Per-project advisory lock
//!
//! Serializes prebuild and restore invocations for one project across
//! processes. The lock is non-blocking: contention fails the invocation
//! immediately. If the lock file cannot be created or the platform refuses
//! the lock for any other reason, the invocation proceeds unlocked.

use crate::error::{PrebakeError, PrebakeResult};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive lock held for the duration of one invocation
pub struct ProjectLock {
    file: File,
    path: PathBuf,
}

impl ProjectLock {
    /// Try to take the lock at `path` without blocking.
    ///
    /// - `Ok(Some(lock))`: acquired, released on drop
    /// - `Ok(None)`: locking unavailable, caller runs unlocked
    /// - `Err(LockHeld)`: another process holds it
    pub fn try_acquire(path: &Path) -> PrebakeResult<Option<Self>> {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(
                    "Cannot create lock directory {}, continuing without lock: {}",
                    parent.display(),
                    e
                );
                return Ok(None);
            }
        }

        let file = match File::create(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    "Cannot create lock file {}, continuing without lock: {}",
                    path.display(),
                    e
                );
                return Ok(None);
            }
        };

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired project lock {}", path.display());
                Ok(Some(Self {
                    file,
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if is_contended(&e) => Err(PrebakeError::LockHeld(path.to_path_buf())),
            Err(e) => {
                warn!(
                    "File locking unavailable for {}, continuing without lock: {}",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("Failed to release project lock {}: {}", self.path.display(), e);
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_is_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prebuilds").join("abc.lock");

        let first = ProjectLock::try_acquire(&path).unwrap().unwrap();
        assert_eq!(first.path(), path);

        let second = ProjectLock::try_acquire(&path);
        assert!(matches!(second, Err(PrebakeError::LockHeld(_))));
    }

    #[test]
    fn released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.lock");

        drop(ProjectLock::try_acquire(&path).unwrap());
        assert!(ProjectLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn uncreatable_lock_file_runs_unlocked() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let lock = ProjectLock::try_acquire(&blocker.join("abc.lock")).unwrap();
        assert!(lock.is_none());
    }
}
