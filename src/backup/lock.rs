//! Advisory lock on the backup root
//!
//! The builder and the cleaner share the backup root and must never run at
//! the same time: a failed-backup sweep would happily delete the staging
//! folder of a run in progress. Every entry point that touches the backup
//! root takes this lock first.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{BackupError, BackupResult};

/// Lock file name inside the backup root
pub const LOCK_FILE_NAME: &str = ".drivebck.lock";

/// Exclusive lock held for the lifetime of the value
#[derive(Debug)]
pub struct BackupLock {
    file: File,
    path: PathBuf,
}

impl BackupLock {
    /// Take the lock on `backup_dir`, creating the folder if needed
    ///
    /// Fails immediately with `BackupError::Locked` if another process
    /// holds it.
    pub fn acquire(backup_dir: &Path) -> BackupResult<Self> {
        fs::create_dir_all(backup_dir).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create backup root {}: {}",
                backup_dir.display(),
                e
            ))
        })?;

        let path = backup_dir.join(LOCK_FILE_NAME);

        // The file is never unlinked: removing a locked file would let a
        // second process lock a fresh inode at the same path.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                BackupError::Io(format!("Failed to open lock file {}: {}", path.display(), e))
            })?;

        if file.try_lock_exclusive().is_err() {
            return Err(BackupError::Locked(path));
        }

        debug!(path = %path.display(), "Backup root locked");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BackupLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "Backup root unlocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_root_and_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("BackupPC");

        let lock = BackupLock::acquire(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(lock.path(), root.join(LOCK_FILE_NAME));
        assert!(lock.path().is_file());
    }

    #[test]
    fn test_second_lock_is_refused_until_release() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("BackupPC");

        let first = BackupLock::acquire(&root).unwrap();
        let err = BackupLock::acquire(&root).unwrap_err();
        assert!(matches!(err, BackupError::Locked(_)));

        drop(first);
        assert!(BackupLock::acquire(&root).is_ok());
    }
}
