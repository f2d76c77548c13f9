//! Retention cleaner
//!
//! Two independent sweeps over the immediate subfolders of the backup
//! root:
//!
//! - the retention sweep keeps the `keep_last_n` most recent completed
//!   backups (folders named `YYYY-MM-DD_HH-MM-SS`) and deletes the rest;
//! - the failed-backup sweep deletes every staging folder
//!   (`.tmp_backup_YYYY-MM-DD_HH-MM-SS`), since a staging folder that still
//!   exists at cleanup time belongs to a run that never published.
//!
//! Anything else in the backup root is left alone. Deletion errors are
//! recorded on the cleaner rather than returned.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, info};

use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::models::RunTimestamp;

/// Name pattern of a published backup folder
pub const COMPLETED_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$";

/// Name pattern of a staging folder
pub const STAGING_PATTERN: &str = r"^\.tmp_backup_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$";

static COMPLETED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(COMPLETED_PATTERN).expect("completed backup pattern is a valid regex")
});

static STAGING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STAGING_PATTERN).expect("staging pattern is a valid regex"));

#[derive(Debug, Clone, Copy)]
enum Sweep {
    Old,
    Failed,
}

impl Sweep {
    fn label(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::Failed => "failed",
        }
    }
}

/// A published backup found in the backup root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSet {
    pub name: String,
    pub path: PathBuf,
    pub created_at: RunTimestamp,
}

/// Garbage collector for expired and abandoned backups
pub struct BackupCleaner {
    backup_dir: PathBuf,
    keep_last_n: usize,
    /// Last retention sweep finished without errors
    pub cleaned_old: bool,
    /// Last failed-backup sweep finished without errors
    pub cleaned_failed: bool,
    /// Description of the most recent sweep failure
    pub error: Option<String>,
}

impl BackupCleaner {
    /// Create a cleaner for the configured backup root and retention
    pub fn new(config: &BackupConfig) -> Self {
        Self::with_backup_dir(config.backup_dir(), config.retention().keep_last_n())
    }

    /// Create a cleaner for an explicit folder (useful for testing)
    pub fn with_backup_dir(backup_dir: PathBuf, keep_last_n: usize) -> Self {
        Self {
            backup_dir,
            keep_last_n,
            cleaned_old: false,
            cleaned_failed: false,
            error: None,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Published backups, most recent first
    ///
    /// Folders whose name matches the pattern but is not a real date are
    /// skipped.
    pub fn list_completed(&self) -> BackupResult<Vec<BackupSet>> {
        let mut sets: Vec<BackupSet> = self
            .matching_folders(&COMPLETED_RE)?
            .into_iter()
            .filter_map(|(name, path)| {
                let created_at = RunTimestamp::parse(&name)?;
                Some(BackupSet {
                    name,
                    path,
                    created_at,
                })
            })
            .collect();

        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }

    /// Staging folders left behind by runs that never published
    pub fn list_staging(&self) -> BackupResult<Vec<PathBuf>> {
        Ok(self
            .matching_folders(&STAGING_RE)?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Delete completed backups beyond the retention threshold
    ///
    /// Returns the folders that were deleted.
    pub fn clean_old_backups(&mut self) -> Vec<PathBuf> {
        debug!(keep_last_n = self.keep_last_n, "Starting retention sweep");

        let sets = match self.list_completed() {
            Ok(sets) => sets,
            Err(err) => {
                self.record_failure(Sweep::Old, &err);
                self.cleaned_old = false;
                return Vec::new();
            }
        };

        let expired: Vec<PathBuf> = sets
            .into_iter()
            .skip(self.keep_last_n)
            .map(|set| set.path)
            .collect();

        self.delete_folders(Sweep::Old, &expired)
    }

    /// Delete every staging folder
    ///
    /// Returns the folders that were deleted.
    pub fn clean_failed_backups(&mut self) -> Vec<PathBuf> {
        debug!("Starting failed-backup sweep");

        let staging = match self.list_staging() {
            Ok(staging) => staging,
            Err(err) => {
                self.record_failure(Sweep::Failed, &err);
                self.cleaned_failed = false;
                return Vec::new();
            }
        };

        self.delete_folders(Sweep::Failed, &staging)
    }

    /// Delete `folders` for one sweep and record its outcome
    ///
    /// Every folder is attempted; all failures end up in `error`.
    fn delete_folders(&mut self, sweep: Sweep, folders: &[PathBuf]) -> Vec<PathBuf> {
        let (deleted, failures) = remove_all(folders);
        let clean = failures.is_empty();
        match sweep {
            Sweep::Old => self.cleaned_old = clean,
            Sweep::Failed => self.cleaned_failed = clean,
        }

        if clean {
            info!(deleted = deleted.len(), sweep = sweep.label(), "Backup sweep finished");
        } else {
            self.record_failure(sweep, &BackupError::Io(failures.join("; ")));
        }
        deleted
    }

    fn record_failure(&mut self, sweep: Sweep, err: &BackupError) {
        let message = format!("Error while cleaning {} backups: {}", sweep.label(), err);
        error!("{}", message);
        self.error = Some(message);
    }

    /// Immediate subfolders whose name matches `pattern`
    fn matching_folders(&self, pattern: &Regex) -> BackupResult<Vec<(String, PathBuf)>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut folders = Vec::new();
        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            BackupError::Io(format!(
                "Failed to read backup root {}: {}",
                self.backup_dir.display(),
                e
            ))
        })? {
            let entry = entry
                .map_err(|e| BackupError::Io(format!("Failed to read directory entry: {}", e)))?;

            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if pattern.is_match(name) {
                    folders.push((name.to_string(), entry.path()));
                }
            }
        }

        Ok(folders)
    }
}

/// Recursively delete each folder, continuing past failures
fn remove_all(folders: &[PathBuf]) -> (Vec<PathBuf>, Vec<String>) {
    let mut deleted = Vec::new();
    let mut failures = Vec::new();

    for folder in folders {
        match fs::remove_dir_all(folder) {
            Ok(()) => {
                debug!(path = %folder.display(), "Deleted backup folder");
                deleted.push(folder.clone());
            }
            Err(e) => failures.push(format!("{}: {}", folder.display(), e)),
        }
    }

    (deleted, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(folders: &[&str], keep_last_n: usize) -> (BackupCleaner, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("BackupPC");
        for folder in folders {
            fs::create_dir_all(root.join(folder)).unwrap();
        }
        (BackupCleaner::with_backup_dir(root, keep_last_n), temp_dir)
    }

    fn remaining(cleaner: &BackupCleaner) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(cleaner.backup_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_retention_deletes_older_and_ignores_other_folders() {
        let (mut cleaner, _temp) = setup(
            &[
                "2024-01-22_10-30-45",
                "2025-01-22_10-30-45",
                "10-30-45",
                "altro_file",
            ],
            1,
        );

        let deleted = cleaner.clean_old_backups();

        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].ends_with("2024-01-22_10-30-45"));
        assert_eq!(
            remaining(&cleaner),
            ["10-30-45", "2025-01-22_10-30-45", "altro_file"]
        );
        assert!(cleaner.cleaned_old);
        assert!(cleaner.error.is_none());
    }

    #[test]
    fn test_retention_keeps_min_of_count_and_threshold() {
        let stamps = [
            "2024-03-01_08-00-00",
            "2024-01-01_08-00-00",
            "2024-02-01_08-00-00",
            "2023-12-31_23-59-59",
            "2024-02-01_07-59-59",
        ];
        for keep in 1..=6 {
            let (mut cleaner, _temp) = setup(&stamps, keep);
            let deleted = cleaner.clean_old_backups();

            let kept = cleaner.list_completed().unwrap();
            assert_eq!(kept.len(), keep.min(stamps.len()));
            assert_eq!(deleted.len(), stamps.len().saturating_sub(keep));

            // Every kept backup is newer than every deleted one
            let mut sorted: Vec<&str> = stamps.to_vec();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            let expected: Vec<&str> = sorted.into_iter().take(keep).collect();
            let kept_names: Vec<&str> = kept.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(kept_names, expected);
        }
    }

    #[test]
    fn test_retention_with_nothing_to_delete() {
        let (mut cleaner, _temp) = setup(&["2025-01-22_10-30-45"], 3);

        assert!(cleaner.clean_old_backups().is_empty());
        assert!(cleaner.cleaned_old);
        assert_eq!(remaining(&cleaner), ["2025-01-22_10-30-45"]);
    }

    #[test]
    fn test_list_completed_sorted_newest_first() {
        let (cleaner, _temp) = setup(
            &[
                "2024-01-22_10-30-45",
                "2025-01-22_10-30-45",
                "2024-13-45_10-30-45",
                ".tmp_backup_2025-02-01_00-00-00",
            ],
            3,
        );

        let sets = cleaner.list_completed().unwrap();
        let names: Vec<&str> = sets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["2025-01-22_10-30-45", "2024-01-22_10-30-45"]);
    }

    #[test]
    fn test_failed_sweep_deletes_only_staging_folders() {
        let (mut cleaner, _temp) = setup(
            &[
                ".tmp_backup_2024-01-22_10-30-45",
                ".tmp_backup_1999-01-01_00-00-00",
                ".tmp_backup_latest",
                "2024-01-22_10-30-45",
                "altro_file",
            ],
            3,
        );
        fs::write(
            cleaner
                .backup_dir()
                .join(".tmp_backup_2024-01-22_10-30-45")
                .join("partial.bin"),
            b"half written",
        )
        .unwrap();

        let deleted = cleaner.clean_failed_backups();

        assert_eq!(deleted.len(), 2);
        assert_eq!(
            remaining(&cleaner),
            [".tmp_backup_latest", "2024-01-22_10-30-45", "altro_file"]
        );
        assert!(cleaner.cleaned_failed);
    }

    #[test]
    fn test_staging_file_is_not_a_folder() {
        let (mut cleaner, _temp) = setup(&[], 3);
        fs::create_dir_all(cleaner.backup_dir()).unwrap();
        fs::write(
            cleaner.backup_dir().join(".tmp_backup_2024-01-22_10-30-45"),
            b"file",
        )
        .unwrap();

        assert!(cleaner.clean_failed_backups().is_empty());
        assert_eq!(remaining(&cleaner), [".tmp_backup_2024-01-22_10-30-45"]);
    }

    #[test]
    fn test_missing_backup_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut cleaner = BackupCleaner::with_backup_dir(temp_dir.path().join("absent"), 2);

        assert!(cleaner.clean_old_backups().is_empty());
        assert!(cleaner.clean_failed_backups().is_empty());
        assert!(cleaner.cleaned_old);
        assert!(cleaner.cleaned_failed);
    }

    #[test]
    fn test_unreadable_root_is_recorded_not_raised() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("BackupPC");
        fs::write(&root, b"not a folder").unwrap();
        let mut cleaner = BackupCleaner::with_backup_dir(root, 2);

        assert!(cleaner.clean_failed_backups().is_empty());
        assert!(!cleaner.cleaned_failed);
        assert!(cleaner
            .error
            .as_deref()
            .unwrap()
            .starts_with("Error while cleaning failed backups"));

        // The other sweep runs independently
        assert!(cleaner.clean_old_backups().is_empty());
        assert!(!cleaner.cleaned_old);
    }

    #[test]
    fn test_deletion_continues_past_failed_entry() {
        let (mut cleaner, _temp) = setup(&[".tmp_backup_2024-01-01_00-00-00"], 1);
        let missing = cleaner.backup_dir().join(".tmp_backup_2023-01-01_00-00-00");
        let existing = cleaner.backup_dir().join(".tmp_backup_2024-01-01_00-00-00");

        let (deleted, failures) = remove_all(&[missing.clone(), existing.clone()]);
        assert_eq!(deleted, [existing.clone()]);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains(".tmp_backup_2023-01-01_00-00-00"));

        fs::create_dir_all(&existing).unwrap();
        let deleted = cleaner.delete_folders(Sweep::Failed, &[missing, existing.clone()]);

        assert_eq!(deleted, [existing.clone()]);
        assert!(!existing.exists());
        assert!(!cleaner.cleaned_failed);
        let error = cleaner.error.as_deref().unwrap();
        assert!(error.starts_with("Error while cleaning failed backups"));
        assert!(error.contains(".tmp_backup_2023-01-01_00-00-00"));
    }
}
