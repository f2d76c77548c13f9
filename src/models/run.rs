//! Backup run record
//!
//! A `BackupRun` is created when a builder is constructed and is mutated
//! only by that builder. It ends either completed (`executed == true`, the
//! staging folder renamed to its final name) or aborted (`executed ==
//! false`, `error` set, staging folder left for the failed-backup sweep).

use std::fmt;
use std::path::{Path, PathBuf};

use super::drive::Drive;
use super::timestamp::RunTimestamp;

/// Prefix marking a staging folder that has not been published yet
pub const STAGING_MARKER: &str = ".tmp_backup_";

/// Lifecycle state of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    StagingCreated,
    /// Copying the source at `index` in configured order
    Copying { index: usize, drive: Drive },
    Completed,
    Aborted,
}

impl RunState {
    /// Whether the run has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::StagingCreated => write!(f, "staging created"),
            Self::Copying { index, drive } => write!(f, "copying source #{} ({})", index + 1, drive),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// State of one backup invocation
#[derive(Debug, Clone)]
pub struct BackupRun {
    /// Captured once at run start
    pub timestamp: RunTimestamp,
    /// `<backup dir>/.tmp_backup_<timestamp>`
    pub temp_root: PathBuf,
    /// `<backup dir>/<timestamp>`
    pub final_root: PathBuf,
    pub state: RunState,
    pub executed: bool,
    pub error: Option<String>,
}

impl BackupRun {
    /// Create a run rooted in `backup_dir` (the `<drive>\<root>` folder)
    pub fn new(backup_dir: &Path, timestamp: RunTimestamp) -> Self {
        let temp_root = backup_dir.join(format!("{}{}", STAGING_MARKER, timestamp));
        let final_root = published_path(&temp_root);
        Self {
            timestamp,
            temp_root,
            final_root,
            state: RunState::NotStarted,
            executed: false,
            error: None,
        }
    }

    /// Short human readable outcome
    pub fn summary(&self) -> String {
        match (&self.state, &self.error) {
            (RunState::Completed, _) => {
                format!("Backup completed: {}", self.final_root.display())
            }
            (_, Some(error)) => format!("Backup failed ({}): {}", self.state, error),
            (state, None) => format!("Backup {}", state),
        }
    }
}

/// Path of a staging folder once the staging marker is stripped
pub fn published_path(staging: &Path) -> PathBuf {
    match staging.file_name().and_then(|n| n.to_str()) {
        Some(name) => staging.with_file_name(name.replacen(STAGING_MARKER, "", 1)),
        None => staging.to_path_buf(),
    }
}

/// Name of the per-drive folder inside a run (`Disco_D_Backup_<timestamp>`)
pub fn drive_folder_name(drive: Drive, timestamp: RunTimestamp) -> String {
    format!("Disco_{}_Backup_{}", drive.letter(), timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> RunTimestamp {
        RunTimestamp::parse("2024-01-22_10-30-45").unwrap()
    }

    #[test]
    fn test_new_run_paths() {
        let run = BackupRun::new(Path::new("backups/BackupPC"), ts());

        assert_eq!(
            run.temp_root,
            Path::new("backups/BackupPC").join(".tmp_backup_2024-01-22_10-30-45")
        );
        assert_eq!(
            run.final_root,
            Path::new("backups/BackupPC").join("2024-01-22_10-30-45")
        );
        assert_eq!(run.state, RunState::NotStarted);
        assert!(!run.executed);
        assert!(run.error.is_none());
    }

    #[test]
    fn test_final_root_is_temp_root_without_marker() {
        let stamps = [
            "2000-01-01_00-00-00",
            "2024-02-29_23-59-59",
            "2099-12-31_12-00-01",
        ];
        for stamp in stamps {
            let run = BackupRun::new(Path::new("root"), RunTimestamp::parse(stamp).unwrap());
            let stripped = run
                .temp_root
                .to_string_lossy()
                .replace(STAGING_MARKER, "");
            assert_eq!(run.final_root.to_string_lossy(), stripped);
        }
    }

    #[test]
    fn test_drive_folder_name() {
        let drive: Drive = "D:".parse().unwrap();
        assert_eq!(
            drive_folder_name(drive, ts()),
            "Disco_D_Backup_2024-01-22_10-30-45"
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Aborted.is_terminal());
        assert!(!RunState::StagingCreated.is_terminal());
    }
}
