//! Backup builder
//!
//! Drives one run through its lifecycle:
//!
//! ```text
//! NotStarted -> StagingCreated -> Copying(0..n) -> Completed
//!                     |                 |
//!                     +-----------------+------> Aborted
//! ```
//!
//! Everything is written under `<backup dir>/.tmp_backup_<timestamp>`.
//! Only when every source has been copied is the staging folder renamed
//! to `<backup dir>/<timestamp>`; that rename is the publish point. A hard
//! copy failure stops the run on the spot and leaves the staging folder
//! where it is for the failed-backup sweep.
//!
//! ```text
//! G:\BackupPC\.tmp_backup_2024-01-22_10-30-45\
//! ├── Disco_C_Backup_2024-01-22_10-30-45\     # user folders
//! │   ├── Documents\
//! │   └── ...
//! ├── Disco_D_Backup_2024-01-22_10-30-45\     # whole drive D:
//! └── Disco_E_Backup_2024-01-22_10-30-45\     # whole drive E:
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::mirror::{CopyOutcome, Mirror, MirrorRequest};
use crate::config::{BackupConfig, HostEnvironment};
use crate::error::{BackupError, BackupResult};
use crate::models::{drive_folder_name, BackupRun, Drive, RunState, RunTimestamp};

/// Copies the configured sources into a staging folder and publishes it
pub struct BackupBuilder<'a, M: Mirror> {
    config: &'a BackupConfig,
    host: &'a HostEnvironment,
    mirror: M,
    run: BackupRun,
}

impl<'a, M: Mirror> BackupBuilder<'a, M> {
    /// Create a builder whose run is stamped with the current time
    pub fn new(config: &'a BackupConfig, host: &'a HostEnvironment, mirror: M) -> Self {
        Self::with_timestamp(config, host, mirror, RunTimestamp::now())
    }

    /// Create a builder with a fixed run timestamp
    pub fn with_timestamp(
        config: &'a BackupConfig,
        host: &'a HostEnvironment,
        mirror: M,
        timestamp: RunTimestamp,
    ) -> Self {
        let run = BackupRun::new(&config.backup_dir(), timestamp);
        Self {
            config,
            host,
            mirror,
            run,
        }
    }

    /// Current state of the run
    pub fn run(&self) -> &BackupRun {
        &self.run
    }

    /// Consume the builder, keeping the run record
    pub fn into_run(self) -> BackupRun {
        self.run
    }

    /// Execute the backup
    ///
    /// Never returns an error: the outcome is recorded on the run
    /// (`executed`, `error`, `state`). Calling this again after the run
    /// has started does nothing.
    pub fn execute(&mut self) -> &BackupRun {
        if self.run.state.is_terminal() {
            warn!(state = %self.run.state, "Backup run already executed, ignoring");
            return &self.run;
        }

        info!(timestamp = %self.run.timestamp, "Starting backup");

        let outcome = self.copy_sources().and_then(|()| self.publish());
        match outcome {
            Ok(path) => {
                self.run.state = RunState::Completed;
                self.run.executed = true;
                info!(path = %path.display(), "Backup completed successfully");
            }
            Err(err) => {
                error!(state = %self.run.state, "Backup aborted: {}", err);
                self.run.state = RunState::Aborted;
                self.run.executed = false;
                self.run.error = Some(err.to_string());
            }
        }

        &self.run
    }

    fn copy_sources(&mut self) -> BackupResult<()> {
        self.create_staging_root()?;
        self.run.state = RunState::StagingCreated;

        let sources = self.config.source_drives().to_vec();
        for (index, drive) in sources.into_iter().enumerate() {
            self.run.state = RunState::Copying { index, drive };
            debug!(%drive, index, "Copying source drive");

            let drive_folder = self.create_drive_folder(drive)?;
            if drive == self.host.system_drive() {
                self.copy_user_folders(drive, &drive_folder)?;
            } else {
                self.copy_drive(drive, &drive_folder)?;
            }
        }

        Ok(())
    }

    fn create_staging_root(&self) -> BackupResult<()> {
        let staging = &self.run.temp_root;
        debug!(path = %staging.display(), "Creating staging folder");
        fs::create_dir_all(staging).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create staging folder {}: {}",
                staging.display(),
                e
            ))
        })
    }

    fn create_drive_folder(&self, drive: Drive) -> BackupResult<PathBuf> {
        let folder = self
            .run
            .temp_root
            .join(drive_folder_name(drive, self.run.timestamp));
        debug!(%drive, path = %folder.display(), "Creating drive folder");
        fs::create_dir_all(&folder).map_err(|e| BackupError::Copy {
            drive: drive.to_string(),
            message: format!("failed to create {}: {}", folder.display(), e),
        })?;
        Ok(folder)
    }

    /// Mirror a whole volume into its drive folder
    fn copy_drive(&self, drive: Drive, destination: &Path) -> BackupResult<()> {
        let request = MirrorRequest {
            source: self.config.volumes().root(drive),
            destination: destination.to_path_buf(),
        };
        self.dispatch(drive, &request)
    }

    /// Mirror each configured user folder from the profile
    fn copy_user_folders(&self, drive: Drive, drive_folder: &Path) -> BackupResult<()> {
        for folder in self.config.user_folders() {
            let destination = drive_folder.join(folder);
            fs::create_dir_all(&destination).map_err(|e| BackupError::Copy {
                drive: drive.to_string(),
                message: format!("failed to create {}: {}", destination.display(), e),
            })?;

            let request = MirrorRequest {
                source: self.host.user_folder(folder),
                destination,
            };
            self.dispatch(drive, &request)?;
        }
        Ok(())
    }

    fn dispatch(&self, drive: Drive, request: &MirrorRequest) -> BackupResult<()> {
        debug!(
            source = %request.source.display(),
            destination = %request.destination.display(),
            "Running mirror copy"
        );

        let status = self.mirror.mirror(request).map_err(|e| BackupError::Copy {
            drive: drive.to_string(),
            message: e.to_string(),
        })?;

        match CopyOutcome::classify(&status) {
            CopyOutcome::Success => Ok(()),
            CopyOutcome::Warning { code, message } => {
                warn!(%drive, code, "robocopy warnings: {}", message);
                Ok(())
            }
            CopyOutcome::Failure { message, .. } => Err(BackupError::Copy {
                drive: drive.to_string(),
                message,
            }),
        }
    }

    /// Rename the staging folder to its final name
    fn publish(&self) -> BackupResult<PathBuf> {
        let staging = &self.run.temp_root;
        let target = &self.run.final_root;

        if target.exists() {
            return Err(BackupError::Io(format!(
                "Cannot publish backup: {} already exists",
                target.display()
            )));
        }

        fs::rename(staging, target).map_err(|e| {
            BackupError::Io(format!(
                "Failed to rename {} to {}: {}",
                staging.display(),
                target.display(),
                e
            ))
        })?;
        debug!(path = %target.display(), "Staging folder published");

        Ok(target.clone())
    }
}
