//! Precondition validation
//!
//! Decides whether a backup may start. The checks run in a fixed order and
//! the first failure short-circuits the rest, so the cheap connectivity and
//! existence checks always run before the space computation:
//!
//! 1. the backup drive is connected
//! 2. every source drive exists
//! 3. every user folder exists in the current user's profile
//! 4. the backup drive has room for the sources plus a 15% margin
//!
//! Failures are returned as values, never raised; the caller decides what
//! to do with them.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{BackupConfig, HostEnvironment};
use crate::models::Drive;
use crate::probe::{DiskUsage, DriveProber};

/// Free space must cover the data to copy times this factor
pub const SPACE_MARGIN: f64 = 1.15;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Why a backup cannot be performed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionFailure {
    #[error("Backup drive {0} is not connected")]
    BackupDriveDisconnected(Drive),

    #[error("Source drive {0} does not exist")]
    SourceMissing(Drive),

    #[error("User folder does not exist: {}", .0.display())]
    UserFolderMissing(PathBuf),

    #[error("Could not determine disk usage of {}", .0.display())]
    SpaceUnknown(PathBuf),

    #[error(
        "Insufficient space on backup drive: {required} bytes required (including margin), {available} bytes free"
    )]
    InsufficientSpace { required: u64, available: u64 },
}

/// Whether `free` bytes can hold `used` bytes plus the safety margin
pub fn has_room(free: u64, used: u64) -> bool {
    free as f64 >= used as f64 * SPACE_MARGIN
}

/// Runs the ordered precondition checks for one configuration
pub struct BackupValidator<'a, P: DriveProber> {
    config: &'a BackupConfig,
    host: &'a HostEnvironment,
    prober: P,
}

impl<'a, P: DriveProber> BackupValidator<'a, P> {
    pub fn new(config: &'a BackupConfig, host: &'a HostEnvironment, prober: P) -> Self {
        Self {
            config,
            host,
            prober,
        }
    }

    /// Whether a mounted volume identifier starts with `drive_letter`
    ///
    /// Accepts both `"G"` and `"G:"`.
    pub fn is_drive_connected(&self, drive_letter: &str) -> bool {
        let mut wanted = drive_letter.trim().to_string();
        if wanted.is_empty() {
            return false;
        }
        if !wanted.ends_with(':') {
            wanted.push(':');
        }

        let connected = self
            .prober
            .mounted_volumes()
            .iter()
            .any(|volume| volume.starts_with(&wanted));
        debug!(drive = %wanted, connected, "Drive connectivity probed");
        connected
    }

    /// True iff every configured source drive resolves to an existing path
    pub fn validate_sources_exist(&self) -> bool {
        self.missing_source().is_none()
    }

    /// True iff every configured user folder exists in the user's profile
    pub fn validate_user_folders_exist(&self) -> bool {
        self.missing_user_folder().is_none()
    }

    /// True iff the backup drive has room for every source
    ///
    /// `approx_os_space_gib` is subtracted from the system drive's used
    /// space so only user data is counted there.
    pub fn has_sufficient_space(&self, approx_os_space_gib: f64) -> bool {
        self.space_check(approx_os_space_gib).is_ok()
    }

    /// Run every check in order and report go / no-go
    pub fn can_perform_backup(&self, approx_os_space_gib: f64) -> bool {
        self.check(approx_os_space_gib).is_ok()
    }

    /// Run every check in order, returning the first failure
    pub fn check(&self, approx_os_space_gib: f64) -> Result<(), PreconditionFailure> {
        let result = self.run_checks(approx_os_space_gib);
        match &result {
            Ok(()) => debug!("All backup preconditions satisfied"),
            Err(failure) => warn!(reason = %failure, "Backup preconditions not met"),
        }
        result
    }

    fn run_checks(&self, approx_os_space_gib: f64) -> Result<(), PreconditionFailure> {
        let backup_drive = self.config.backup_drive();
        if !self.is_drive_connected(&backup_drive.to_string()) {
            return Err(PreconditionFailure::BackupDriveDisconnected(backup_drive));
        }

        if let Some(drive) = self.missing_source() {
            return Err(PreconditionFailure::SourceMissing(drive));
        }

        if let Some(folder) = self.missing_user_folder() {
            return Err(PreconditionFailure::UserFolderMissing(folder));
        }

        self.space_check(approx_os_space_gib)
    }

    fn missing_source(&self) -> Option<Drive> {
        let missing = self
            .config
            .source_drives()
            .iter()
            .copied()
            .find(|drive| !self.prober.exists(&self.config.volumes().root(*drive)));
        match missing {
            Some(drive) => debug!(%drive, "Source drive does not exist"),
            None => debug!("All source drives exist"),
        }
        missing
    }

    fn missing_user_folder(&self) -> Option<PathBuf> {
        let missing = self
            .config
            .user_folders()
            .iter()
            .map(|folder| self.host.user_folder(folder))
            .find(|path| !self.prober.exists(path));
        match &missing {
            Some(path) => debug!(path = %path.display(), "User folder does not exist"),
            None => debug!("All user folders exist"),
        }
        missing
    }

    fn space_check(&self, approx_os_space_gib: f64) -> Result<(), PreconditionFailure> {
        let os_bytes = (approx_os_space_gib.max(0.0) * BYTES_PER_GIB) as u64;
        let volumes = self.config.volumes();

        let mut to_copy: u64 = 0;
        for drive in self.config.source_drives() {
            let root = volumes.root(*drive);
            let usage = self
                .probe_usage(&root)
                .ok_or_else(|| PreconditionFailure::SpaceUnknown(root.clone()))?;

            let used = if *drive == self.host.system_drive() {
                usage.used.saturating_sub(os_bytes)
            } else {
                usage.used
            };
            debug!(%drive, used, "Space to back up on source drive");
            to_copy = to_copy.saturating_add(used);
        }

        let backup_root = volumes.root(self.config.backup_drive());
        let free = self
            .probe_usage(&backup_root)
            .map(|usage| usage.free)
            .ok_or_else(|| PreconditionFailure::SpaceUnknown(backup_root.clone()))?;

        debug!(to_copy, free, "Comparing space to copy with free space");
        if has_room(free, to_copy) {
            Ok(())
        } else {
            Err(PreconditionFailure::InsufficientSpace {
                required: (to_copy as f64 * SPACE_MARGIN).ceil() as u64,
                available: free,
            })
        }
    }

    fn probe_usage(&self, path: &Path) -> Option<DiskUsage> {
        if !self.prober.exists(path) {
            return None;
        }
        self.prober.usage(path)
    }
}
