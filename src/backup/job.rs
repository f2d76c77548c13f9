//! Coordinated backup job
//!
//! Single entry point that sequences the lifecycle under the backup root
//! lock: precondition checks, failed-backup sweep, the copy run itself,
//! and the retention sweep. Standalone cleanup goes through the same lock.

use std::path::PathBuf;

use tracing::{info, warn};

use super::builder::BackupBuilder;
use super::cleaner::BackupCleaner;
use super::lock::BackupLock;
use super::mirror::Mirror;
use crate::config::{BackupConfig, HostEnvironment};
use crate::error::BackupResult;
use crate::models::{BackupRun, RunTimestamp};
use crate::probe::DriveProber;
use crate::validator::{BackupValidator, PreconditionFailure};

/// What a job did
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    /// Set when the checks blocked the run
    pub precondition: Option<PreconditionFailure>,
    /// The copy run, if one was attempted
    pub run: Option<BackupRun>,
    /// Staging folders removed by the failed-backup sweep
    pub failed_removed: Vec<PathBuf>,
    /// Completed backups removed by the retention sweep
    pub expired_removed: Vec<PathBuf>,
    /// Error recorded by either sweep
    pub cleanup_error: Option<String>,
}

impl JobReport {
    /// No blocked precondition, no aborted run, no cleanup failure
    pub fn succeeded(&self) -> bool {
        self.precondition.is_none()
            && self.run.as_ref().map_or(true, |run| run.executed)
            && self.cleanup_error.is_none()
    }
}

/// Runs backups and cleanups against one configuration
pub struct BackupJob<'a, P: DriveProber, M: Mirror> {
    config: &'a BackupConfig,
    host: &'a HostEnvironment,
    prober: P,
    mirror: M,
}

impl<'a, P: DriveProber, M: Mirror> BackupJob<'a, P, M> {
    pub fn new(config: &'a BackupConfig, host: &'a HostEnvironment, prober: P, mirror: M) -> Self {
        Self {
            config,
            host,
            prober,
            mirror,
        }
    }

    /// Validate, then run the full lifecycle under the lock
    pub fn run(&self, approx_os_space_gib: f64) -> BackupResult<JobReport> {
        self.run_at(approx_os_space_gib, RunTimestamp::now())
    }

    /// Same as `run` with a fixed run timestamp
    pub fn run_at(
        &self,
        approx_os_space_gib: f64,
        timestamp: RunTimestamp,
    ) -> BackupResult<JobReport> {
        let validator = BackupValidator::new(self.config, self.host, &self.prober);
        if let Err(failure) = validator.check(approx_os_space_gib) {
            return Ok(JobReport {
                precondition: Some(failure),
                ..JobReport::default()
            });
        }

        let _lock = BackupLock::acquire(&self.config.backup_dir())?;
        let mut cleaner = BackupCleaner::new(self.config);
        let failed_removed = cleaner.clean_failed_backups();

        let mut builder =
            BackupBuilder::with_timestamp(self.config, self.host, &self.mirror, timestamp);
        builder.execute();
        let run = builder.into_run();

        let expired_removed = if run.executed {
            cleaner.clean_old_backups()
        } else {
            warn!("Skipping retention sweep after failed run");
            Vec::new()
        };

        Ok(JobReport {
            precondition: None,
            run: Some(run),
            failed_removed,
            expired_removed,
            cleanup_error: cleaner.error,
        })
    }

    /// Run the requested sweeps under the lock
    pub fn clean(&self, old: bool, failed: bool) -> BackupResult<JobReport> {
        let backup_dir = self.config.backup_dir();
        if !backup_dir.is_dir() {
            info!(path = %backup_dir.display(), "Backup root does not exist, nothing to clean");
            return Ok(JobReport::default());
        }

        let _lock = BackupLock::acquire(&backup_dir)?;
        let mut cleaner = BackupCleaner::new(self.config);

        let failed_removed = if failed {
            cleaner.clean_failed_backups()
        } else {
            Vec::new()
        };
        let expired_removed = if old {
            cleaner.clean_old_backups()
        } else {
            Vec::new()
        };

        Ok(JobReport {
            failed_removed,
            expired_removed,
            cleanup_error: cleaner.error,
            ..JobReport::default()
        })
    }
}
