//! Backup lifecycle for drivebck
//!
//! Copies the configured source drives and user folders into a dated
//! folder on the backup drive, publishes it atomically, and cleans up
//! expired and abandoned backups.
//!
//! # Architecture
//!
//! - `BackupBuilder`: runs one backup (staging, copy, publish)
//! - `BackupCleaner`: retention and failed-backup sweeps
//! - `Mirror` / `RobocopyMirror`: the external copy tool
//! - `BackupLock`: advisory lock serializing builder and cleaner
//! - `BackupJob`: validates, locks, and sequences the above
//!
//! # Layout
//!
//! ```text
//! G:\BackupPC\
//! ├── .drivebck.lock
//! ├── .tmp_backup_2024-01-22_10-30-45\   # run in progress or aborted
//! ├── 2024-01-21_09-00-00\               # published backups
//! └── 2024-01-20_09-00-00\
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use drivebck::backup::{BackupJob, RobocopyMirror};
//! use drivebck::config::{BackupConfig, HostEnvironment};
//! use drivebck::probe::SystemProber;
//!
//! let config = BackupConfig::load(path)?;
//! let host = HostEnvironment::detect(&config);
//! let job = BackupJob::new(
//!     &config,
//!     &host,
//!     SystemProber::new(config.volumes().clone()),
//!     RobocopyMirror::new(config.copy()),
//! );
//! let report = job.run(config.approx_os_space_gib())?;
//! ```

mod builder;
mod cleaner;
mod job;
mod lock;
mod mirror;

pub use builder::BackupBuilder;
pub use cleaner::{BackupCleaner, BackupSet, COMPLETED_PATTERN, STAGING_PATTERN};
pub use job::{BackupJob, JobReport};
pub use lock::{BackupLock, LOCK_FILE_NAME};
pub use mirror::{CopyOutcome, Mirror, MirrorRequest, MirrorStatus, RobocopyMirror};
