//! Core data models for drivebck
//!
//! This module contains the value types shared by the validator, builder,
//! and cleaner: validated drive identifiers, run timestamps, and the
//! per-invocation run record.

pub mod drive;
pub mod run;
pub mod timestamp;

pub use drive::Drive;
pub use run::{drive_folder_name, published_path, BackupRun, RunState, STAGING_MARKER};
pub use timestamp::RunTimestamp;
