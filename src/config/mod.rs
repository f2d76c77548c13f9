//! Configuration module for drivebck
//!
//! This module provides configuration management including:
//! - Validated, immutable backup configuration loaded from JSON
//! - Drive-to-path resolution for source and backup volumes
//! - Host environment lookup (user profile, system drive)
//! - Application path resolution for the config file and logs

pub mod environment;
mod file_io;
pub mod paths;
pub mod settings;
pub mod volumes;

pub use environment::HostEnvironment;
pub use paths::AppPaths;
pub use settings::{BackupConfig, ConfigFile, CopySettings, RetentionPolicy};
pub use volumes::VolumeMap;
