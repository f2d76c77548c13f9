//! Path management for drivebck
//!
//! Resolves where the configuration file and the log files live.
//!
//! ## Path Resolution Order
//!
//! 1. `DRIVEBCK_HOME` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/drivebck`,
//!    `%APPDATA%\drivebck\config`, ...)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BackupError;

/// Environment variable overriding the base directory
pub const HOME_ENV_VAR: &str = "DRIVEBCK_HOME";

/// Manages all paths used by drivebck itself
#[derive(Debug, Clone)]
pub struct AppPaths {
    base_dir: PathBuf,
}

impl AppPaths {
    /// Create a new AppPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and
    /// `DRIVEBCK_HOME` is not set.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = if let Some(custom) = std::env::var_os(HOME_ENV_VAR) {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "drivebck")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    BackupError::Config("Could not determine a configuration directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create AppPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Default configuration file (`<base>/config.json`)
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Directory holding the rotating log files (`<base>/logs`)
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Active log file (`<base>/logs/backup.log`)
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join("backup.log")
    }
}
