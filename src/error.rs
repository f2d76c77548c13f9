//! Custom error types for drivebck
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for drivebck operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// The configuration file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Configuration file could not be parsed or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration values rejected by validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// The mirror tool reported a hard failure for a drive
    #[error("Copy of drive {drive} failed: {message}")]
    Copy { drive: String, message: String },

    /// The mirror tool could not be started
    #[error("Mirror tool error: {0}")]
    Mirror(String),

    /// Another process holds the backup root lock
    #[error("Backup root is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    /// Logging setup errors
    #[error("Logging error: {0}")]
    Logging(String),
}

impl BackupError {
    /// Check if this is a "config file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for drivebck operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::Validation("Backup drive must be specified.".into());
        assert_eq!(
            err.to_string(),
            "Validation error: Backup drive must be specified."
        );
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_error() {
        let err = BackupError::ConfigNotFound(PathBuf::from("config.json"));
        assert_eq!(err.to_string(), "Configuration file not found: config.json");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_copy_error_names_drive() {
        let err = BackupError::Copy {
            drive: "D:".into(),
            message: "robocopy exited with code 8".into(),
        };
        assert_eq!(
            err.to_string(),
            "Copy of drive D: failed: robocopy exited with code 8"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BackupError = io_err.into();
        assert!(matches!(err, BackupError::Io(_)));
    }
}
