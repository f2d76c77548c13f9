//! drivebck - Local drive backup orchestrator
//!
//! This library provides the core functionality for drivebck. It copies
//! whole source drives and selected user folders into a dated folder on
//! a backup drive, publishes the folder atomically once every copy has
//! succeeded, and keeps the backup drive tidy by deleting expired and
//! abandoned backups.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Validated configuration, volume mapping, host environment, paths
//! - `error`: Custom error types
//! - `models`: Drives, run timestamps, and backup run state
//! - `probe`: Mounted volumes and disk usage
//! - `validator`: Ordered precondition checks
//! - `backup`: Builder, cleaner, mirror tool, lock, and job coordinator
//! - `logging`: Console and rotating file log sinks
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use drivebck::config::{AppPaths, BackupConfig};
//!
//! let paths = AppPaths::new()?;
//! let config = BackupConfig::load(&paths.config_file())?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod probe;
pub mod validator;

pub use error::BackupError;
