//! Logging setup for drivebck
//!
//! Components only emit `tracing` events; this module is called once by
//! the binary to install where those events go:
//!
//! - the console (stderr), filtered by `DRIVEBCK_LOG` (default `info`)
//! - a log file at `debug` level, rotated by size
//!
//! The returned `LogGuard` flushes the file when dropped.

mod rotating;

use std::path::PathBuf;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{BackupError, BackupResult};

pub use rotating::RotatingFileWriter;

/// Environment variable holding the console filter directives
pub const LOG_ENV_VAR: &str = "DRIVEBCK_LOG";

/// Rotate the log file once it would grow past this size
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Number of rotated files kept next to the active one
pub const DEFAULT_BACKUP_COUNT: usize = 1;

/// Where and how to write the log file
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Active log file, `None` for console only
    pub file: Option<PathBuf>,
    pub max_bytes: u64,
    pub backup_count: usize,
    /// Console filter used when `DRIVEBCK_LOG` is unset
    pub console_default: String,
}

impl LogSettings {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self {
            file,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            console_default: "info".to_string(),
        }
    }
}

/// Keeps the log file writer alive and flushes it on drop
#[must_use = "dropping the guard flushes and stops file logging"]
pub struct LogGuard {
    writer: Option<RotatingFileWriter>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(writer) = &self.writer {
            let _ = writer.flush_file();
        }
    }
}

/// Install the global subscriber
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(settings: &LogSettings) -> BackupResult<LogGuard> {
    let console_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&settings.console_default));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let writer = settings
        .file
        .as_ref()
        .map(|path| {
            RotatingFileWriter::open(path, settings.max_bytes, settings.backup_count).map_err(|e| {
                BackupError::Logging(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    e
                ))
            })
        })
        .transpose()?;

    let file_layer = writer.clone().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| BackupError::Logging(format!("Failed to install logger: {}", e)))?;

    Ok(LogGuard { writer })
}
