//! Reading and replacing the configuration file on disk
//!
//! The file is replaced through a sibling `<name>.partial` that is synced
//! and renamed over the original, so an interrupted save leaves the
//! previous configuration intact.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::settings::ConfigFile;
use crate::error::{BackupError, BackupResult};

/// Parse the configuration file at `path`
///
/// A missing file is `ConfigNotFound`; anything that is not a well-formed
/// `ConfigFile` is `Config`.
pub(crate) fn load_config_file(path: &Path) -> BackupResult<ConfigFile> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(BackupError::ConfigNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(BackupError::Io(format!(
                "Cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_str(&raw)
        .map_err(|e| BackupError::Config(format!("{} is not valid: {}", path.display(), e)))
}

/// Replace the configuration file at `path` with `file`
pub(crate) fn store_config_file(path: &Path, file: &ConfigFile) -> BackupResult<()> {
    let mut json = serde_json::to_string_pretty(file)
        .map_err(|e| BackupError::Config(format!("Cannot encode configuration: {}", e)))?;
    json.push('\n');

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let partial = partial_path(path);
    let result = write_synced(&partial, json.as_bytes()).and_then(|()| fs::rename(&partial, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(BackupError::Io(format!(
            "Cannot save {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    out.write_all(bytes)?;
    out.sync_all()
}
