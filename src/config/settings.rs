//! Backup configuration for drivebck
//!
//! `ConfigFile` is the on-disk JSON shape. `BackupConfig` is the validated,
//! immutable form every component works with; the only way to obtain one
//! is through validation, so a partially valid configuration is never
//! observable.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::file_io::{load_config_file, store_config_file};
use super::volumes::VolumeMap;
use crate::error::{BackupError, BackupResult};
use crate::models::Drive;

/// Pattern a backup root folder name must match
pub const BACKUP_ROOT_PATTERN: &str = r"^[A-Z][A-Za-z0-9]+$";

static BACKUP_ROOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(BACKUP_ROOT_PATTERN).expect("backup root pattern is a valid regex")
});

/// Smallest accepted `keep_last_n`
pub const MIN_KEEP_LAST_N: i64 = 1;
/// Largest accepted `keep_last_n`
pub const MAX_KEEP_LAST_N: i64 = 6;

/// Options passed through to the mirror tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopySettings {
    /// Retries on transient copy errors
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Seconds to wait between retries
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u32,
}

fn default_retries() -> u32 {
    3
}

fn default_wait_secs() -> u32 {
    5
}

fn default_approx_os_space_gib() -> f64 {
    30.0
}

impl Default for CopySettings {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            wait_secs: default_wait_secs(),
        }
    }
}

/// Count-based retention: keep the N most recent completed backups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep_last_n: usize,
}

impl RetentionPolicy {
    /// Number of completed backups to keep
    pub fn keep_last_n(&self) -> usize {
        self.keep_last_n
    }
}

/// On-disk configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub backup_drive: String,
    pub backup_root: String,
    pub source_drives: Vec<String>,
    pub user_folders: Vec<String>,
    pub keep_last_n: i64,

    /// Drive whose user folders are copied instead of the whole volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_drive: Option<String>,

    /// Explicit drive -> root path mappings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volume_roots: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub copy: CopySettings,

    /// Space assumed to be taken by the operating system on the system drive
    #[serde(default = "default_approx_os_space_gib")]
    pub approx_os_space_gib: f64,
}

impl ConfigFile {
    /// Create a file description with default optional fields
    pub fn new(
        backup_drive: impl Into<String>,
        backup_root: impl Into<String>,
        source_drives: &[&str],
        user_folders: &[&str],
        keep_last_n: i64,
    ) -> Self {
        Self {
            backup_drive: backup_drive.into(),
            backup_root: backup_root.into(),
            source_drives: source_drives.iter().map(|s| s.to_string()).collect(),
            user_folders: user_folders.iter().map(|s| s.to_string()).collect(),
            keep_last_n,
            system_drive: None,
            volume_roots: BTreeMap::new(),
            copy: CopySettings::default(),
            approx_os_space_gib: default_approx_os_space_gib(),
        }
    }

    /// Starter configuration written by `config init`
    pub fn template() -> Self {
        Self::new(
            "G:",
            "BackupPC",
            &["C:", "D:"],
            &["Documents", "Pictures", "Desktop"],
            3,
        )
    }
}

/// Validated backup configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BackupConfig {
    backup_drive: Drive,
    backup_root: String,
    source_drives: Vec<Drive>,
    user_folders: Vec<String>,
    retention: RetentionPolicy,
    system_drive: Option<Drive>,
    volumes: VolumeMap,
    copy: CopySettings,
    approx_os_space_gib: f64,
}

impl BackupConfig {
    /// Build and validate a configuration in one step
    pub fn new(
        backup_drive: &str,
        backup_root: &str,
        source_drives: &[&str],
        user_folders: &[&str],
        keep_last_n: i64,
    ) -> BackupResult<Self> {
        Self::try_from(ConfigFile::new(
            backup_drive,
            backup_root,
            source_drives,
            user_folders,
            keep_last_n,
        ))
    }

    /// Load and validate a configuration file
    ///
    /// A missing file yields `BackupError::ConfigNotFound`, distinct from
    /// parse (`Config`) and validation (`Validation`) failures.
    pub fn load(path: &Path) -> BackupResult<Self> {
        Self::try_from(load_config_file(path)?)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> BackupResult<()> {
        store_config_file(path, &self.to_file())
    }

    /// Check whether a configuration file exists at `path`
    pub fn file_exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Convert back to the on-disk representation
    pub fn to_file(&self) -> ConfigFile {
        ConfigFile {
            backup_drive: self.backup_drive.to_string(),
            backup_root: self.backup_root.clone(),
            source_drives: self.source_drives.iter().map(|d| d.to_string()).collect(),
            user_folders: self.user_folders.clone(),
            keep_last_n: self.retention.keep_last_n as i64,
            system_drive: self.system_drive.map(|d| d.to_string()),
            volume_roots: self
                .volumes
                .iter()
                .map(|(drive, root)| (drive.to_string(), root.clone()))
                .collect(),
            copy: self.copy,
            approx_os_space_gib: self.approx_os_space_gib,
        }
    }

    pub fn backup_drive(&self) -> Drive {
        self.backup_drive
    }

    pub fn backup_root(&self) -> &str {
        &self.backup_root
    }

    pub fn source_drives(&self) -> &[Drive] {
        &self.source_drives
    }

    pub fn user_folders(&self) -> &[String] {
        &self.user_folders
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Explicit system drive override, if configured
    pub fn system_drive(&self) -> Option<Drive> {
        self.system_drive
    }

    pub fn volumes(&self) -> &VolumeMap {
        &self.volumes
    }

    pub fn copy(&self) -> CopySettings {
        self.copy
    }

    pub fn approx_os_space_gib(&self) -> f64 {
        self.approx_os_space_gib
    }

    /// The `<backup drive>\<backup root>` folder holding every backup set
    pub fn backup_dir(&self) -> PathBuf {
        self.volumes.root(self.backup_drive).join(&self.backup_root)
    }
}

/// A user folder must stay inside the profile: plain names only, so
/// joining it under a drive folder can never leave that folder
fn is_profile_relative(folder: &str) -> bool {
    !folder.trim().is_empty()
        && Path::new(folder)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

impl TryFrom<ConfigFile> for BackupConfig {
    type Error = BackupError;

    /// Validate in a fixed order; the first failing check wins
    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        if file.backup_drive.trim().is_empty() {
            return Err(invalid("Backup drive must be specified."));
        }
        let backup_drive: Drive = file
            .backup_drive
            .parse()
            .map_err(|_| invalid("Backup drive must be a valid drive letter (e.g. 'G:')."))?;

        if file.backup_root.trim().is_empty() {
            return Err(invalid("Backup root must be specified."));
        }
        if !BACKUP_ROOT_RE.is_match(&file.backup_root) {
            return Err(invalid(
                "Backup root must be a plain folder name (e.g. 'BackupPC').",
            ));
        }

        if file.source_drives.is_empty() {
            return Err(invalid("At least one source drive must be specified."));
        }
        let source_drives = file
            .source_drives
            .iter()
            .map(|raw| {
                raw.parse::<Drive>().map_err(|_| {
                    invalid(format!(
                        "Invalid source drive: {}. It must be a valid drive letter (e.g. 'C:').",
                        raw
                    ))
                })
            })
            .collect::<BackupResult<Vec<_>>>()?;

        if file.user_folders.is_empty() {
            return Err(invalid("At least one user folder must be specified."));
        }

        if !(MIN_KEEP_LAST_N..=MAX_KEEP_LAST_N).contains(&file.keep_last_n) {
            return Err(invalid(format!(
                "keep_last_n must be greater than {} and less than {}.",
                MIN_KEEP_LAST_N - 1,
                MAX_KEEP_LAST_N + 1
            )));
        }

        for folder in &file.user_folders {
            if !is_profile_relative(folder) {
                return Err(invalid(format!(
                    "Invalid user folder: '{}'. It must be a folder name relative to the user profile.",
                    folder
                )));
            }
        }

        let system_drive = file
            .system_drive
            .as_deref()
            .map(|raw| {
                raw.parse::<Drive>()
                    .map_err(|_| invalid(format!("Invalid system drive: {}.", raw)))
            })
            .transpose()?;

        let mut volumes = VolumeMap::new();
        for (raw, root) in &file.volume_roots {
            let drive: Drive = raw
                .parse()
                .map_err(|_| invalid(format!("Invalid drive in volume_roots: {}.", raw)))?;
            volumes.insert(drive, root.clone());
        }

        if !file.approx_os_space_gib.is_finite() || file.approx_os_space_gib < 0.0 {
            return Err(invalid("approx_os_space_gib must be a non-negative number."));
        }

        Ok(Self {
            backup_drive,
            backup_root: file.backup_root,
            source_drives,
            user_folders: file.user_folders,
            retention: RetentionPolicy {
                keep_last_n: file.keep_last_n as usize,
            },
            system_drive,
            volumes,
            copy: file.copy,
            approx_os_space_gib: file.approx_os_space_gib,
        })
    }
}

fn invalid(message: impl Into<String>) -> BackupError {
    BackupError::Validation(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_file() -> ConfigFile {
        ConfigFile::new(
            "G:",
            "BackupPC",
            &["C:", "D:", "E:"],
            &["Documents", "Pictures", "Download"],
            3,
        )
    }

    fn validation_message(file: ConfigFile) -> String {
        match BackupConfig::try_from(file) {
            Err(BackupError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = BackupConfig::try_from(valid_file()).unwrap();

        assert_eq!(config.backup_drive().to_string(), "G:");
        assert_eq!(config.backup_root(), "BackupPC");
        let sources: Vec<String> = config.source_drives().iter().map(|d| d.to_string()).collect();
        assert_eq!(sources, ["C:", "D:", "E:"]);
        assert_eq!(config.user_folders(), ["Documents", "Pictures", "Download"]);
        assert_eq!(config.retention().keep_last_n(), 3);
        assert_eq!(config.copy(), CopySettings::default());
        assert_eq!(config.backup_dir(), PathBuf::from("G:\\").join("BackupPC"));
    }

    #[test]
    fn test_invalid_backup_drive() {
        let mut file = valid_file();
        file.backup_drive = "InvalidDrive".into();
        assert_eq!(
            validation_message(file),
            "Backup drive must be a valid drive letter (e.g. 'G:')."
        );
    }

    #[test]
    fn test_empty_backup_drive() {
        let mut file = valid_file();
        file.backup_drive = "  ".into();
        assert_eq!(validation_message(file), "Backup drive must be specified.");
    }

    #[test]
    fn test_invalid_backup_root() {
        for root in ["backupPC", "Backup\\PC", "Backup PC", "B"] {
            let mut file = valid_file();
            file.backup_root = root.into();
            assert_eq!(
                validation_message(file),
                "Backup root must be a plain folder name (e.g. 'BackupPC')."
            );
        }
    }

    #[test]
    fn test_empty_backup_root() {
        let mut file = valid_file();
        file.backup_root = String::new();
        assert_eq!(validation_message(file), "Backup root must be specified.");
    }

    #[test]
    fn test_source_drives() {
        let mut file = valid_file();
        file.source_drives.clear();
        assert_eq!(
            validation_message(file),
            "At least one source drive must be specified."
        );

        let mut file = valid_file();
        file.source_drives = vec!["C:".into(), "Z".into()];
        assert!(validation_message(file).starts_with("Invalid source drive: Z."));
    }

    #[test]
    fn test_empty_user_folders() {
        let mut file = valid_file();
        file.user_folders.clear();
        assert_eq!(
            validation_message(file),
            "At least one user folder must be specified."
        );
    }

    #[test]
    fn test_user_folder_must_stay_inside_profile() {
        for folder in ["..", "../x", "a/../../b", ".", "./Documents", "/etc", "   "] {
            let mut file = valid_file();
            file.user_folders = vec!["Documents".into(), folder.into()];
            assert!(
                validation_message(file).starts_with("Invalid user folder:"),
                "{:?} should be rejected",
                folder
            );
        }

        let mut file = valid_file();
        file.user_folders = vec!["Documents/Work".into()];
        assert!(BackupConfig::try_from(file).is_ok());
    }

    #[test]
    fn test_keep_last_n_bounds() {
        for n in [0, 7, -1] {
            let mut file = valid_file();
            file.keep_last_n = n;
            assert_eq!(
                validation_message(file),
                "keep_last_n must be greater than 0 and less than 7."
            );
        }
        for n in [1, 6] {
            let mut file = valid_file();
            file.keep_last_n = n;
            assert!(BackupConfig::try_from(file).is_ok());
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let mut file = valid_file();
        file.backup_drive = "bad".into();
        file.backup_root = "bad root".into();
        file.source_drives.clear();
        assert_eq!(
            validation_message(file),
            "Backup drive must be a valid drive letter (e.g. 'G:')."
        );
    }

    #[test]
    fn test_optional_fields() {
        let mut file = valid_file();
        file.system_drive = Some("D:".into());
        file.volume_roots.insert("G:".into(), PathBuf::from("/mnt/usb"));

        let config = BackupConfig::try_from(file).unwrap();
        assert_eq!(config.system_drive().map(|d| d.to_string()), Some("D:".into()));
        assert_eq!(config.backup_dir(), PathBuf::from("/mnt/usb").join("BackupPC"));

        let mut file = valid_file();
        file.volume_roots.insert("usb".into(), PathBuf::from("/mnt/usb"));
        assert!(validation_message(file).contains("volume_roots"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let config = BackupConfig::try_from(valid_file()).unwrap();
        config.save(&path).unwrap();
        assert!(BackupConfig::file_exists(&path));

        let loaded = BackupConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        let err = BackupConfig::load(&path).unwrap_err();
        assert!(err.is_not_found());
        assert!(!BackupConfig::file_exists(&path));
    }

    #[test]
    fn test_load_invalid_values_is_validation_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut file = valid_file();
        file.keep_last_n = 12;
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let err = BackupConfig::load(&path).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_age_based_retention_key_is_rejected() {
        let json = r#"{
            "backup_drive": "G:",
            "backup_root": "BackupPC",
            "source_drives": ["D:"],
            "user_folders": ["Documents"],
            "keep_last_n": 3,
            "retention_days": 3
        }"#;
        assert!(serde_json::from_str::<ConfigFile>(json).is_err());
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "backup_drive": "G:",
            "backup_root": "BackupPC",
            "source_drives": ["D:"],
            "user_folders": ["Documents"],
            "keep_last_n": 2
        }"#;
        let file: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.copy, CopySettings::default());
        assert_eq!(file.approx_os_space_gib, 30.0);
        assert!(BackupConfig::try_from(file).is_ok());
    }
}
