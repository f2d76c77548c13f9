//! Host environment lookup
//!
//! Resolves the two facts the builder and validator need from the
//! environment: the current user's profile folder and the system drive.
//!
//! ## Resolution Order
//!
//! User profile:
//! 1. `USERPROFILE` environment variable
//! 2. Home directory reported by the platform
//! 3. `C:\Users\Default`
//!
//! System drive:
//! 1. `system_drive` in the configuration file
//! 2. `SystemDrive` environment variable
//! 3. `C:`

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use super::settings::BackupConfig;
use crate::models::Drive;

/// Profile used when nothing else can be determined
pub const DEFAULT_USER_PROFILE: &str = r"C:\Users\Default";

/// User profile and system drive of the running host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    user_profile: PathBuf,
    system_drive: Drive,
}

impl HostEnvironment {
    /// Create an environment with explicit values (useful for testing)
    pub fn new(user_profile: impl Into<PathBuf>, system_drive: Drive) -> Self {
        Self {
            user_profile: user_profile.into(),
            system_drive,
        }
    }

    /// Detect the environment of the running process
    pub fn detect(config: &BackupConfig) -> Self {
        let user_profile = std::env::var_os("USERPROFILE")
            .map(PathBuf::from)
            .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_USER_PROFILE));

        let system_drive = config
            .system_drive()
            .or_else(|| {
                std::env::var("SystemDrive")
                    .ok()
                    .and_then(|raw| raw.parse().ok())
            })
            .unwrap_or(Drive::DEFAULT_SYSTEM);

        Self {
            user_profile,
            system_drive,
        }
    }

    pub fn user_profile(&self) -> &Path {
        &self.user_profile
    }

    pub fn system_drive(&self) -> Drive {
        self.system_drive
    }

    /// Path of a configured user folder inside the profile
    pub fn user_folder(&self, name: &str) -> PathBuf {
        self.user_profile.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_environment() {
        let drive: Drive = "C:".parse().unwrap();
        let env = HostEnvironment::new("/home/alice", drive);

        assert_eq!(env.user_profile(), Path::new("/home/alice"));
        assert_eq!(env.system_drive(), drive);
        assert_eq!(
            env.user_folder("Documents"),
            Path::new("/home/alice").join("Documents")
        );
    }

    #[test]
    fn test_config_system_drive_wins() {
        let mut file = crate::config::ConfigFile::new("G:", "BackupPC", &["D:"], &["Documents"], 3);
        file.system_drive = Some("D:".into());
        let config = BackupConfig::try_from(file).unwrap();

        let env = HostEnvironment::detect(&config);
        assert_eq!(env.system_drive().to_string(), "D:");
    }
}
