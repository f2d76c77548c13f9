//! Drive and space probing
//!
//! The validator never touches the filesystem directly; it asks a
//! `DriveProber`. Every query is synchronous and side-effect free, and a
//! probe that cannot be answered (volume unplugged mid-check, permission
//! denied) is reported as "does not exist" rather than as an error.

use std::path::Path;

use crate::config::VolumeMap;
use crate::models::Drive;

/// Byte counts for the volume holding a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// Queries the validator needs answered about the host
pub trait DriveProber {
    /// Identifiers (`"G:"`) of volumes currently mounted
    fn mounted_volumes(&self) -> Vec<String>;

    /// Used and free space of the volume containing `path`
    fn usage(&self, path: &Path) -> Option<DiskUsage>;

    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;
}

impl<P: DriveProber + ?Sized> DriveProber for &P {
    fn mounted_volumes(&self) -> Vec<String> {
        (**self).mounted_volumes()
    }

    fn usage(&self, path: &Path) -> Option<DiskUsage> {
        (**self).usage(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// Prober backed by the real filesystem
///
/// A drive counts as mounted when its resolved root directory exists.
#[derive(Debug, Clone, Default)]
pub struct SystemProber {
    volumes: VolumeMap,
}

impl SystemProber {
    pub fn new(volumes: VolumeMap) -> Self {
        Self { volumes }
    }
}

impl DriveProber for SystemProber {
    fn mounted_volumes(&self) -> Vec<String> {
        ('A'..='Z')
            .filter_map(|letter| format!("{}:", letter).parse::<Drive>().ok())
            .filter(|drive| self.volumes.root(*drive).is_dir())
            .map(|drive| drive.to_string())
            .collect()
    }

    fn usage(&self, path: &Path) -> Option<DiskUsage> {
        let total = fs2::total_space(path).ok()?;
        let free = fs2::free_space(path).ok()?;
        let available = fs2::available_space(path).ok()?;
        Some(DiskUsage {
            total,
            used: total.saturating_sub(free),
            free: available,
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mapped_volume_is_mounted() {
        let temp_dir = TempDir::new().unwrap();
        let g: Drive = "G:".parse().unwrap();
        let h: Drive = "H:".parse().unwrap();
        let volumes = VolumeMap::new()
            .with_root(g, temp_dir.path())
            .with_root(h, temp_dir.path().join("unplugged"));

        let prober = SystemProber::new(volumes);
        let mounted = prober.mounted_volumes();
        assert!(mounted.contains(&"G:".to_string()));
        assert!(!mounted.contains(&"H:".to_string()));
    }

    #[test]
    fn test_usage_of_existing_path() {
        let temp_dir = TempDir::new().unwrap();
        let prober = SystemProber::default();

        let usage = prober.usage(temp_dir.path()).unwrap();
        assert!(usage.total > 0);
        assert!(usage.used <= usage.total);
        assert!(usage.free <= usage.total);
    }

    #[test]
    fn test_missing_path_probes_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let prober = SystemProber::default();

        assert!(!prober.exists(&missing));
        assert!(prober.usage(&missing).is_none());
    }
}
