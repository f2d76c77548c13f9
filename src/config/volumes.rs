//! Drive-to-path resolution
//!
//! By default a drive `G:` resolves to its volume root `G:\`. A config file
//! may map drives to arbitrary mount points instead, which is how the tool
//! is pointed at mounted volumes on hosts without drive letters.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::models::Drive;

/// Maps drive identifiers to the filesystem path of their root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeMap {
    roots: BTreeMap<Drive, PathBuf>,
}

impl VolumeMap {
    /// Create an empty map (every drive resolves to its default root)
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `drive` to `root`, returning the updated map
    pub fn with_root(mut self, drive: Drive, root: impl Into<PathBuf>) -> Self {
        self.insert(drive, root);
        self
    }

    /// Map `drive` to `root`
    pub fn insert(&mut self, drive: Drive, root: impl Into<PathBuf>) {
        self.roots.insert(drive, root.into());
    }

    /// Root path of `drive`
    pub fn root(&self, drive: Drive) -> PathBuf {
        self.roots
            .get(&drive)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(drive.default_root()))
    }

    /// Iterate over explicit mappings
    pub fn iter(&self) -> impl Iterator<Item = (&Drive, &PathBuf)> {
        self.roots.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
