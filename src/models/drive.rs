//! Drive identifier model
//!
//! A drive is a single upper-case volume letter followed by a colon, as in
//! `G:`. The type can only be built from a string matching that pattern.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern every drive identifier must match
pub const DRIVE_PATTERN: &str = r"^[A-Z]:$";

static DRIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DRIVE_PATTERN).expect("drive pattern is a valid regex"));

/// A validated volume identifier such as `C:` or `G:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Drive(char);

impl Drive {
    /// Conventional Windows system drive, `C:`
    pub const DEFAULT_SYSTEM: Drive = Drive('C');

    /// Check whether a raw string is a well-formed drive identifier
    pub fn is_valid(raw: &str) -> bool {
        DRIVE_RE.is_match(raw)
    }

    /// The volume letter without the colon
    pub fn letter(&self) -> char {
        self.0
    }

    /// Default root path of the volume (`G:\`)
    pub fn default_root(&self) -> String {
        format!("{}:\\", self.0)
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.0)
    }
}

/// Error returned when a string is not a drive identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDrive(pub String);

impl fmt::Display for InvalidDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid drive '{}': expected a drive letter such as 'G:'",
            self.0
        )
    }
}

impl std::error::Error for InvalidDrive {}

impl FromStr for Drive {
    type Err = InvalidDrive;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(InvalidDrive(s.to_string()));
        }
        s.chars()
            .next()
            .map(Drive)
            .ok_or_else(|| InvalidDrive(s.to_string()))
    }
}

impl TryFrom<String> for Drive {
    type Error = InvalidDrive;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Drive> for String {
    fn from(drive: Drive) -> Self {
        drive.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_drive() {
        let drive: Drive = "G:".parse().unwrap();
        assert_eq!(drive.letter(), 'G');
        assert_eq!(drive.to_string(), "G:");
        assert_eq!(drive.default_root(), "G:\\");
    }

    #[test]
    fn test_reject_malformed_drives() {
        for raw in ["", "G", "g:", "GG:", "G:\\", "InvalidDrive", "1:"] {
            assert!(raw.parse::<Drive>().is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_serde_uses_string_form() {
        let drive: Drive = "D:".parse().unwrap();
        let json = serde_json::to_string(&drive).unwrap();
        assert_eq!(json, "\"D:\"");

        let back: Drive = serde_json::from_str(&json).unwrap();
        assert_eq!(back, drive);
        assert!(serde_json::from_str::<Drive>("\"d\"").is_err());
    }
}
