//! Run timestamp model
//!
//! Every run captures one timestamp at start and reuses it for every path
//! built during that run. The textual form doubles as the published
//! backup folder name.

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};

/// Textual format of a run timestamp (`2024-01-22_10-30-45`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A second-resolution local timestamp identifying one backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTimestamp(NaiveDateTime);

impl RunTimestamp {
    /// Capture the current local time, truncated to whole seconds
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Wrap an existing date-time, dropping sub-second precision
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    /// Parse the `YYYY-MM-DD_HH-MM-SS` form
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .ok()
            .map(Self)
    }

    /// The underlying date-time
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}
