//! Display formatting for terminal output
//!
//! Provides utilities for formatting backup sets and job reports for
//! terminal display.

pub mod backup;

pub use backup::{format_backup_list, format_report, format_staging_list};
