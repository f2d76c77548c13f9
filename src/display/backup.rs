//! Backup display formatting
//!
//! Formats backup sets and job reports for terminal output.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::backup::{BackupSet, JobReport};

/// Format published backups as a table, most recent first
///
/// Backups beyond `keep_last_n` are marked as due for deletion at the
/// next retention sweep.
pub fn format_backup_list(sets: &[BackupSet], keep_last_n: usize) -> String {
    if sets.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = sets.iter().map(|s| s.name.len()).max().unwrap_or(4).max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>3}  {:<name_width$}  {:>6}  {}\n",
        "#",
        "Name",
        "Age",
        "Status",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:->3}  {:-<name_width$}  {:->6}  {:-<8}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    let now = Local::now().naive_local();
    for (i, set) in sets.iter().enumerate() {
        let status = if i < keep_last_n { "kept" } else { "expired" };
        output.push_str(&format!(
            "{:>3}  {:<name_width$}  {:>6}  {}\n",
            i + 1,
            set.name,
            format_age(now.signed_duration_since(set.created_at.datetime())),
            status,
            name_width = name_width,
        ));
    }

    output.push_str(&format!(
        "\nTotal: {} backup(s), keeping the last {}\n",
        sets.len(),
        keep_last_n
    ));
    output
}

/// Format leftover staging folders
pub fn format_staging_list(paths: &[PathBuf]) -> String {
    let mut output = format!("Incomplete backups: {}\n", paths.len());
    for path in paths {
        output.push_str(&format!("  {}\n", folder_name(path)));
    }
    output
}

/// Format what a job did, one line per step
pub fn format_report(report: &JobReport) -> String {
    let mut output = String::new();

    if let Some(failure) = &report.precondition {
        output.push_str(&format!("Backup not started: {}\n", failure));
        return output;
    }

    if !report.failed_removed.is_empty() {
        output.push_str(&format!(
            "Removed {} incomplete backup(s):\n",
            report.failed_removed.len()
        ));
        for path in &report.failed_removed {
            output.push_str(&format!("  {}\n", folder_name(path)));
        }
    }

    if let Some(run) = &report.run {
        output.push_str(&run.summary());
        output.push('\n');
    }

    if !report.expired_removed.is_empty() {
        output.push_str(&format!(
            "Removed {} expired backup(s):\n",
            report.expired_removed.len()
        ));
        for path in &report.expired_removed {
            output.push_str(&format!("  {}\n", folder_name(path)));
        }
    }

    if let Some(error) = &report.cleanup_error {
        output.push_str(&format!("Cleanup error: {}\n", error));
    }

    if output.is_empty() {
        output.push_str("Nothing to do.\n");
    }
    output
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format a duration in human-readable form
fn format_age(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunTimestamp;
    use crate::validator::PreconditionFailure;

    fn set(name: &str) -> BackupSet {
        BackupSet {
            name: name.to_string(),
            path: PathBuf::from("/backups").join(name),
            created_at: RunTimestamp::parse(name).unwrap(),
        }
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_backup_list(&[], 3), "No backups found.");
    }

    #[test]
    fn test_list_marks_expired() {
        let sets = [set("2024-02-01_00-00-00"), set("2024-01-01_00-00-00")];
        let output = format_backup_list(&sets, 1);

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[2].contains("2024-02-01_00-00-00") && lines[2].ends_with("kept"));
        assert!(lines[3].contains("2024-01-01_00-00-00") && lines[3].ends_with("expired"));
        assert!(output.contains("Total: 2 backup(s), keeping the last 1"));
    }

    #[test]
    fn test_report_blocked() {
        let report = JobReport {
            precondition: Some(PreconditionFailure::SourceMissing("D:".parse().unwrap())),
            ..JobReport::default()
        };
        assert_eq!(
            format_report(&report),
            "Backup not started: Source drive D: does not exist\n"
        );
    }

    #[test]
    fn test_report_cleanup_only() {
        let report = JobReport {
            failed_removed: vec![PathBuf::from("/b/.tmp_backup_2024-01-01_00-00-00")],
            cleanup_error: Some("boom".into()),
            ..JobReport::default()
        };
        let output = format_report(&report);
        assert!(output.contains("Removed 1 incomplete backup(s):"));
        assert!(output.contains("  .tmp_backup_2024-01-01_00-00-00"));
        assert!(output.contains("Cleanup error: boom"));
    }

    #[test]
    fn test_report_nothing() {
        assert_eq!(format_report(&JobReport::default()), "Nothing to do.\n");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(chrono::Duration::seconds(-5)), "0s");
        assert_eq!(format_age(chrono::Duration::minutes(90)), "1h");
        assert_eq!(format_age(chrono::Duration::days(65)), "2mo");
    }
}
