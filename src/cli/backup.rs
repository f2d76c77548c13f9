//! Backup CLI commands
//!
//! Each handler prints its outcome and returns whether the command
//! succeeded, so the binary can pick the exit status.

use tracing::info;

use crate::backup::{BackupCleaner, BackupJob, RobocopyMirror};
use crate::config::{BackupConfig, HostEnvironment};
use crate::display::{format_backup_list, format_report, format_staging_list};
use crate::error::BackupResult;
use crate::probe::SystemProber;
use crate::validator::BackupValidator;

/// Parse `--os-space-gib`: a finite, non-negative number of GiB
pub fn parse_os_space_gib(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err("must be a non-negative number of GiB".to_string());
    }
    Ok(value)
}

/// Run a full backup: checks, failed sweep, copy, retention sweep
pub fn handle_run(config: &BackupConfig, os_space_gib: Option<f64>) -> BackupResult<bool> {
    let host = HostEnvironment::detect(config);
    let os_space_gib = os_space_gib.unwrap_or_else(|| config.approx_os_space_gib());

    println!("Backing up to {}", config.backup_dir().display());
    let job = BackupJob::new(
        config,
        &host,
        SystemProber::new(config.volumes().clone()),
        RobocopyMirror::new(config.copy()),
    );
    let report = job.run(os_space_gib)?;

    print!("{}", format_report(&report));
    info!(succeeded = report.succeeded(), "Backup job finished");
    Ok(report.succeeded())
}

/// Run the precondition checks without copying anything
pub fn handle_check(config: &BackupConfig, os_space_gib: Option<f64>) -> BackupResult<bool> {
    let host = HostEnvironment::detect(config);
    let os_space_gib = os_space_gib.unwrap_or_else(|| config.approx_os_space_gib());

    println!("Backup Checks");
    println!("=============");
    println!("Backup folder: {}", config.backup_dir().display());
    println!("System drive:  {}", host.system_drive());
    println!("User profile:  {}", host.user_profile().display());
    println!();

    let prober = SystemProber::new(config.volumes().clone());
    let validator = BackupValidator::new(config, &host, &prober);
    match validator.check(os_space_gib) {
        Ok(()) => {
            println!("All checks passed. A backup can be performed.");
            Ok(true)
        }
        Err(failure) => {
            println!("Backup cannot be performed: {}", failure);
            Ok(false)
        }
    }
}

/// Run the cleanup sweeps; with neither flag set, run both
pub fn handle_clean(config: &BackupConfig, old: bool, failed: bool) -> BackupResult<bool> {
    let (old, failed) = if old || failed {
        (old, failed)
    } else {
        (true, true)
    };

    let host = HostEnvironment::detect(config);
    let job = BackupJob::new(
        config,
        &host,
        SystemProber::new(config.volumes().clone()),
        RobocopyMirror::new(config.copy()),
    );
    let report = job.clean(old, failed)?;

    print!("{}", format_report(&report));
    Ok(report.succeeded())
}

/// List published and leftover staging backups
pub fn handle_list(config: &BackupConfig) -> BackupResult<bool> {
    let cleaner = BackupCleaner::new(config);
    let keep_last_n = config.retention().keep_last_n();

    println!("Backups in {}", config.backup_dir().display());
    println!();
    print!("{}", format_backup_list(&cleaner.list_completed()?, keep_last_n));

    let staging = cleaner.list_staging()?;
    if !staging.is_empty() {
        println!();
        print!("{}", format_staging_list(&staging));
        println!("Remove them with: drivebck clean --failed");
    }
    Ok(true)
}
