use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use drivebck::cli::{
    handle_check, handle_clean, handle_config_command, handle_list, handle_run,
    parse_os_space_gib, ConfigCommands,
};
use drivebck::config::{AppPaths, BackupConfig};
use drivebck::logging::{self, LogSettings};

#[derive(Parser)]
#[command(
    name = "drivebck",
    version,
    about = "Local drive backup orchestrator",
    long_about = "drivebck mirrors whole drives and selected user folders into a dated \
                  folder on a backup drive, publishes it only once every copy succeeded, \
                  and removes expired and abandoned backups."
)]
struct Cli {
    /// Configuration file (defaults to config.json in the drivebck home)
    #[arg(long, global = true, env = "DRIVEBCK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for backup.log (defaults to logs/ in the drivebck home)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log to the console only
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check preconditions, then back up and clean up
    Run {
        /// Approximate OS size in GiB, excluded from the system drive
        #[arg(long, value_parser = parse_os_space_gib)]
        os_space_gib: Option<f64>,
    },

    /// Check whether a backup can be performed
    Check {
        /// Approximate OS size in GiB, excluded from the system drive
        #[arg(long, value_parser = parse_os_space_gib)]
        os_space_gib: Option<f64>,
    },

    /// Delete expired and incomplete backups
    Clean {
        /// Only delete backups beyond the retention threshold
        #[arg(long)]
        old: bool,
        /// Only delete staging folders left by failed runs
        #[arg(long)]
        failed: bool,
    },

    /// List backups on the backup drive
    #[command(alias = "ls")]
    List,

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let paths = AppPaths::new()?;

    let log_file = if cli.no_log_file {
        None
    } else {
        Some(match &cli.log_dir {
            Some(dir) => dir.join("backup.log"),
            None => paths.log_file(),
        })
    };
    let _log_guard = logging::init(&LogSettings::new(log_file))?;

    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    debug!(path = %config_path.display(), "Using configuration file");

    let succeeded = match cli.command {
        Commands::Config(cmd) => {
            handle_config_command(&config_path, cmd)?;
            true
        }
        Commands::Run { os_space_gib } => handle_run(&load_config(&config_path)?, os_space_gib)?,
        Commands::Check { os_space_gib } => {
            handle_check(&load_config(&config_path)?, os_space_gib)?
        }
        Commands::Clean { old, failed } => handle_clean(&load_config(&config_path)?, old, failed)?,
        Commands::List => handle_list(&load_config(&config_path)?)?,
    };

    if succeeded {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Command did not complete successfully");
        Ok(ExitCode::FAILURE)
    }
}

fn load_config(path: &Path) -> Result<BackupConfig> {
    BackupConfig::load(path)
        .context("Cannot load configuration (create one with 'drivebck config init')")
}
