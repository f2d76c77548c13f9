//! Configuration CLI commands

use std::path::Path;

use clap::Subcommand;

use crate::config::{BackupConfig, ConfigFile, HostEnvironment};
use crate::error::BackupResult;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate and print the current configuration
    Show,
}

/// Handle a config command against the configuration file at `path`
pub fn handle_config_command(path: &Path, cmd: ConfigCommands) -> BackupResult<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if BackupConfig::file_exists(path) && !force {
                println!("Configuration already exists: {}", path.display());
                println!("To overwrite it, run again with --force flag:");
                println!("  drivebck config init --force");
                return Ok(());
            }

            let config = BackupConfig::try_from(ConfigFile::template())?;
            config.save(path)?;
            println!("Configuration written: {}", path.display());
            println!("Edit it to match your drives, then run 'drivebck check'.");
        }

        ConfigCommands::Show => {
            let config = BackupConfig::load(path)?;
            let host = HostEnvironment::detect(&config);

            println!("drivebck Configuration");
            println!("======================");
            println!("Config file:   {}", path.display());
            println!("Backup drive:  {}", config.backup_drive());
            println!("Backup root:   {}", config.backup_root());
            println!("Backup folder: {}", config.backup_dir().display());
            println!(
                "Source drives: {}",
                config
                    .source_drives()
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("User folders:  {}", config.user_folders().join(", "));
            println!("Keep last:     {}", config.retention().keep_last_n());
            println!();
            println!("System drive:  {}", host.system_drive());
            println!("User profile:  {}", host.user_profile().display());
            println!(
                "Copy:          {} retries, {}s wait",
                config.copy().retries,
                config.copy().wait_secs
            );
            println!("OS space:      {} GiB", config.approx_os_space_gib());

            if !config.volumes().is_empty() {
                println!();
                println!("Volume roots:");
                for (drive, root) in config.volumes().iter() {
                    println!("  {} -> {}", drive, root.display());
                }
            }
        }
    }

    Ok(())
}
