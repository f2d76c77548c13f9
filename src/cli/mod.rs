//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup lifecycle.

pub mod backup;
pub mod config;

pub use backup::{handle_check, handle_clean, handle_list, handle_run, parse_os_space_gib};
pub use config::{handle_config_command, ConfigCommands};
