//! Configuration CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path` for
//! viewing and modifying the settings the other commands run with.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use locus::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., request.timeout_secs)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., request.timeout_secs)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against the already loaded configuration.
///
/// `set` writes to `override_path` when given, otherwise to the default file.
pub fn run(
    command: ConfigCommands,
    config: &ConfigFile,
    override_path: Option<PathBuf>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let value = get_value(config, &key)?;
            if value.is_empty() {
                println!("(not set)");
            } else {
                println!("{}", value);
            }
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let path = resolve_path(override_path)?;
            let config_key = set_value(config, &key, &value, &path)?;
            println!("Set {} = {}", config_key.name(), value);
            Ok(())
        }
        ConfigCommands::List => {
            for line in settings_lines(config) {
                println!("{}", line);
            }
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", resolve_path(override_path)?.display());
            Ok(())
        }
    }
}

fn resolve_path(override_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    override_path
        .or_else(config_file_path)
        .ok_or_else(|| CliError::Config("Could not determine home directory".to_string()))
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'locus config list' to see available keys.",
            key
        ))
    })
}

fn get_value(config: &ConfigFile, key: &str) -> Result<String, CliError> {
    Ok(parse_key(key)?.get(config))
}

/// Apply one setting on top of `config` and write the result to `path`.
fn set_value(
    config: &ConfigFile,
    key: &str,
    value: &str,
    path: &Path,
) -> Result<ConfigKey, CliError> {
    let config_key = parse_key(key)?;
    let mut updated = config.clone();
    config_key.set(&mut updated, value)?;
    updated.save_to(path)?;
    Ok(config_key)
}

fn settings_lines(config: &ConfigFile) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("[{}]", section));
            current_section = section;
        }

        let value = key.get(config);
        if value.is_empty() {
            lines.push(format!("  {} = (not set)", key.key_name()));
        } else {
            lines.push(format!("  {} = {}", key.key_name(), value));
        }
    }
    lines
}
