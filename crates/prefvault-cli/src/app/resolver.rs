//! Path resolution for config and database files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, PrefvaultConfig};
use crate::errors::CliError;

/// Resolve the config file path. `--config` (or `PREFVAULT_CONFIG`) wins.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.config.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_config_path()
}

/// Read the config file if there is one.
pub fn load_config(cli: &Cli) -> anyhow::Result<Option<PrefvaultConfig>> {
    let path = resolve_config_path(cli)?;
    if !path.exists() {
        return Ok(None);
    }
    read_config(&path)
        .map(Some)
        .map_err(|e| CliError::config(e.to_string()).into())
}

/// Resolve the database path from CLI args or config.
pub fn resolve_database_path(
    cli: &Cli,
    config: Option<&PrefvaultConfig>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.database.as_deref() {
        return Ok(PathBuf::from(path));
    }
    match config {
        Some(config) => Ok(PathBuf::from(&config.database.path)),
        None => {
            let config_path = resolve_config_path(cli)?;
            Err(CliError::not_found(
                missing_config_message(&config_path),
                "Hint: Run `prefvault init`, or pass --database.",
            )
            .into())
        }
    }
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!("No prefvault config found at {}", config_path.display())
}

/// Error message when the database file is missing.
pub fn missing_database_message(path: &Path) -> String {
    format!("No preference database found at {}", path.display())
}
