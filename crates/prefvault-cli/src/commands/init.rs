use std::path::PathBuf;
use std::time::Duration;

use prefvault_core::storage::{SqliteOptions, SqliteStorage};
use prefvault_core::EncryptionKey;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::{default_database_path, default_keyfile_path, write_config, PrefvaultConfig};
use crate::errors::{from_core, CliError};
use crate::security::{read_keyfile, write_keyfile};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?;
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}\nHint: Pass --force to rewrite it. The keyfile is kept.",
            config_path.display()
        ))
        .into());
    }

    let database_path = match ctx.cli().database.as_deref() {
        Some(path) => PathBuf::from(path),
        None => default_database_path()?,
    };
    let keyfile_path = match args.keyfile.as_deref() {
        Some(path) => PathBuf::from(path),
        None => default_keyfile_path()?,
    };

    let reused_key = if keyfile_path.exists() {
        let encoded = read_keyfile(&keyfile_path)?;
        EncryptionKey::from_base64(&encoded).map_err(|e| {
            CliError::config(format!(
                "Existing keyfile {} is not usable: {}",
                keyfile_path.display(),
                e
            ))
        })?;
        true
    } else {
        write_keyfile(&keyfile_path, &EncryptionKey::generate())?;
        false
    };

    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let options = match args.busy_timeout_ms {
        Some(ms) if ms > 0 => SqliteOptions {
            busy_timeout: Duration::from_millis(ms),
        },
        _ => SqliteOptions::default(),
    };
    SqliteStorage::open(&database_path, &options).map_err(from_core)?;

    let config = PrefvaultConfig::new(
        database_path.clone(),
        args.busy_timeout_ms,
        Some(keyfile_path.clone()),
    );
    write_config(&config_path, &config)?;

    if !ctx.quiet() {
        println!("Initialized prefvault");
        println!("  Config:   {}", config_path.display());
        println!("  Database: {}", database_path.display());
        if reused_key {
            println!("  Keyfile:  {} (existing)", keyfile_path.display());
        } else {
            println!("  Keyfile:  {}", keyfile_path.display());
        }
    }
    Ok(())
}
