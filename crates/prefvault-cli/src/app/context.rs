//! Application context for the Prefvault CLI.
//!
//! Bundles CLI arguments with the steps every command repeats: reading the
//! config, loading the key, opening storage.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use prefvault_core::storage::{SqliteOptions, SqliteStorage};
use prefvault_core::PreferenceStore;

use crate::cli::Cli;
use crate::config::PrefvaultConfig;
use crate::errors::{from_core, CliError};
use crate::security::load_encryption_key;

use super::resolver::{
    load_config, missing_database_message, resolve_config_path, resolve_database_path,
};

/// The preference store as the CLI wires it: one SQLite handle serves as
/// both the preference storage and the user directory.
pub type CliStore = PreferenceStore<Arc<SqliteStorage>, Arc<SqliteStorage>>;

pub struct AppContext<'a> {
    cli: &'a Cli,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self { cli }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        resolve_config_path(self.cli)
    }

    pub fn config(&self) -> anyhow::Result<Option<PrefvaultConfig>> {
        load_config(self.cli)
    }

    pub fn database_path(&self, config: Option<&PrefvaultConfig>) -> anyhow::Result<PathBuf> {
        resolve_database_path(self.cli, config)
    }

    /// Open an existing database. Never creates one; that is `init`'s job.
    pub fn open_storage(
        &self,
        config: Option<&PrefvaultConfig>,
    ) -> anyhow::Result<Arc<SqliteStorage>> {
        let path = self.database_path(config)?;
        if !path.exists() {
            return Err(CliError::not_found(
                missing_database_message(&path),
                "Hint: Run `prefvault init` to create it.",
            )
            .into());
        }

        let options = match config {
            Some(c) if c.database.busy_timeout_ms > 0 => SqliteOptions {
                busy_timeout: Duration::from_millis(c.database.busy_timeout_ms),
            },
            _ => SqliteOptions::default(),
        };

        tracing::debug!(path = %path.display(), "opening preference database");
        let storage = SqliteStorage::open(&path, &options).map_err(from_core)?;
        Ok(Arc::new(storage))
    }

    /// Load the key, then open storage and build the store.
    ///
    /// The key is resolved first so a missing or malformed key fails before
    /// the database is touched.
    pub fn open_store(&self) -> anyhow::Result<CliStore> {
        let config = self.config()?;
        let key = load_encryption_key(config.as_ref())?;
        let storage = self.open_storage(config.as_ref())?;
        Ok(PreferenceStore::new(
            Arc::clone(&storage),
            storage,
            Arc::new(key),
        ))
    }
}
