use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use prefvault_core::storage::DEFAULT_BUSY_TIMEOUT;

#[derive(Debug, Serialize, Deserialize)]
pub struct PrefvaultConfig {
    pub database: DatabaseSection,
    #[serde(default)]
    pub encryption: EncryptionSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct EncryptionSection {
    pub keyfile: Option<String>,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT.as_millis() as u64
}

impl PrefvaultConfig {
    pub fn new(
        database_path: PathBuf,
        busy_timeout_ms: Option<u64>,
        keyfile_path: Option<PathBuf>,
    ) -> Self {
        Self {
            database: DatabaseSection {
                path: database_path.to_string_lossy().to_string(),
                busy_timeout_ms: busy_timeout_ms.unwrap_or_else(default_busy_timeout_ms),
            },
            encryption: EncryptionSection {
                keyfile: keyfile_path.map(|path| path.to_string_lossy().to_string()),
            },
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_database_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("prefvault.db"))
}

pub fn default_keyfile_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("prefvault.key"))
}

pub fn read_config(path: &Path) -> anyhow::Result<PrefvaultConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &PrefvaultConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("prefvault"));
        }
    }
    Ok(home_dir()?.join(".config").join("prefvault"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("prefvault"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("prefvault"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = PrefvaultConfig::new(
            PathBuf::from("/data/prefvault.db"),
            Some(250),
            Some(PathBuf::from("/keys/prefvault.key")),
        );

        write_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();

        assert_eq!(loaded.database.path, "/data/prefvault.db");
        assert_eq!(loaded.database.busy_timeout_ms, 250);
        assert_eq!(
            loaded.encryption.keyfile.as_deref(),
            Some("/keys/prefvault.key")
        );
    }

    #[test]
    fn test_missing_optional_sections_use_defaults() {
        let config: PrefvaultConfig = toml::from_str("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert!(config.encryption.keyfile.is_none());
    }

    #[test]
    fn test_missing_database_section_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[encryption]\n").unwrap();

        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
