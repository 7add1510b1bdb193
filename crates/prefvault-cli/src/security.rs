use std::path::Path;

use prefvault_core::EncryptionKey;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::config::PrefvaultConfig;
use crate::errors::CliError;

/// Environment variable holding the base64 encryption key.
pub const KEY_ENV: &str = "PREFVAULT_ENCRYPTION_KEY";

pub fn write_keyfile(path: &Path, key: &EncryptionKey) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    if path.exists() {
        return Err(anyhow::anyhow!(
            "Keyfile already exists: {}",
            path.display()
        ));
    }
    let encoded = Zeroizing::new(format!("{}\n", key.to_base64().expose_secret()));
    std::fs::write(path, encoded.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to write keyfile {}: {}", path.display(), e))?;
    set_file_permissions(path)?;
    Ok(())
}

pub fn read_keyfile(path: &Path) -> anyhow::Result<SecretString> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read keyfile {}: {}", path.display(), e))?;
    Ok(SecretString::from(contents))
}

/// Resolve the encryption key: the environment first, then the keyfile.
///
/// Any failure here is fatal for the process; no command may touch
/// preference storage without a valid key.
pub fn load_encryption_key(config: Option<&PrefvaultConfig>) -> anyhow::Result<EncryptionKey> {
    let (source, encoded) = match std::env::var(KEY_ENV) {
        Ok(value) if !value.trim().is_empty() => (KEY_ENV.to_string(), SecretString::from(value)),
        _ => {
            let keyfile = config
                .and_then(|c| c.encryption.keyfile.as_deref())
                .ok_or_else(|| {
                    CliError::config(format!(
                        "No encryption key configured. Set {} or run `prefvault init`.",
                        KEY_ENV
                    ))
                })?;
            let path = Path::new(keyfile);
            let encoded = read_keyfile(path).map_err(|e| CliError::config(e.to_string()))?;
            (path.display().to_string(), encoded)
        }
    };

    EncryptionKey::from_base64(&encoded).map_err(|e| {
        tracing::error!(%source, error = %e, "encryption key rejected");
        anyhow::Error::from(CliError::config(format!(
            "Invalid encryption key from {}: {}",
            source, e
        )))
    })
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create keyfile directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    Ok(())
}

fn set_file_permissions(path: &Path) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}
