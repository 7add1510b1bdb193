use prefvault_core::EncryptionKey;
use secrecy::ExposeSecret;

use crate::app::AppContext;
use crate::errors::from_core;
use crate::security::KEY_ENV;

/// Print a new random key, suitable for `PREFVAULT_ENCRYPTION_KEY` or a keyfile.
pub fn handle_keygen() -> anyhow::Result<()> {
    let key = EncryptionKey::generate();
    println!("{}", key.to_base64().expose_secret());
    Ok(())
}

pub fn handle_status(ctx: &AppContext) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?;
    let config = ctx.config()?;
    let storage = ctx.open_storage(config.as_ref())?;
    let database_path = ctx.database_path(config.as_ref())?;

    let key_source = if std::env::var(KEY_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        KEY_ENV.to_string()
    } else {
        config
            .as_ref()
            .and_then(|c| c.encryption.keyfile.clone())
            .unwrap_or_else(|| "none".to_string())
    };

    let users = storage.count_users().map_err(from_core)?;
    let records = storage.count_preference_records().map_err(from_core)?;

    if ctx.quiet() {
        println!("{} {}", users, records);
        return Ok(());
    }
    let config_state = if config.is_some() { "" } else { " (missing)" };
    println!("Config:      {}{}", config_path.display(), config_state);
    println!("Database:    {}", database_path.display());
    println!("Key source:  {}", key_source);
    println!("Users:       {}", users);
    println!("Preferences: {}", records);
    Ok(())
}
