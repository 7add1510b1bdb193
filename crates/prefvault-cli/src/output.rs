//! Output formatting helpers for the CLI.

use prefvault_core::storage::User;
use prefvault_core::PreferenceMapping;

pub fn print_preferences(
    mapping: &PreferenceMapping,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(mapping)?);
        return Ok(());
    }
    if mapping.is_empty() {
        if !quiet {
            println!("No preferences saved.");
        }
        return Ok(());
    }
    let width = mapping.keys().map(|k| k.len()).max().unwrap_or(0);
    for (event, enabled) in mapping {
        let state = if *enabled { "on" } else { "off" };
        println!("{:width$}  {}", event, state, width = width);
    }
    Ok(())
}

pub fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "created_at": user.created_at,
    })
}

pub fn print_user(user: &User, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&user_json(user))?);
        return Ok(());
    }
    println!("ID:       {}", user.id);
    println!("Username: {}", user.username);
    println!("Email:    {}", user.email);
    println!("Created:  {}", user.created_at.to_rfc3339());
    Ok(())
}
