use prefvault_core::storage::NewUser;

use crate::app::AppContext;
use crate::cli::UserSubcommand;
use crate::errors::{from_core, CliError};
use crate::output::print_user;

pub fn handle_user(ctx: &AppContext, command: &UserSubcommand) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let storage = ctx.open_storage(config.as_ref())?;

    match command {
        UserSubcommand::Add {
            username,
            email,
            id,
        } => {
            let mut new_user = NewUser::new(username.trim(), email.trim());
            if let Some(id) = id {
                new_user = new_user.with_id(id.trim());
            }
            if new_user.username.is_empty() || new_user.email.is_empty() {
                return Err(CliError::invalid_input("Username and email must not be empty").into());
            }
            let user = storage.create_user(&new_user).map_err(from_core)?;
            if ctx.quiet() {
                println!("{}", user.id);
            } else {
                println!("Added user {}", user.id);
            }
        }
        UserSubcommand::Show { id, json } => {
            let user = storage
                .get_user(id)
                .map_err(from_core)?
                .ok_or_else(|| user_not_found(id))?;
            print_user(&user, *json)?;
        }
        UserSubcommand::Remove { id } => {
            if !storage.delete_user(id).map_err(from_core)? {
                return Err(user_not_found(id).into());
            }
            if !ctx.quiet() {
                println!("Removed user {} and their preferences", id);
            }
        }
    }
    Ok(())
}

fn user_not_found(id: &str) -> CliError {
    CliError::not_found(
        format!("User not found: {}", id),
        "Hint: Register users with `prefvault user add`.",
    )
}
