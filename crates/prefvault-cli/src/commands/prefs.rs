use prefvault_core::UpsertOutcome;

use crate::app::AppContext;
use crate::cli::PrefsSubcommand;
use crate::errors::from_core;
use crate::helpers::{parse_assignments, parse_preferences, read_payload};
use crate::output::print_preferences;

pub fn handle_prefs(ctx: &AppContext, command: &PrefsSubcommand) -> anyhow::Result<()> {
    let store = ctx.open_store()?;

    match command {
        PrefsSubcommand::Get { user_id, json } => {
            let mapping = store.get(user_id).map_err(from_core)?;
            print_preferences(&mapping, *json, ctx.quiet())?;
        }
        PrefsSubcommand::Put { user_id, payload } => {
            let mapping = parse_preferences(&read_payload(payload)?)?;
            let outcome = store.put(user_id, &mapping).map_err(from_core)?;
            if !ctx.quiet() {
                let verb = match outcome {
                    UpsertOutcome::Inserted => "Saved",
                    UpsertOutcome::Updated => "Replaced",
                };
                println!(
                    "{} {} preference(s) for user {}",
                    verb,
                    mapping.len(),
                    user_id
                );
            }
        }
        PrefsSubcommand::Set {
            user_id,
            assignments,
        } => {
            let changes = parse_assignments(assignments)?;
            let mapping = store.set_flags(user_id, &changes).map_err(from_core)?;
            if !ctx.quiet() {
                print_preferences(&mapping, false, false)?;
            }
        }
    }
    Ok(())
}
