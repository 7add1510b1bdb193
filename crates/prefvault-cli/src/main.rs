//! Prefvault CLI - encrypted notification preferences, one blob per user
//!
//! This is the command-line interface for Prefvault. It wires the core
//! preference store to a SQLite database and an encryption key taken from
//! the environment or a keyfile.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod security;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{init, misc, prefs, user};
use crate::errors::CliError;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        if let Some(cli_err) = e.downcast_ref::<CliError>() {
            cli_err.exit();
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` overrides the
/// default level.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "prefvault=debug"
    } else {
        "prefvault=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(args) => init::handle_init(ctx, args),
        Commands::Keygen => misc::handle_keygen(),
        Commands::User { command } => user::handle_user(ctx, command),
        Commands::Prefs { command } => prefs::handle_prefs(ctx, command),
        Commands::Status => misc::handle_status(ctx),
    }
}
