use clap::{Args, Parser, Subcommand};

use prefvault_core::VERSION;

/// Prefvault - encrypted notification preferences, one blob per user
#[derive(Parser)]
#[command(name = "prefvault")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "PREFVAULT_CONFIG")]
    pub config: Option<String>,

    /// Path to the preference database (overrides config)
    #[arg(short, long, global = true, env = "PREFVAULT_DB")]
    pub database: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log core operations to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the config file, keyfile and database
    Init(InitArgs),

    /// Print a freshly generated encryption key (base64)
    Keygen,

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserSubcommand,
    },

    /// Read or change notification preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsSubcommand,
    },

    /// Show database location and record counts
    Status,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Keyfile path override
    #[arg(long)]
    pub keyfile: Option<String>,

    /// Wait this long for a competing writer before failing (milliseconds)
    #[arg(long)]
    pub busy_timeout_ms: Option<u64>,

    /// Overwrite an existing config file (the keyfile is never overwritten)
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Register a user
    Add {
        /// Unique username
        #[arg(value_name = "USERNAME")]
        username: String,

        /// Unique email address
        #[arg(value_name = "EMAIL")]
        email: String,

        /// Use this id instead of a generated UUID
        #[arg(long)]
        id: Option<String>,
    },

    /// Show a user
    Show {
        /// User ID
        #[arg(value_name = "ID")]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a user and their preferences
    Remove {
        /// User ID
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PrefsSubcommand {
    /// Print a user's preferences
    Get {
        /// User ID
        #[arg(value_name = "USER_ID")]
        user_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace a user's preferences with a JSON object
    Put {
        /// User ID
        #[arg(value_name = "USER_ID")]
        user_id: String,

        /// JSON object of event type to boolean, or "-" to read stdin
        #[arg(value_name = "JSON")]
        payload: String,
    },

    /// Change individual flags, keeping the rest
    Set {
        /// User ID
        #[arg(value_name = "USER_ID")]
        user_id: String,

        /// Assignments such as order_created=true
        #[arg(value_name = "EVENT=BOOL", required = true)]
        assignments: Vec<String>,
    },
}
