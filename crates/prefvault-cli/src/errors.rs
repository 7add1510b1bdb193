//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use prefvault_core::PrefError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (user, config)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// Key or configuration problem detected at startup
    Config(String),

    /// Stored preferences could not be read
    LoadFailed(String),

    /// Operator-facing failure; message is generic
    Unavailable(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::InvalidInput(message)
            | CliError::Config(message)
            | CliError::LoadFailed(message)
            | CliError::Unavailable(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        CliError::Config(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::Config(_) => exit_codes::CONFIG,
            CliError::LoadFailed(_) => exit_codes::LOAD_FAILED,
            CliError::Unavailable(_) => exit_codes::UNAVAILABLE,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}

impl From<PrefError> for CliError {
    /// Only `public_message` text reaches the terminal; operator-facing
    /// detail is logged here.
    fn from(err: PrefError) -> Self {
        match err {
            PrefError::UserNotFound(ref id) => CliError::not_found(
                err.public_message(),
                format!("Hint: Register the user first with `prefvault user add --id {} ...`.", id),
            ),
            PrefError::InvalidInput(_) => CliError::InvalidInput(err.public_message()),
            PrefError::PreferenceLoadFailure | PrefError::Format(_) | PrefError::Integrity => {
                CliError::LoadFailed(err.public_message())
            }
            PrefError::Config(_) => {
                tracing::error!(error = %err, "configuration failure");
                CliError::Config(err.public_message())
            }
            PrefError::Storage(_) | PrefError::Conflict(_) | PrefError::Sqlite { .. } => {
                tracing::error!(error = %err, "storage failure");
                CliError::Unavailable(err.public_message())
            }
        }
    }
}

/// Convert a core error into the CLI's error chain.
pub fn from_core(err: PrefError) -> anyhow::Error {
    anyhow::Error::from(CliError::from(err))
}
