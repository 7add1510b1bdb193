//! Error types for Prefvault core operations.
//!
//! Every failure the core can produce is a variant of [`PrefError`]. Callers
//! match on the variant; the CLI layer decides what is shown to a user and
//! what only goes to the log.

use thiserror::Error;

/// Result type alias for Prefvault operations.
pub type Result<T> = std::result::Result<T, PrefError>;

/// Message shown in place of operator-facing failures.
pub const UNAVAILABLE_MESSAGE: &str = "Service unavailable. Please try again later.";

/// Core error type for Prefvault operations.
#[derive(Debug, Error)]
pub enum PrefError {
    /// The blob or its decrypted payload is not in the expected shape
    #[error("Malformed preference blob: {0}")]
    Format(String),

    /// Authentication tag did not verify (wrong key or tampered data)
    #[error("Preference blob failed authentication")]
    Integrity,

    /// Encryption key or other configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The user targeted by a write does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Uniqueness race reported by a storage adapter
    #[error("Storage conflict: {0}")]
    Conflict(String),

    /// Stored preferences exist but could not be decoded
    #[error("Failed to load notification preferences.")]
    PreferenceLoadFailure,

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },
}

impl PrefError {
    /// Errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PrefError::UserNotFound(_)
                | PrefError::InvalidInput(_)
                | PrefError::PreferenceLoadFailure
        )
    }

    /// Text that is safe to hand to an external caller.
    ///
    /// Operator-facing failures collapse to [`UNAVAILABLE_MESSAGE`]; their
    /// detail belongs in the log only.
    pub fn public_message(&self) -> String {
        match self {
            PrefError::UserNotFound(_)
            | PrefError::InvalidInput(_)
            | PrefError::PreferenceLoadFailure => self.to_string(),
            // Codec errors never reach callers directly; the store maps them.
            PrefError::Format(_) | PrefError::Integrity => {
                PrefError::PreferenceLoadFailure.to_string()
            }
            PrefError::Config(_)
            | PrefError::Storage(_)
            | PrefError::Conflict(_)
            | PrefError::Sqlite { .. } => UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

impl From<serde_json::Error> for PrefError {
    fn from(err: serde_json::Error) -> Self {
        PrefError::Format(err.to_string())
    }
}
