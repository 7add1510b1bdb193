//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (clap usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (user, config).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Encryption key or config unusable; nothing was attempted.
    pub const CONFIG: i32 = 5;

    /// Storage failure; details are in the log only.
    pub const UNAVAILABLE: i32 = 6;

    /// Stored preferences could not be decrypted.
    pub const LOAD_FAILED: i32 = 7;
}
