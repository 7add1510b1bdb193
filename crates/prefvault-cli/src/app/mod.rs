//! Application-level utilities for the Prefvault CLI.
//!
//! This module provides:
//! - Path resolution for config and database files
//! - The command context that loads the key and opens storage

mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
