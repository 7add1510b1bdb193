//! # Prefvault Core
//!
//! Core library for Prefvault - an encrypted-at-rest store of per-user
//! notification preferences.
//!
//! Each user owns a mapping from event-type name to a boolean flag. The
//! mapping is stored as one AES-256-GCM blob per user and is only ever
//! replaced whole, inside a single storage transaction.
//!
//! ## Architecture
//!
//! - **crypto**: encryption key, blob wire form, AEAD codec
//! - **storage**: storage port traits with SQLite and in-memory backends
//! - **store**: `PreferenceStore`, the read and write paths
//! - **error**: the `PrefError` taxonomy

pub mod crypto;
pub mod error;
pub mod storage;
pub mod store;

pub use crypto::{EncryptedBlob, EncryptionKey};
pub use error::{PrefError, Result};
pub use storage::{PreferenceMapping, PreferenceStorage, UpsertOutcome, UserDirectory};
pub use store::PreferenceStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
