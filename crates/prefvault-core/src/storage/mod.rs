//! Storage port and backends.
//!
//! - **traits**: `PreferenceStorage` and `UserDirectory`, the only way the
//!   preference store reaches persistence
//! - **sqlite**: SQLite backend with transactional upsert
//! - **memory**: in-memory backend for tests and embedding

pub mod memory;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use memory::MemoryStorage;
pub use sqlite::{SqliteOptions, SqliteStorage, DEFAULT_BUSY_TIMEOUT};
pub use traits::{PreferenceStorage, UserDirectory};
pub use types::{NewUser, PreferenceMapping, PreferenceRecord, UpsertOutcome, User};
