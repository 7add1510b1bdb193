//! SQLite storage backend.
//!
//! One connection per `SqliteStorage`, guarded by a mutex. Writes run in
//! `BEGIN IMMEDIATE` transactions, so the existence check and the write hold
//! the database write lock together, including across processes sharing the
//! same file. The `ON CONFLICT` clause on insert is the backstop for the
//! uniqueness constraint on `user_id`.

mod row;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::crypto::EncryptedBlob;
use crate::error::{PrefError, Result};
use crate::storage::traits::{PreferenceStorage, UserDirectory};
use crate::storage::types::{NewUser, PreferenceRecord, UpsertOutcome, User};

use row::{PreferenceRow, UserRow};

/// Default time a transaction waits for a competing writer.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notification_preferences (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE,
        encrypted_preferences TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,

        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
"#;

/// Connection settings for [`SqliteStorage`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// SQLite-backed user directory and preference storage.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path, options: &SqliteOptions) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| PrefError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;
        Self::init(conn, options)
    }

    /// Private in-memory database, mostly useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, &SqliteOptions::default())
    }

    fn init(conn: Connection, options: &SqliteOptions) -> Result<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(
            busy_timeout_ms = options.busy_timeout.as_millis() as u64,
            "sqlite storage ready"
        );
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PrefError::Storage("SQLite connection poisoned".to_string()))
    }

    // --- User directory ---

    /// Register a user.
    ///
    /// # Errors
    ///
    /// Returns `PrefError::InvalidInput` if the id, username or email is
    /// already taken.
    pub fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let user = User {
            id: new_user
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            created_at: Utc::now(),
        };

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO users (id, username, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id,
                user.username,
                user.email,
                user.created_at.to_rfc3339()
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                PrefError::InvalidInput(format!(
                    "User already exists (id, username or email taken): {}",
                    user.username
                ))
            } else {
                PrefError::Storage(e.to_string())
            }
        })?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", UserRow::COLUMNS);
        let row = conn
            .query_row(&sql, params![user_id], UserRow::from_row)
            .optional()?;
        row.map(User::try_from).transpose()
    }

    /// Delete a user. Their preference record goes with them.
    ///
    /// # Returns
    ///
    /// Returns `true` if a user was deleted.
    pub fn delete_user(&self, user_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if changed > 0 {
            tracing::info!(user_id, "user deleted");
        }
        Ok(changed > 0)
    }

    pub fn count_users(&self) -> Result<usize> {
        self.count("users")
    }

    pub fn count_preference_records(&self) -> Result<usize> {
        self.count("notification_preferences")
    }

    fn count(&self, table: &str) -> Result<usize> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Overwrite the stored text for a user without going through the codec.
    #[cfg(test)]
    pub(crate) fn write_raw(&self, user_id: &str, encrypted: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE notification_preferences SET encrypted_preferences = ?1 WHERE user_id = ?2",
            params![encrypted, user_id],
        )?;
        Ok(())
    }
}

impl UserDirectory for SqliteStorage {
    fn exists(&self, user_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl PreferenceStorage for SqliteStorage {
    fn find_by_user_id(&self, user_id: &str) -> Result<Option<PreferenceRecord>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM notification_preferences WHERE user_id = ?1",
            PreferenceRow::COLUMNS
        );
        let row = conn
            .query_row(&sql, params![user_id], PreferenceRow::from_row)
            .optional()
            .map_err(|e| classify(e, user_id))?;
        row.map(PreferenceRecord::try_from).transpose()
    }

    fn atomic_upsert(&self, user_id: &str, blob: &EncryptedBlob) -> Result<UpsertOutcome> {
        self.atomic_update(user_id, &mut |_| Ok(blob.clone()))
    }

    fn atomic_update(
        &self,
        user_id: &str,
        update: &mut dyn FnMut(Option<&str>) -> Result<EncryptedBlob>,
    ) -> Result<UpsertOutcome> {
        let mut conn = self.lock_conn()?;

        // Dropping `tx` on any early return rolls back.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| classify(e, user_id))?;

        let existing: Option<(String, String)> = tx
            .query_row(
                "SELECT id, encrypted_preferences FROM notification_preferences WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| classify(e, user_id))?;

        let stored = existing.as_ref().map(|(_, text)| text.as_str());
        let encrypted = update(stored)?.to_string();
        let now = Utc::now().to_rfc3339();

        let outcome = match existing {
            Some((id, _)) => {
                tx.execute(
                    "UPDATE notification_preferences
                     SET encrypted_preferences = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![encrypted, now, id],
                )
                .map_err(|e| classify(e, user_id))?;
                UpsertOutcome::Updated
            }
            None => {
                tx.execute(
                    "INSERT INTO notification_preferences
                        (id, user_id, encrypted_preferences, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     ON CONFLICT(user_id) DO UPDATE SET
                        encrypted_preferences = excluded.encrypted_preferences,
                        updated_at = excluded.updated_at",
                    params![Uuid::new_v4().to_string(), user_id, encrypted, now],
                )
                .map_err(|e| classify(e, user_id))?;
                UpsertOutcome::Inserted
            }
        };

        tx.commit().map_err(|e| classify(e, user_id))?;
        tracing::debug!(user_id, ?outcome, "preferences upserted");
        Ok(outcome)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Map a SQLite failure onto the storage port's error contract.
fn classify(err: rusqlite::Error, user_id: &str) -> PrefError {
    if is_unique_violation(&err) {
        return PrefError::Conflict(err.to_string());
    }
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        // The user vanished between the existence check and the write.
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
            return PrefError::UserNotFound(user_id.to_string());
        }
        if matches!(
            failure.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
        ) {
            return PrefError::Storage(format!("Database busy: {}", err));
        }
    }
    PrefError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{encode, EncryptionKey};
    use crate::storage::PreferenceMapping;

    fn storage_with_user(id: &str) -> SqliteStorage {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .create_user(
                &NewUser::new(format!("user-{}", id), format!("{}@example.com", id)).with_id(id),
            )
            .unwrap();
        storage
    }

    fn blob(flag: bool) -> EncryptedBlob {
        let key = EncryptionKey::from_bytes(&[9u8; 32]).unwrap();
        let mut prefs = PreferenceMapping::new();
        prefs.insert("order_created".to_string(), flag);
        encode(&prefs, &key).unwrap()
    }

    #[test]
    fn test_exists() {
        let storage = storage_with_user("u1");
        assert!(storage.exists("u1").unwrap());
        assert!(!storage.exists("u2").unwrap());
    }

    #[test]
    fn test_create_user_generates_id() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = storage
            .create_user(&NewUser::new("alice", "alice@example.com"))
            .unwrap();
        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(storage.get_user(&user.id).unwrap(), Some(user));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let storage = storage_with_user("u1");
        let result = storage.create_user(&NewUser::new("user-u1", "other@example.com"));
        assert!(matches!(result, Err(PrefError::InvalidInput(_))));
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let storage = storage_with_user("u1");
        assert!(storage.find_by_user_id("u1").unwrap().is_none());

        let first = blob(true);
        assert_eq!(
            storage.atomic_upsert("u1", &first).unwrap(),
            UpsertOutcome::Inserted
        );
        let inserted = storage.find_by_user_id("u1").unwrap().unwrap();
        assert_eq!(inserted.encrypted_preferences, first.to_string());
        assert_eq!(inserted.created_at, inserted.updated_at);

        let second = blob(false);
        assert_eq!(
            storage.atomic_upsert("u1", &second).unwrap(),
            UpsertOutcome::Updated
        );
        let updated = storage.find_by_user_id("u1").unwrap().unwrap();
        assert_eq!(updated.id, inserted.id);
        assert_eq!(updated.created_at, inserted.created_at);
        assert!(updated.updated_at >= inserted.updated_at);
        assert_eq!(updated.encrypted_preferences, second.to_string());
        assert_eq!(storage.count_preference_records().unwrap(), 1);
    }

    #[test]
    fn test_upsert_for_unknown_user_fails_foreign_key() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let result = storage.atomic_upsert("ghost", &blob(true));
        assert!(matches!(result, Err(PrefError::UserNotFound(id)) if id == "ghost"));
        assert_eq!(storage.count_preference_records().unwrap(), 0);
    }

    #[test]
    fn test_delete_user_cascades() {
        let storage = storage_with_user("u1");
        storage.atomic_upsert("u1", &blob(true)).unwrap();

        assert!(storage.delete_user("u1").unwrap());
        assert!(storage.find_by_user_id("u1").unwrap().is_none());
        assert_eq!(storage.count_preference_records().unwrap(), 0);
        assert!(!storage.delete_user("u1").unwrap());
    }

    #[test]
    fn test_raw_text_is_returned_verbatim() {
        let storage = storage_with_user("u1");
        storage.atomic_upsert("u1", &blob(true)).unwrap();
        storage.write_raw("u1", "garbage").unwrap();

        let record = storage.find_by_user_id("u1").unwrap().unwrap();
        assert_eq!(record.encrypted_preferences, "garbage");
    }

    #[test]
    fn test_update_failure_rolls_back() {
        let storage = storage_with_user("u1");
        let first = blob(true);
        storage.atomic_upsert("u1", &first).unwrap();

        let mut seen = None;
        let result = storage.atomic_update("u1", &mut |stored| {
            seen = stored.map(str::to_string);
            Err(PrefError::PreferenceLoadFailure)
        });

        assert!(matches!(result, Err(PrefError::PreferenceLoadFailure)));
        assert_eq!(seen, Some(first.to_string()));
        let record = storage.find_by_user_id("u1").unwrap().unwrap();
        assert_eq!(record.encrypted_preferences, first.to_string());
    }

    #[test]
    fn test_update_without_record_inserts() {
        let storage = storage_with_user("u1");
        let next = blob(false);

        let mut seen = Some("unset".to_string());
        let outcome = storage
            .atomic_update("u1", &mut |stored| {
                seen = stored.map(str::to_string);
                Ok(next.clone())
            })
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(seen, None);
        let record = storage.find_by_user_id("u1").unwrap().unwrap();
        assert_eq!(record.encrypted_preferences, next.to_string());
    }
}
