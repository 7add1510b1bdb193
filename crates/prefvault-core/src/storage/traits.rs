//! Storage port definitions.
//!
//! The preference store reaches persistence only through these two traits,
//! so a SQLite database and an in-memory fake are interchangeable.

use std::sync::Arc;

use super::types::{PreferenceRecord, UpsertOutcome};
use crate::crypto::EncryptedBlob;
use crate::error::Result;

/// User existence check.
pub trait UserDirectory: Send + Sync {
    /// Whether `user_id` references an existing user.
    fn exists(&self, user_id: &str) -> Result<bool>;
}

/// Keyed storage for preference records.
///
/// All implementations must ensure:
/// - At most one record exists per user id
/// - `atomic_upsert` decides insert vs. update inside the same atomic unit
///   as the write
/// - A reader never observes a partially written blob
pub trait PreferenceStorage: Send + Sync {
    /// Look up the record for a user.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(record))` if found, `Ok(None)` if not found.
    fn find_by_user_id(&self, user_id: &str) -> Result<Option<PreferenceRecord>>;

    /// Create the record for `user_id` or overwrite its blob, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `PrefError::Conflict` if a uniqueness race could not be
    /// resolved inside the transaction; the caller may retry.
    ///
    /// Returns `PrefError::Storage` for any other persistence failure. In
    /// every error case nothing was written.
    fn atomic_upsert(&self, user_id: &str, blob: &EncryptedBlob) -> Result<UpsertOutcome>;

    /// Rewrite the record for `user_id` from its current stored text.
    ///
    /// `update` receives the stored wire form (`None` if there is no record)
    /// and returns the blob to write. The read, the call to `update` and the
    /// write happen under one write lock, so no other writer for the same
    /// user can commit in between.
    ///
    /// # Errors
    ///
    /// An error from `update` is returned as is and nothing is written.
    /// Otherwise the same contract as [`PreferenceStorage::atomic_upsert`].
    fn atomic_update(
        &self,
        user_id: &str,
        update: &mut dyn FnMut(Option<&str>) -> Result<EncryptedBlob>,
    ) -> Result<UpsertOutcome>;
}

impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    fn exists(&self, user_id: &str) -> Result<bool> {
        (**self).exists(user_id)
    }
}

impl<T: PreferenceStorage + ?Sized> PreferenceStorage for Arc<T> {
    fn find_by_user_id(&self, user_id: &str) -> Result<Option<PreferenceRecord>> {
        (**self).find_by_user_id(user_id)
    }

    fn atomic_upsert(&self, user_id: &str, blob: &EncryptedBlob) -> Result<UpsertOutcome> {
        (**self).atomic_upsert(user_id, blob)
    }

    fn atomic_update(
        &self,
        user_id: &str,
        update: &mut dyn FnMut(Option<&str>) -> Result<EncryptedBlob>,
    ) -> Result<UpsertOutcome> {
        (**self).atomic_update(user_id, update)
    }
}
