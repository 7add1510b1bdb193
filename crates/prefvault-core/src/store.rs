//! The preference store: the read and write paths over the codec and the
//! storage port.

use std::sync::Arc;

use crate::crypto::{self, EncryptedBlob, EncryptionKey};
use crate::error::{PrefError, Result};
use crate::storage::{PreferenceMapping, PreferenceStorage, UpsertOutcome, UserDirectory};

/// Attempts at an upsert before a storage conflict becomes a failure.
pub const MAX_UPSERT_ATTEMPTS: usize = 3;

/// Encrypted per-user preference store.
///
/// Holds no locks of its own. Mutual exclusion between writers for the same
/// user is the storage backend's transaction boundary.
pub struct PreferenceStore<S, U> {
    storage: S,
    users: U,
    key: Arc<EncryptionKey>,
}

impl<S: PreferenceStorage, U: UserDirectory> PreferenceStore<S, U> {
    pub fn new(storage: S, users: U, key: Arc<EncryptionKey>) -> Self {
        Self {
            storage,
            users,
            key,
        }
    }

    /// Load a user's preferences.
    ///
    /// A user with no saved preferences gets the empty mapping.
    ///
    /// # Errors
    ///
    /// Returns `PrefError::PreferenceLoadFailure` if a stored blob cannot be
    /// parsed or decrypted. The cause is logged, not returned.
    ///
    /// Returns `PrefError::Storage` if the lookup itself fails. This includes
    /// a row whose own id or timestamps are corrupt: that is a fault in the
    /// storage schema, not in the user's blob, so it is reported as
    /// unavailable rather than as a load failure.
    pub fn get(&self, user_id: &str) -> Result<PreferenceMapping> {
        let record = self.storage.find_by_user_id(user_id).map_err(|e| {
            tracing::error!(user_id, error = %e, "preference lookup failed");
            e
        })?;

        match record {
            Some(record) => self.decode_stored(user_id, &record.encrypted_preferences),
            None => {
                tracing::debug!(user_id, "no saved preferences, returning defaults");
                Ok(PreferenceMapping::new())
            }
        }
    }

    /// Replace a user's preferences.
    ///
    /// # Errors
    ///
    /// - `PrefError::UserNotFound` if the user does not exist; nothing is
    ///   encrypted or written
    /// - `PrefError::Config` if encryption cannot run with the configured key
    /// - `PrefError::Storage` if the transaction fails or conflicts persist
    ///   after [`MAX_UPSERT_ATTEMPTS`]
    ///
    /// On any error the previously stored mapping is unchanged.
    pub fn put(&self, user_id: &str, mapping: &PreferenceMapping) -> Result<UpsertOutcome> {
        if !self.users.exists(user_id)? {
            return Err(PrefError::UserNotFound(user_id.to_string()));
        }

        let blob = self.encode_for(user_id, mapping)?;
        self.retry_conflicts(user_id, || self.storage.atomic_upsert(user_id, &blob))
    }

    /// Overlay `changes` onto the stored mapping and write the result back.
    ///
    /// Keys not mentioned in `changes` keep their stored value. The read and
    /// the write happen inside one storage transaction, so concurrent
    /// overlays of different keys for the same user all survive. Returns the
    /// mapping that was written.
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceStore::put`], plus `PrefError::PreferenceLoadFailure`
    /// if the stored blob cannot be read; the record is then left untouched.
    pub fn set_flags(
        &self,
        user_id: &str,
        changes: &PreferenceMapping,
    ) -> Result<PreferenceMapping> {
        if !self.users.exists(user_id)? {
            return Err(PrefError::UserNotFound(user_id.to_string()));
        }

        let mut written = PreferenceMapping::new();
        let mut overlay = |stored: Option<&str>| -> Result<EncryptedBlob> {
            let mut mapping = match stored {
                Some(text) => self.decode_stored(user_id, text)?,
                None => PreferenceMapping::new(),
            };
            mapping.extend(changes.iter().map(|(k, v)| (k.clone(), *v)));
            let blob = self.encode_for(user_id, &mapping)?;
            written = mapping;
            Ok(blob)
        };

        self.retry_conflicts(user_id, || {
            self.storage.atomic_update(user_id, &mut overlay)
        })?;
        Ok(written)
    }

    fn decode_stored(&self, user_id: &str, stored: &str) -> Result<PreferenceMapping> {
        crypto::decode_str(stored, &self.key).map_err(|e| {
            tracing::error!(user_id, error = %e, "failed to decrypt preferences");
            PrefError::PreferenceLoadFailure
        })
    }

    fn encode_for(&self, user_id: &str, mapping: &PreferenceMapping) -> Result<EncryptedBlob> {
        crypto::encode(mapping, &self.key).map_err(|e| {
            tracing::error!(user_id, error = %e, "failed to encrypt preferences");
            e
        })
    }

    /// Run `write` until it succeeds, fails for a reason other than a
    /// conflict, or [`MAX_UPSERT_ATTEMPTS`] is used up.
    fn retry_conflicts(
        &self,
        user_id: &str,
        mut write: impl FnMut() -> Result<UpsertOutcome>,
    ) -> Result<UpsertOutcome> {
        let mut attempt = 1;
        loop {
            match write() {
                Ok(outcome) => {
                    tracing::debug!(user_id, ?outcome, attempt, "preferences saved");
                    return Ok(outcome);
                }
                Err(PrefError::Conflict(reason)) if attempt < MAX_UPSERT_ATTEMPTS => {
                    tracing::warn!(user_id, attempt, %reason, "upsert conflict, retrying");
                    attempt += 1;
                }
                Err(PrefError::Conflict(reason)) => {
                    tracing::error!(user_id, attempt, %reason, "upsert conflict not resolved");
                    return Err(PrefError::Storage(format!(
                        "Conflict not resolved after {} attempts: {}",
                        attempt, reason
                    )));
                }
                Err(e @ (PrefError::UserNotFound(_) | PrefError::PreferenceLoadFailure)) => {
                    return Err(e)
                }
                Err(e) => {
                    tracing::error!(user_id, error = %e, "failed to save preferences");
                    return Err(e);
                }
            }
        }
    }
}
