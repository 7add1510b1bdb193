//! In-memory storage backend.
//!
//! Holds users and preference records in process memory. Each operation
//! takes the single state lock once, so the existence check and the write of
//! an upsert are one atomic step.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::crypto::EncryptedBlob;
use crate::error::{PrefError, Result};
use crate::storage::traits::{PreferenceStorage, UserDirectory};
use crate::storage::types::{PreferenceRecord, UpsertOutcome};

#[derive(Default)]
struct State {
    users: HashSet<String>,
    records: HashMap<String, PreferenceRecord>,
}

/// Process-local user directory and preference storage.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| PrefError::Storage("memory storage poisoned".to_string()))
    }

    /// Register a user id.
    pub fn add_user(&self, user_id: impl Into<String>) -> Result<()> {
        self.lock_state()?.users.insert(user_id.into());
        Ok(())
    }

    /// Remove a user and, like the SQL cascade, their preference record.
    pub fn remove_user(&self, user_id: &str) -> Result<bool> {
        let mut state = self.lock_state()?;
        state.records.remove(user_id);
        Ok(state.users.remove(user_id))
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.lock_state()?.records.len())
    }
}

impl UserDirectory for MemoryStorage {
    fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.lock_state()?.users.contains(user_id))
    }
}

impl PreferenceStorage for MemoryStorage {
    fn find_by_user_id(&self, user_id: &str) -> Result<Option<PreferenceRecord>> {
        Ok(self.lock_state()?.records.get(user_id).cloned())
    }

    fn atomic_upsert(&self, user_id: &str, blob: &EncryptedBlob) -> Result<UpsertOutcome> {
        self.atomic_update(user_id, &mut |_| Ok(blob.clone()))
    }

    fn atomic_update(
        &self,
        user_id: &str,
        update: &mut dyn FnMut(Option<&str>) -> Result<EncryptedBlob>,
    ) -> Result<UpsertOutcome> {
        let mut state = self.lock_state()?;
        if !state.users.contains(user_id) {
            return Err(PrefError::UserNotFound(user_id.to_string()));
        }

        let stored = state
            .records
            .get(user_id)
            .map(|record| record.encrypted_preferences.as_str());
        let encrypted = update(stored)?.to_string();

        let now = Utc::now();
        match state.records.get_mut(user_id) {
            Some(record) => {
                record.encrypted_preferences = encrypted;
                record.updated_at = now;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                state.records.insert(
                    user_id.to_string(),
                    PreferenceRecord {
                        id: Uuid::new_v4(),
                        user_id: user_id.to_string(),
                        encrypted_preferences: encrypted,
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}
