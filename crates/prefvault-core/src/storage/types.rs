//! Core domain types for preference storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event-type name to enabled flag.
///
/// Keys are caller-defined; no registry of event types is enforced.
pub type PreferenceMapping = BTreeMap<String, bool>;

/// A persisted preference record. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRecord {
    pub id: Uuid,
    pub user_id: String,
    /// Wire form of the encrypted mapping, exactly as stored.
    pub encrypted_preferences: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which branch an atomic upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A user known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Data for registering a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Option<String>,
    pub username: String,
    pub email: String,
}

impl NewUser {
    /// A new user whose id will be a generated UUID.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: email.into(),
        }
    }

    /// Use a caller-chosen id instead of a generated one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("alice", "alice@example.com");
        assert!(user.id.is_none());

        let user = user.with_id("u1");
        assert_eq!(user.id.as_deref(), Some("u1"));
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_mapping_equality_ignores_insertion_order() {
        let mut a = PreferenceMapping::new();
        a.insert("order_shipped".to_string(), false);
        a.insert("order_created".to_string(), true);

        let mut b = PreferenceMapping::new();
        b.insert("order_created".to_string(), true);
        b.insert("order_shipped".to_string(), false);

        assert_eq!(a, b);
    }

    #[test]
    fn test_upsert_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&UpsertOutcome::Inserted).unwrap();
        assert_eq!(json, "\"inserted\"");
    }
}
