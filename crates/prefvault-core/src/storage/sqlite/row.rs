//! Raw row types for database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{PrefError, Result};
use crate::storage::types::{PreferenceRecord, User};

/// Raw row data from the notification_preferences table.
#[derive(Debug)]
pub struct PreferenceRow {
    pub id: String,
    pub user_id: String,
    pub encrypted_preferences: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PreferenceRow {
    pub const COLUMNS: &'static str =
        "id, user_id, encrypted_preferences, created_at, updated_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            encrypted_preferences: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl TryFrom<PreferenceRow> for PreferenceRecord {
    type Error = PrefError;

    fn try_from(row: PreferenceRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| PrefError::Storage(format!("Invalid preference UUID: {}", e)))?;

        Ok(PreferenceRecord {
            id,
            user_id: row.user_id,
            encrypted_preferences: row.encrypted_preferences,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Raw row data from the users table.
#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl UserRow {
    pub const COLUMNS: &'static str = "id, username, email, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = PrefError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            username: row.username,
            email: row.email,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PrefError::Storage(format!("Invalid timestamp: {}", e)))
}
