//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::{time, uuid_utils, Error, Result};

/// A recipient of distributed lead lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Build from a `SELECT * FROM agents` row
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(row.try_get("id")?)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            mobile: row.try_get("mobile")?,
            password_hash: row.try_get("password_hash")?,
            created_at: time::from_db_string(row.try_get("created_at")?)?,
            updated_at: time::from_db_string(row.try_get("updated_at")?)?,
        })
    }
}

/// A persisted lead assigned to one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListEntry {
    /// Build from a `SELECT * FROM lists` row
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(row.try_get("id")?)?,
            agent_id: parse_id(row.try_get("agent_id")?)?,
            first_name: row.try_get("first_name")?,
            phone: row.try_get("phone")?,
            notes: row.try_get("notes")?,
            created_at: time::from_db_string(row.try_get("created_at")?)?,
            updated_at: time::from_db_string(row.try_get("updated_at")?)?,
        })
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    uuid_utils::parse(raw).map_err(|e| Error::Internal(format!("Invalid id '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_serialization_hides_credentials() {
        let now = time::now();
        let agent = Agent {
            id: uuid_utils::generate(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            mobile: "+15550100".to_string(),
            password_hash: "$argon2id$secret-hash".to_string(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&agent).unwrap();
        assert_eq!(json["name"], "Ada");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }
}
