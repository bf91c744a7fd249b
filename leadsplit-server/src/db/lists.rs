//! List store
//!
//! Persists distributed leads. Entries reference their agent by id only;
//! deleting an agent leaves its entries behind, and the lists view reports
//! them under a null agent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use leadsplit_common::db::ListEntry;
use leadsplit_common::{time, uuid_utils, Result};

/// A lead to be stored for one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListEntry {
    pub agent_id: Uuid,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
}

/// Public view of the owning agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
}

/// A stored entry with its owner, if the owner still exists
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedEntry {
    pub entry: ListEntry,
    pub agent: Option<AgentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: Uuid,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
}

/// Entries of one agent, in storage order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentGroup {
    pub agent: Option<AgentRef>,
    pub items: Vec<ListItem>,
}

/// List entry persistence backed by the `lists` table
#[derive(Debug, Clone)]
pub struct ListStore {
    pool: SqlitePool,
}

impl ListStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a single entry
    pub async fn append(&self, new: &NewListEntry) -> Result<ListEntry> {
        let entry = insert_entry(&self.pool, new, time::now()).await?;
        debug!(entry_id = %entry.id, agent_id = %entry.agent_id, "List entry stored");
        Ok(entry)
    }

    /// Store a whole batch in one transaction
    ///
    /// Either every entry is written or, on error, none is.
    pub async fn append_batch(&self, batch: &[NewListEntry]) -> Result<Vec<ListEntry>> {
        let now = time::now();
        let mut tx = self.pool.begin().await?;

        let mut stored = Vec::with_capacity(batch.len());
        for new in batch {
            stored.push(insert_entry(&mut *tx, new, now).await?);
        }

        tx.commit().await?;

        debug!(entries = stored.len(), "List batch committed");
        Ok(stored)
    }

    /// Every entry in storage order, joined with its agent
    pub async fn list_all(&self) -> Result<Vec<OwnedEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT l.*, a.name AS agent_name, a.email AS agent_email, a.mobile AS agent_mobile
            FROM lists l
            LEFT JOIN agents a ON a.id = l.agent_id
            ORDER BY l.created_at, l.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(owned_entry_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn insert_entry<'e, E>(executor: E, new: &NewListEntry, now: DateTime<Utc>) -> Result<ListEntry>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let entry = ListEntry {
        id: uuid_utils::generate(),
        agent_id: new.agent_id,
        first_name: new.first_name.clone(),
        phone: new.phone.clone(),
        notes: new.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO lists (id, agent_id, first_name, phone, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(entry.agent_id.to_string())
    .bind(&entry.first_name)
    .bind(&entry.phone)
    .bind(&entry.notes)
    .bind(time::to_db_string(&entry.created_at))
    .bind(time::to_db_string(&entry.updated_at))
    .execute(executor)
    .await?;

    Ok(entry)
}

fn owned_entry_from_row(row: &SqliteRow) -> Result<OwnedEntry> {
    let entry = ListEntry::from_row(row)?;

    let agent_name: Option<String> = row.try_get("agent_name")?;
    let agent = match agent_name {
        Some(name) => Some(AgentRef {
            id: entry.agent_id,
            name,
            email: row.try_get("agent_email")?,
            mobile: row.try_get("agent_mobile")?,
        }),
        None => None,
    };

    Ok(OwnedEntry { entry, agent })
}

/// Group entries by owner in order of first appearance
///
/// Entries whose agent is gone share a single group with `agent: None`.
pub fn group_by_agent(entries: Vec<OwnedEntry>) -> Vec<AgentGroup> {
    let mut groups: Vec<AgentGroup> = Vec::new();

    for OwnedEntry { entry, agent } in entries {
        let owner = agent.as_ref().map(|a| a.id);
        let item = ListItem {
            id: entry.id,
            first_name: entry.first_name,
            phone: entry.phone,
            notes: entry.notes,
        };

        match groups
            .iter_mut()
            .find(|g| g.agent.as_ref().map(|a| a.id) == owner)
        {
            Some(group) => group.items.push(item),
            None => groups.push(AgentGroup {
                agent,
                items: vec![item],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::agents::{AgentDirectory, NewAgent};
    use leadsplit_common::credentials::hash_password;
    use leadsplit_common::db::init_database;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, AgentDirectory, ListStore) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("test.db")).await.unwrap();
        (dir, AgentDirectory::new(pool.clone()), ListStore::new(pool))
    }

    async fn agent(directory: &AgentDirectory, name: &str) -> Uuid {
        directory
            .create(NewAgent {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                mobile: "+15550100".to_string(),
                credential: hash_password("pw").unwrap(),
            })
            .await
            .unwrap()
            .id
    }

    fn lead(agent_id: Uuid, first_name: &str) -> NewListEntry {
        NewListEntry {
            agent_id,
            first_name: first_name.to_string(),
            phone: "555".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_append_single() {
        let (_dir, directory, store) = setup().await;
        let ada = agent(&directory, "Ada").await;

        let entry = store.append(&lead(ada, "Lin")).await.unwrap();
        assert_eq!(entry.agent_id, ada);
        assert_eq!(entry.first_name, "Lin");

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].entry, entry);
        assert_eq!(all[0].agent.as_ref().unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_batch_keeps_insertion_order() {
        let (_dir, directory, store) = setup().await;
        let ada = agent(&directory, "Ada").await;
        let grace = agent(&directory, "Grace").await;

        let batch = vec![lead(ada, "a1"), lead(ada, "a2"), lead(grace, "g1"), lead(ada, "a3")];
        store.append_batch(&batch).await.unwrap();

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.entry.first_name)
            .collect();
        assert_eq!(names, vec!["a1", "a2", "g1", "a3"]);
    }

    #[tokio::test]
    async fn test_failed_batch_persists_nothing() {
        let (_dir, directory, store) = setup().await;
        let ada = agent(&directory, "Ada").await;

        // Abort the third insert of the batch
        sqlx::query("CREATE TRIGGER reject_poison BEFORE INSERT ON lists WHEN NEW.first_name = 'poison' BEGIN SELECT RAISE(ABORT, 'poisoned'); END")
            .execute(&store.pool)
            .await
            .unwrap();

        let batch = vec![lead(ada, "ok1"), lead(ada, "ok2"), lead(ada, "poison"), lead(ada, "ok3")];
        assert!(store.append_batch(&batch).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_orphans_grouped_under_null_agent() {
        let (_dir, directory, store) = setup().await;
        let ada = agent(&directory, "Ada").await;
        let grace = agent(&directory, "Grace").await;
        let lin = agent(&directory, "Lin").await;

        store
            .append_batch(&[lead(grace, "g1"), lead(ada, "a1"), lead(lin, "l1"), lead(grace, "g2")])
            .await
            .unwrap();
        directory.delete(ada).await.unwrap();
        directory.delete(lin).await.unwrap();

        let groups = group_by_agent(store.list_all().await.unwrap());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].agent.as_ref().unwrap().name, "Grace");
        assert_eq!(groups[0].items.len(), 2);
        assert!(groups[1].agent.is_none());
        let orphans: Vec<&str> = groups[1].items.iter().map(|i| i.first_name.as_str()).collect();
        assert_eq!(orphans, vec!["a1", "l1"]);
    }

    #[test]
    fn test_grouping_first_appearance_order() {
        let now = time::now();
        let owner = |name: &str| AgentRef {
            id: uuid_utils::generate(),
            name: name.to_string(),
            email: format!("{}@example.com", name),
            mobile: "1".to_string(),
        };
        let b = owner("b");
        let a = owner("a");
        let entry = |agent: &AgentRef, first_name: &str| OwnedEntry {
            entry: ListEntry {
                id: uuid_utils::generate(),
                agent_id: agent.id,
                first_name: first_name.to_string(),
                phone: "1".to_string(),
                notes: String::new(),
                created_at: now,
                updated_at: now,
            },
            agent: Some(agent.clone()),
        };

        let groups = group_by_agent(vec![entry(&b, "b1"), entry(&a, "a1"), entry(&b, "b2")]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].agent.as_ref().unwrap().name, "b");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].agent.as_ref().unwrap().name, "a");
    }

    #[test]
    fn test_group_serialization_shape() {
        let group = AgentGroup {
            agent: None,
            items: vec![ListItem {
                id: uuid_utils::generate(),
                first_name: "Lin".to_string(),
                phone: "555".to_string(),
                notes: "hot".to_string(),
            }],
        };

        let json = serde_json::to_value(&group).unwrap();
        assert!(json["agent"].is_null());
        assert_eq!(json["items"][0]["firstName"], "Lin");
        assert_eq!(json["items"][0]["notes"], "hot");
    }
}
