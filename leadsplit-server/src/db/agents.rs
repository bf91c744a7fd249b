//! Agent directory
//!
//! Agents are listed in creation order, ties broken by id. The first five in
//! that order are the recipients of every upload.

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use leadsplit_common::db::Agent;
use leadsplit_common::{time, uuid_utils, Error, Result};

use super::is_unique_violation;

const DUPLICATE_EMAIL: &str = "Agent with this email already exists";
const NOT_FOUND: &str = "Agent not found";

/// Fields for a new agent
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    pub mobile: String,
    /// PHC-format password hash
    pub credential: String,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub credential: Option<String>,
}

/// Agent persistence backed by the `agents` table
#[derive(Debug, Clone)]
pub struct AgentDirectory {
    pool: SqlitePool,
}

impl AgentDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new agent, rejecting a duplicate email with `Error::Conflict`
    pub async fn create(&self, new: NewAgent) -> Result<Agent> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(Error::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let now = time::now();
        let agent = Agent {
            id: uuid_utils::generate(),
            name: new.name,
            email: new.email,
            mobile: new.mobile,
            password_hash: new.credential,
            created_at: now,
            updated_at: now,
        };

        // The pre-check can race with a concurrent create; the UNIQUE index decides
        sqlx::query(
            r#"
            INSERT INTO agents (id, name, email, mobile, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.email)
        .bind(&agent.mobile)
        .bind(&agent.password_hash)
        .bind(time::to_db_string(&agent.created_at))
        .bind(time::to_db_string(&agent.updated_at))
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique)?;

        info!(agent_id = %agent.id, email = %agent.email, "Agent created");
        Ok(agent)
    }

    /// All agents in creation order
    pub async fn list(&self) -> Result<Vec<Agent>> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Agent::from_row).collect()
    }

    /// The `limit` earliest-created agents
    pub async fn earliest(&self, limit: usize) -> Result<Vec<Agent>> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY created_at, id LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Agent::from_row).collect()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Agent::from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM agents WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Agent::from_row).transpose()
    }

    /// Apply a partial update
    ///
    /// Unknown id gives `Error::NotFound`; taking another agent's email gives
    /// `Error::Conflict`.
    pub async fn update(&self, id: Uuid, update: AgentUpdate) -> Result<Agent> {
        let mut agent = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;

        if let Some(email) = update.email {
            if email != agent.email {
                if let Some(holder) = self.find_by_email(&email).await? {
                    if holder.id != id {
                        return Err(Error::Conflict(DUPLICATE_EMAIL.to_string()));
                    }
                }
            }
            agent.email = email;
        }
        if let Some(name) = update.name {
            agent.name = name;
        }
        if let Some(mobile) = update.mobile {
            agent.mobile = mobile;
        }
        if let Some(credential) = update.credential {
            agent.password_hash = credential;
        }
        agent.updated_at = time::now();

        let result = sqlx::query(
            r#"
            UPDATE agents
            SET name = ?, email = ?, mobile = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&agent.name)
        .bind(&agent.email)
        .bind(&agent.mobile)
        .bind(&agent.password_hash)
        .bind(time::to_db_string(&agent.updated_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(NOT_FOUND.to_string()));
        }

        debug!(agent_id = %id, "Agent updated");
        Ok(agent)
    }

    /// Remove an agent. Their list entries are left in place.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(NOT_FOUND.to_string()));
        }

        info!(agent_id = %id, "Agent deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn conflict_on_unique(err: sqlx::Error) -> Error {
    if is_unique_violation(&err) {
        Error::Conflict(DUPLICATE_EMAIL.to_string())
    } else {
        Error::Database(err)
    }
}
