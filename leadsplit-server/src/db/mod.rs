//! Database access for the server
//!
//! Schema creation lives in `leadsplit_common::db`; these repositories own
//! the queries.

pub mod agents;
pub mod lists;

pub use agents::{AgentDirectory, AgentUpdate, NewAgent};
pub use lists::{group_by_agent, AgentGroup, AgentRef, ListItem, ListStore, NewListEntry, OwnedEntry};

/// True when a sqlx error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
