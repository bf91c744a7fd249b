//! HTTP API handlers for leadsplit-server

pub mod agents;
pub mod auth;
pub mod health;
pub mod upload;

pub use agents::{create_agent, delete_agent, list_agents, update_agent};
pub use auth::auth_middleware;
pub use health::health_routes;
pub use upload::{list_uploaded, upload_leads};
