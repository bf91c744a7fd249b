//! Agent directory endpoints
//!
//! POST /agents, GET /agents, PUT /agents/:id, DELETE /agents/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use leadsplit_common::credentials::hash_password;
use leadsplit_common::db::Agent;

use crate::db::{AgentUpdate, NewAgent};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const AGENT_NOT_FOUND: &str = "Agent not found";

/// POST /agents request. Auth fields may ride along and are ignored here.
#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
}

/// PUT /agents/:id request; absent or blank fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub message: String,
    pub agent: Agent,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /agents
pub async fn create_agent(
    State(state): State<AppState>,
    Json(request): Json<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<AgentResponse>)> {
    let (Some(name), Some(email), Some(mobile), Some(password)) = (
        non_blank(request.name),
        non_blank(request.email),
        non_blank(request.mobile),
        request.password.filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(ApiError::Validation("All fields are required".to_string()));
    };

    let agent = state
        .directory
        .create(NewAgent {
            name,
            email,
            mobile,
            credential: hash_password(&password)?,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AgentResponse {
            message: "Agent created successfully".to_string(),
            agent,
        }),
    ))
}

/// GET /agents
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Vec<Agent>>> {
    Ok(Json(state.directory.list().await?))
}

/// PUT /agents/:id
pub async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAgentRequest>,
) -> ApiResult<Json<AgentResponse>> {
    let id = parse_agent_id(&id)?;

    let credential = match request.password.filter(|p| !p.trim().is_empty()) {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };

    let update = AgentUpdate {
        name: non_blank(request.name),
        email: non_blank(request.email),
        mobile: non_blank(request.mobile),
        credential,
    };

    let agent = state.directory.update(id, update).await?;

    Ok(Json(AgentResponse {
        message: "Agent updated successfully".to_string(),
        agent,
    }))
}

/// DELETE /agents/:id
///
/// The agent's list entries stay in the store.
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_agent_id(&id)?;
    state.directory.delete(id).await?;

    info!(agent_id = %id, "Agent removed via API");
    Ok(Json(MessageResponse {
        message: "Agent deleted successfully".to_string(),
    }))
}

/// An id that is not a UUID cannot name an agent
fn parse_agent_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(AGENT_NOT_FOUND.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
