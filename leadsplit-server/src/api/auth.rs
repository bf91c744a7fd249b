//! Authentication middleware
//!
//! JSON requests carry `timestamp` and `hash` in the body. Everything else
//! (GET, DELETE, multipart uploads) carries them in the query string, hashed
//! over `{"timestamp": t, "hash": h}`.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use leadsplit_common::api::{validate_hash, validate_timestamp, ApiAuthError, ErrorResponse};

use crate::AppState;

/// Largest JSON body buffered for hash validation
const MAX_JSON_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
struct AuthFields {
    timestamp: Option<i64>,
    hash: Option<String>,
}

/// Validate timestamp and hash on protected routes
///
/// A shared secret of 0 disables checking.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let request = if is_json(&request) {
        validate_body_auth(request, state.shared_secret).await?
    } else {
        validate_query_auth(&request, state.shared_secret)?;
        request
    };

    Ok(next.run(request).await)
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}

fn validate_query_auth(request: &Request, shared_secret: i64) -> Result<(), AuthError> {
    let query = request.uri().query().unwrap_or("");
    let fields = parse_query_fields(query);

    let timestamp = fields.timestamp.ok_or(AuthError::MissingTimestamp)?;
    let hash = fields.hash.ok_or(AuthError::MissingHash)?;

    let value = json!({
        "timestamp": timestamp,
        "hash": &hash,
    });

    check(timestamp, &hash, &value, shared_secret)
}

async fn validate_body_auth(request: Request, shared_secret: i64) -> Result<Request, AuthError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_JSON_BODY_BYTES)
        .await
        .map_err(|e| AuthError::InvalidBody(format!("Failed to read body: {}", e)))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidBody(format!("Invalid JSON: {}", e)))?;

    let fields: AuthFields = serde_json::from_value(value.clone()).unwrap_or_default();
    let timestamp = fields.timestamp.ok_or(AuthError::MissingTimestamp)?;
    let hash = fields.hash.ok_or(AuthError::MissingHash)?;

    check(timestamp, &hash, &value, shared_secret)?;

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

fn check(timestamp: i64, hash: &str, value: &Value, shared_secret: i64) -> Result<(), AuthError> {
    validate_timestamp(timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        other => AuthError::Other(other.to_string()),
    })?;

    validate_hash(hash, value, shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash { provided, calculated } => {
            warn!(provided = %provided, calculated = %calculated, "Hash validation failed");
            AuthError::InvalidHash
        }
        other => AuthError::Other(other.to_string()),
    })?;

    debug!("Request authenticated");
    Ok(())
}

/// Pull `timestamp` and `hash` out of a raw query string
fn parse_query_fields(query: &str) -> AuthFields {
    let mut fields = AuthFields::default();

    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            match key {
                "timestamp" => fields.timestamp = value.parse::<i64>().ok(),
                "hash" => fields.hash = Some(value.to_string()),
                _ => {}
            }
        }
    }

    fields
}

/// Authentication failures as HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingTimestamp,
    MissingHash,
    InvalidBody(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::InvalidTimestamp(reason) => (
                StatusCode::UNAUTHORIZED,
                "timestamp_invalid",
                format!("Invalid timestamp: {}", reason),
            ),
            AuthError::InvalidHash => (
                StatusCode::UNAUTHORIZED,
                "hash_invalid",
                "Invalid hash".to_string(),
            ),
            AuthError::MissingTimestamp => (
                StatusCode::BAD_REQUEST,
                "missing_timestamp",
                "Field 'timestamp' is required".to_string(),
            ),
            AuthError::MissingHash => (
                StatusCode::BAD_REQUEST,
                "missing_hash",
                "Field 'hash' is required".to_string(),
            ),
            AuthError::InvalidBody(msg) => (StatusCode::BAD_REQUEST, "invalid_body", msg),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_error",
                format!("Authentication error: {}", msg),
            ),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
