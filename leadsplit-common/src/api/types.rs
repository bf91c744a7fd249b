//! Shared API request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication parameters carried in the query string
///
/// Used by requests without a JSON body: GET, DELETE and multipart uploads.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Error envelope returned by every failing endpoint
///
/// ```
/// use leadsplit_common::api::types::ErrorResponse;
///
/// let body = ErrorResponse::new("NOT_FOUND", "Agent not found");
/// let json = serde_json::to_value(&body).unwrap();
/// assert_eq!(json["error"]["code"], "NOT_FOUND");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(code: impl Into<String>, message: impl Into<String>, details: Value) -> Self {
        let mut response = Self::new(code, message);
        response.error.details = Some(details);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_query_deserialization() {
        let json = r#"{"timestamp": 1730000000000, "hash": "abc123"}"#;
        let query: AuthQuery = serde_json::from_str(json).unwrap();

        assert_eq!(query.timestamp, 1730000000000);
        assert_eq!(query.hash, "abc123");
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let json = serde_json::to_string(&ErrorResponse::new("BAD_REQUEST", "nope")).unwrap();
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_error_response_with_details() {
        let details = serde_json::json!({"server_time": 1730000001500i64});
        let error = ErrorResponse::with_details("timestamp_invalid", "Timestamp too old", details);

        assert_eq!(error.error.code, "timestamp_invalid");
        assert!(error.error.details.is_some());
    }
}
