//! HTTP error type for leadsplit-server
//!
//! Every failure maps to one class: validation and precondition failures
//! and email conflicts are client errors (400), unknown agents are 404,
//! storage and unexpected failures are 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadsplit_common::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

use crate::upload::UploadError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// Request is well formed but cannot be served in the current state (400)
    #[error("{0}")]
    Precondition(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Duplicate agent email (400)
    #[error("{0}")]
    Conflict(String),

    /// Persistence failure (500)
    #[error("{0}")]
    Storage(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Precondition(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Precondition(_) => "PRECONDITION_FAILED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "Request failed: {}", self);
        }

        let body = Json(ErrorResponse::new(self.code(), self.to_string()));
        (status, body).into_response()
    }
}

impl From<leadsplit_common::Error> for ApiError {
    fn from(err: leadsplit_common::Error) -> Self {
        use leadsplit_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::Validation(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Database(e) => ApiError::Storage(format!("Database error: {}", e)),
            Error::Io(e) => ApiError::Storage(format!("IO error: {}", e)),
            Error::Config(msg) | Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();

        match err {
            UploadError::MissingFile
            | UploadError::UnsupportedFileType { .. }
            | UploadError::FileTooLarge { .. }
            | UploadError::Intake(_)
            | UploadError::Batch(_) => ApiError::Validation(message),
            UploadError::NotEnoughAgents { .. } | UploadError::EmptyFile => {
                ApiError::Precondition(message)
            }
            UploadError::Directory(_) | UploadError::Persist(_) | UploadError::Io(_) => {
                ApiError::Storage(message)
            }
            UploadError::Worker(_) => ApiError::Internal(message),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
