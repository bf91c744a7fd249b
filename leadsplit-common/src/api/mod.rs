//! Shared HTTP API functionality
//!
//! Holds framework-independent pieces: request authentication primitives
//! and the wire types shared by every endpoint. The axum wrappers live in
//! the server crate.

pub mod auth;
pub mod types;

pub use auth::{
    calculate_hash, calculate_query_hash, initialize_shared_secret, load_shared_secret,
    validate_hash, validate_timestamp, ApiAuthError,
};
pub use types::{AuthQuery, ErrorBody, ErrorResponse};
