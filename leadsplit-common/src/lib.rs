//! # Leadsplit Common Library
//!
//! Shared code for the leadsplit service crates:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Database initialization and row models
//! - API request authentication primitives
//! - Credential hashing
//! - Timestamp and id helpers

pub mod api;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
