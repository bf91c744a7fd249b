//! Lead upload pipeline
//!
//! intake → decoder → normalizer → distributor → list store, coordinated by
//! [`pipeline::UploadPipeline`].

pub mod decoder;
pub mod distributor;
pub mod error;
pub mod intake;
pub mod normalizer;
pub mod pipeline;

pub use error::UploadError;
pub use intake::{StoredUpload, UploadSettings};
pub use pipeline::{AgentShare, UploadPipeline, UploadSummary};

/// Number of agents each upload is split across
pub const AGENTS_PER_BATCH: usize = 5;
