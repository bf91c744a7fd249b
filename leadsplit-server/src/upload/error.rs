//! Upload pipeline errors

use thiserror::Error;

use super::decoder::BatchError;
use super::distributor::DistributionError;

/// Why an upload was rejected or failed
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Only .csv, .xlsx and .xls files are allowed")]
    UnsupportedFileType { file_name: String },

    #[error("File too large (limit {limit} bytes)")]
    FileTooLarge { limit: u64 },

    /// Malformed multipart request
    #[error("Upload error: {0}")]
    Intake(String),

    #[error("Need at least {required} agents to distribute lists")]
    NotEnoughAgents { required: usize },

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("No records found in the file")]
    EmptyFile,

    #[error("Agent directory unavailable: {0}")]
    Directory(#[source] leadsplit_common::Error),

    /// The batch transaction failed; nothing was written
    #[error("Failed to save distributed lists, no entries were persisted: {0}")]
    Persist(#[source] leadsplit_common::Error),

    #[error("Failed to store uploaded file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decoder task failed: {0}")]
    Worker(String),
}

impl From<DistributionError> for UploadError {
    fn from(err: DistributionError) -> Self {
        match err {
            DistributionError::EmptyBatch => UploadError::EmptyFile,
            DistributionError::NoRecipients => UploadError::NotEnoughAgents {
                required: super::AGENTS_PER_BATCH,
            },
        }
    }
}
