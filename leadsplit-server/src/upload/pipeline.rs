//! Upload orchestration
//!
//! Drives one staged upload through
//! `Received → Validated → Decoded → Normalized → Distributed → Persisted → Acknowledged`.
//! Any failure before `Persisted` ends in `Rejected`. The staged file is
//! removed as soon as decoding finishes and, through its guard, on every
//! early exit.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::decoder::decode_batch;
use super::distributor::distribute;
use super::error::UploadError;
use super::intake::StoredUpload;
use super::AGENTS_PER_BATCH;
use crate::db::{AgentDirectory, ListStore, NewListEntry};

pub const SUCCESS_MESSAGE: &str = "File processed and distributed successfully";

/// Upload workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStage {
    /// File staged on disk
    Received,
    /// Enough agents exist; recipients selected
    Validated,
    Decoded,
    /// Every row mapped to a canonical record
    Normalized,
    Distributed,
    /// Batch committed to the list store
    Persisted,
    Acknowledged,
    Rejected,
}

/// Stage tracking for one upload
#[derive(Debug)]
pub struct UploadSession {
    pub upload_id: Uuid,
    pub file_name: String,
    stage: UploadStage,
}

impl UploadSession {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            upload_id: Uuid::new_v4(),
            file_name: file_name.into(),
            stage: UploadStage::Received,
        }
    }

    pub fn advance(&mut self, next: UploadStage) {
        debug!(
            upload_id = %self.upload_id,
            from = ?self.stage,
            to = ?next,
            "Upload stage transition"
        );
        self.stage = next;
    }

    /// Record a rejection at the current stage
    pub fn reject(&mut self, err: &UploadError) {
        warn!(
            upload_id = %self.upload_id,
            file = %self.file_name,
            stage = ?self.stage,
            error = %err,
            "Upload rejected"
        );
        self.stage = UploadStage::Rejected;
    }
}

/// Per-agent line of the upload summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentShare {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub count: usize,
}

/// Response for a completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub message: String,
    pub total_records: usize,
    pub distributed_to: Vec<AgentShare>,
}

/// Upload pipeline with its collaborators injected
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    directory: AgentDirectory,
    lists: ListStore,
}

impl UploadPipeline {
    pub fn new(directory: AgentDirectory, lists: ListStore) -> Self {
        Self { directory, lists }
    }

    /// Process a staged upload to completion or rejection
    pub async fn run(&self, upload: StoredUpload) -> Result<UploadSummary, UploadError> {
        let mut session = UploadSession::new(upload.original_name());

        match self.process(&mut session, upload).await {
            Ok(summary) => {
                session.advance(UploadStage::Acknowledged);
                Ok(summary)
            }
            Err(e) => {
                session.reject(&e);
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        session: &mut UploadSession,
        upload: StoredUpload,
    ) -> Result<UploadSummary, UploadError> {
        let agents = self
            .directory
            .earliest(AGENTS_PER_BATCH)
            .await
            .map_err(UploadError::Directory)?;

        if agents.len() < AGENTS_PER_BATCH {
            debug!(available = agents.len(), "Too few agents for distribution");
            return Err(UploadError::NotEnoughAgents {
                required: AGENTS_PER_BATCH,
            });
        }
        session.advance(UploadStage::Validated);

        let path = upload.path().to_path_buf();
        let format = upload.format();
        let bytes = upload.size();
        let decoded = tokio::task::spawn_blocking(move || decode_batch(&path, format)).await;

        upload.discard();

        let records = decoded.map_err(|e| UploadError::Worker(e.to_string()))??;
        session.advance(UploadStage::Decoded);
        session.advance(UploadStage::Normalized);

        let total_records = records.len();
        let assignments = distribute(records, agents)?;
        session.advance(UploadStage::Distributed);

        let mut distributed_to = Vec::with_capacity(assignments.len());
        let mut batch = Vec::with_capacity(total_records);

        for assignment in assignments {
            let agent = assignment.recipient;
            distributed_to.push(AgentShare {
                agent_id: agent.id,
                agent_name: agent.name.clone(),
                count: assignment.items.len(),
            });
            batch.extend(assignment.items.into_iter().map(|record| NewListEntry {
                agent_id: agent.id,
                first_name: record.first_name,
                phone: record.phone,
                notes: record.notes,
            }));
        }

        self.lists
            .append_batch(&batch)
            .await
            .map_err(UploadError::Persist)?;
        session.advance(UploadStage::Persisted);

        info!(
            upload_id = %session.upload_id,
            file = %session.file_name,
            bytes,
            records = total_records,
            "Upload distributed"
        );

        Ok(UploadSummary {
            message: SUCCESS_MESSAGE.to_string(),
            total_records,
            distributed_to,
        })
    }
}
