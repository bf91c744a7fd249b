//! Upload endpoints
//!
//! POST /upload (multipart field `file`), GET /upload/lists

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::db::{group_by_agent, AgentGroup};
use crate::error::ApiResult;
use crate::upload::intake::{intake_error, store_field, FILE_FIELD};
use crate::upload::{StoredUpload, UploadError, UploadSettings, UploadSummary};
use crate::AppState;

/// POST /upload
///
/// 201 with the distribution summary once every entry is stored.
pub async fn upload_leads(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<UploadSummary>)> {
    let upload = match multipart {
        Ok(mut multipart) => receive_file(&mut multipart, &state.uploads).await,
        Err(_) => Err(UploadError::MissingFile),
    }
    .map_err(|e| {
        warn!(stage = "received", error = %e, "Upload rejected at intake");
        e
    })?;

    let summary = state.pipeline.run(upload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /upload/lists
pub async fn list_uploaded(State(state): State<AppState>) -> ApiResult<Json<Vec<AgentGroup>>> {
    let entries = state.lists.list_all().await?;
    Ok(Json(group_by_agent(entries)))
}

/// Stage the first `file` field; other fields are skipped
async fn receive_file(
    multipart: &mut Multipart,
    settings: &UploadSettings,
) -> Result<StoredUpload, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| intake_error(e, settings.max_bytes))?
    {
        if field.name() == Some(FILE_FIELD) {
            return store_field(field, settings).await;
        }
    }

    Err(UploadError::MissingFile)
}
