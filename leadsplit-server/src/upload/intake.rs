//! Upload intake
//!
//! Accepts the multipart `file` field, checks the extension before any byte
//! is written, and streams the content to the uploads folder under the size
//! ceiling. The stored file is owned by a [`StoredUpload`] guard that deletes
//! it when dropped, so no exit path can leave it behind.

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::decoder::{FileFormat, ALLOWED_EXTENSIONS};
use super::error::UploadError;
use leadsplit_common::time::now_millis;

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// Where uploads are staged and how large they may be
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub uploads_dir: PathBuf,
    pub max_bytes: u64,
}

/// A staged upload on disk, removed on drop
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    format: FileFormat,
    original_name: String,
    size: u64,
    removed: bool,
}

impl StoredUpload {
    /// Take ownership of a file already in the uploads folder
    pub fn adopt(path: PathBuf, format: FileFormat, original_name: impl Into<String>) -> Self {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            path,
            format,
            original_name: original_name.into(),
            size,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the staged file now
    pub fn discard(mut self) {
        self.remove_file();
    }

    fn remove_file(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove staged upload"),
        }
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        self.remove_file();
    }
}

/// Validate the client file name, returning its format and lower-case extension
pub fn check_file_name(file_name: &str) -> Result<(FileFormat, String), UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match FileFormat::from_extension(&extension) {
        Some(format) if ALLOWED_EXTENSIONS.contains(&extension.as_str()) => Ok((format, extension)),
        _ => Err(UploadError::UnsupportedFileType {
            file_name: file_name.to_string(),
        }),
    }
}

/// Stream a multipart file field into the uploads folder
pub async fn store_field(
    mut field: Field<'_>,
    settings: &UploadSettings,
) -> Result<StoredUpload, UploadError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let (format, extension) = check_file_name(&original_name)?;

    let staged_name = format!(
        "{}-{}.{}",
        now_millis(),
        rand::thread_rng().gen_range(0..1_000_000_000u32),
        extension
    );

    let mut upload = StoredUpload {
        path: settings.uploads_dir.join(staged_name),
        format,
        original_name,
        size: 0,
        removed: false,
    };

    let mut file = tokio::fs::File::create(&upload.path).await?;

    while let Some(chunk) = field.chunk().await.map_err(|e| intake_error(e, settings.max_bytes))? {
        upload.size += chunk.len() as u64;
        if upload.size > settings.max_bytes {
            return Err(UploadError::FileTooLarge {
                limit: settings.max_bytes,
            });
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    debug!(
        path = %upload.path.display(),
        original = %upload.original_name,
        bytes = upload.size,
        "Staged upload"
    );

    Ok(upload)
}

/// Body-limit rejections surface as multipart errors with a 413 status
pub fn intake_error(err: MultipartError, limit: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge { limit }
    } else {
        UploadError::Intake(err.body_text())
    }
}
