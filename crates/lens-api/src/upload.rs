//! Multipart upload handling.
//!
//! Uploads are staged as `image-{uuid}{ext}` in the upload directory for the
//! lifetime of one request and deleted when the staged file is dropped.

use std::io::Write;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

const MAX_EXTENSION_LEN: usize = 8;

/// A file read from a multipart request.
#[derive(Debug)]
pub struct Upload {
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl Upload {
    /// Lowercased `.ext` from the client file name, or empty when absent or
    /// not plain alphanumeric.
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LEN
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default()
    }
}

/// Pull the named file field out of a multipart body.
///
/// A missing or non-multipart body, a missing field, and an empty file all
/// count as "no file uploaded".
pub async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
) -> ApiResult<Upload> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Request is not a multipart upload");
        ApiError::NoFileUploaded
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        if data.is_empty() {
            return Err(ApiError::NoFileUploaded);
        }

        return Ok(Upload { file_name, data });
    }

    Err(ApiError::NoFileUploaded)
}

/// Write an upload into `upload_dir` as a self-deleting temp file.
pub async fn stage_upload(upload_dir: &Path, upload: Upload) -> ApiResult<NamedTempFile> {
    let upload_dir = upload_dir.to_path_buf();
    let prefix = format!("image-{}", Uuid::new_v4());
    let suffix = upload.extension();

    tokio::task::spawn_blocking(move || -> ApiResult<NamedTempFile> {
        std::fs::create_dir_all(&upload_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(0)
            .tempfile_in(&upload_dir)?;
        file.write_all(&upload.data)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(|e| ApiError::internal(format!("upload task failed: {}", e)))?
}
