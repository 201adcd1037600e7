//! Site detection handlers.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use lens_models::DetectionResult;

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;
use crate::upload::{read_file_field, stage_upload, IMAGE_FIELD};

/// Upload a photo and identify the famous site in it.
///
/// Every terminal pipeline state is a 200; only a missing upload is a 400.
pub async fn detect_site(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DetectionResult>> {
    let upload = read_file_field(multipart, IMAGE_FIELD).await?;
    metrics::record_upload("detect_site", upload.data.len());

    let staged = stage_upload(&state.config.upload_dir, upload).await?;
    info!(path = %staged.path().display(), "Image uploaded");

    let result = state
        .detector
        .detect_site_within(staged.path(), state.config.detection_budget())
        .await;

    // Dropping the staged file removes the upload
    drop(staged);

    Ok(Json(result))
}

/// Canned upload response used by clients during development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockUploadResponse {
    pub message: String,
    pub objects: Vec<DetectionResult>,
}

impl MockUploadResponse {
    pub fn sample() -> Self {
        Self {
            message: "Image uploaded successfully".to_string(),
            objects: vec![DetectionResult::from_cropped(
                "tower",
                (350.0, 300.0),
                "Eiffel Tower",
            )],
        }
    }
}

/// Accept an upload and return the fixed sample payload.
pub async fn mock_data(
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<MockUploadResponse>> {
    let upload = read_file_field(multipart, IMAGE_FIELD).await?;
    metrics::record_upload("mock_data", upload.data.len());

    Ok(Json(MockUploadResponse::sample()))
}
