//! Health check handlers.

use std::path::PathBuf;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub upload_dir: CheckStatus,
    pub scratch_dir: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(latency_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Both working directories must accept new files.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let upload_dir = check_writable(state.config.upload_dir.clone()).await;
    let scratch_dir = check_writable(state.detector.config().scratch_dir.clone()).await;

    let all_ok = upload_dir.is_ok() && scratch_dir.is_ok();
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            upload_dir,
            scratch_dir,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Create the directory if needed and write a throwaway probe file in it.
async fn check_writable(dir: PathBuf) -> CheckStatus {
    let start = Instant::now();
    let probe = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        std::fs::create_dir_all(&dir)?;
        tempfile::Builder::new()
            .prefix(".ready-")
            .tempfile_in(&dir)
            .map(drop)
    })
    .await;

    match probe {
        Ok(Ok(())) => CheckStatus::ok(start.elapsed().as_millis() as u64),
        Ok(Err(e)) => CheckStatus::error(e.to_string()),
        Err(e) => CheckStatus::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_writable_creates_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("uploads");

        let status = check_writable(target.clone()).await;
        assert!(status.is_ok());
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_check_writable_reports_errors() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let status = check_writable(file).await;
        assert_eq!(status.status, "error");
        assert!(status.error.is_some());
    }
}
