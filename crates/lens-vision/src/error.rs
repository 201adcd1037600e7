//! Error types for the vision pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors raised inside the vision crate.
///
/// None of these escape `SiteDetector::detect_site`; they are logged and
/// turned into the next-best `DetectionResult`.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Invalid image {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    #[error("Failed to crop \"{label}\": {reason}")]
    CropExtraction { label: String, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Vision service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] lens_models::ModelError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    pub fn invalid_image(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn crop_extraction(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CropExtraction {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map a non-success HTTP status from a vision service.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            429 | 500..=599 => {
                Self::ServiceUnavailable(format!("service returned {}: {}", status, body))
            }
            _ => Self::RequestFailed(format!("service returned {}: {}", status, body)),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            VisionError::ServiceUnavailable(_) | VisionError::Timeout(_) => true,
            VisionError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            VisionError::from_http_status(503, "down"),
            VisionError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            VisionError::from_http_status(429, "slow down"),
            VisionError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            VisionError::from_http_status(401, "bad key"),
            VisionError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(VisionError::from_http_status(502, "").is_retryable());
        assert!(VisionError::Timeout(5).is_retryable());
        assert!(!VisionError::from_http_status(400, "").is_retryable());
        assert!(!VisionError::invalid_image(Path::new("a.jpg"), "empty").is_retryable());
    }
}
