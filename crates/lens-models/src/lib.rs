//! Shared data models for ExploreLens site detection.
//!
//! This crate provides Serde-serializable types for:
//! - Bounding boxes in normalized and pixel space
//! - Detected and cropped objects produced by the vision pipeline
//! - The tri-state detection result returned to clients
//! - The relevant-tag taxonomy used to filter detections

pub mod bbox;
pub mod detection;
pub mod error;
pub mod taxonomy;

// Re-export common types
pub use bbox::{BoundingBox, PixelRect};
pub use detection::{
    CroppedDetectedObject, DetectedObject, DetectionResult, DetectionStatus, SiteInformation,
    FULL_IMAGE_LABEL,
};
pub use error::{ModelError, ModelResult};
pub use taxonomy::RelevantTags;
