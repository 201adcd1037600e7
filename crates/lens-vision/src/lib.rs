//! Landmark detection pipeline.
//!
//! This crate provides:
//! - Collaborator traits for the landmark classifier and object detector
//! - An Eden AI client implementing both collaborators
//! - Relevance filtering and "central and largest" ranking of detections
//! - Bounding-box cropping of the source image
//! - The `SiteDetector` orchestrator that turns all of the above into a
//!   `DetectionResult`

pub mod cropper;
pub mod eden_ai;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod ranker;

pub use cropper::crop_objects_from_image;
pub use eden_ai::{EdenAiClient, EdenAiConfig};
pub use error::{VisionError, VisionResult};
pub use filter::filter_relevant;
pub use pipeline::{CropPolicy, DetectorConfig, SiteDetector};
pub use providers::{LandmarkClassifier, ObjectDetector};
pub use ranker::{priority_score, rank_objects, select_primary};
