//! Detection pipeline data types.

use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Label reported when the site was recognised from the whole image.
pub const FULL_IMAGE_LABEL: &str = "full-image";

const FAILURE_DESCRIPTION: &str = "No famous site detected and no relevant objects found.";
const ASSUME_DESCRIPTION: &str = "Famous site detected in full image.";
const SUCCESS_DESCRIPTION: &str = "Famous site detected from cropped object.";

/// An object located by the object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    pub tag: String,
    /// Detector confidence [0, 1]
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

impl DetectedObject {
    pub fn new(tag: impl Into<String>, confidence: f64, bounding_box: BoundingBox) -> Self {
        Self {
            tag: tag.into(),
            confidence,
            bounding_box,
        }
    }
}

/// A detected object whose region has been written to its own image file.
///
/// The file at `cropped_image_path` belongs to the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CroppedDetectedObject {
    pub label: String,
    pub confidence: f64,
    /// Original (normalized) box the crop was taken from
    pub bounding_box: BoundingBox,
    pub cropped_image_path: PathBuf,
}

impl CroppedDetectedObject {
    pub fn from_object(object: &DetectedObject, cropped_image_path: PathBuf) -> Self {
        Self {
            label: object.tag.clone(),
            confidence: object.confidence,
            bounding_box: object.bounding_box,
            cropped_image_path,
        }
    }
}

/// How much the pipeline trusts its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStatus {
    /// Corroborated by a cropped-object re-query.
    Success,
    /// No usable signal at all.
    Failure,
    /// Whole-image guess only.
    Assume,
}

impl DetectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::Success => "success",
            DetectionStatus::Failure => "failure",
            DetectionStatus::Assume => "assume",
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the site was found and what it is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteInformation {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub site_name: String,
}

/// Terminal output of the site detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub status: DetectionStatus,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_information: Option<SiteInformation>,
}

impl DetectionResult {
    /// Nothing recognisable in the image.
    pub fn failure() -> Self {
        Self {
            status: DetectionStatus::Failure,
            description: FAILURE_DESCRIPTION.to_string(),
            site_information: None,
        }
    }

    /// Whole-image guess, pinned to the image midpoint.
    pub fn assumed(site_name: impl Into<String>) -> Self {
        Self {
            status: DetectionStatus::Assume,
            description: ASSUME_DESCRIPTION.to_string(),
            site_information: Some(SiteInformation {
                label: FULL_IMAGE_LABEL.to_string(),
                x: 0.5,
                y: 0.5,
                site_name: site_name.into(),
            }),
        }
    }

    /// Site confirmed by re-classifying a cropped object.
    pub fn from_cropped(
        label: impl Into<String>,
        center: (f64, f64),
        site_name: impl Into<String>,
    ) -> Self {
        Self {
            status: DetectionStatus::Success,
            description: SUCCESS_DESCRIPTION.to_string(),
            site_information: Some(SiteInformation {
                label: label.into(),
                x: center.0,
                y: center.1,
                site_name: site_name.into(),
            }),
        }
    }

    pub fn site_name(&self) -> Option<&str> {
        self.site_information.as_ref().map(|info| info.site_name.as_str())
    }
}
