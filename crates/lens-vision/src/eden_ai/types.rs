//! Eden AI response types.
//!
//! Responses are keyed by provider name, e.g. `{"google": {...}}`, so the
//! client deserializes the outer object as a map and picks its provider.

use serde::Deserialize;

use lens_models::{BoundingBox, DetectedObject};

/// Tag used when the provider omits a label.
pub const UNKNOWN_TAG: &str = "Unknown";

/// Per-provider landmark detection payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkProviderResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<LandmarkItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkItem {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl LandmarkProviderResult {
    /// The provider's best guess (first item).
    pub fn best_description(&self) -> Option<String> {
        self.items
            .first()
            .and_then(|item| item.description.clone())
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    }
}

/// Per-provider object detection payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectProviderResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<ObjectItem>,
}

/// One detected object; coordinates are normalized corners.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectItem {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub x_min: Option<f64>,
    #[serde(default)]
    pub x_max: Option<f64>,
    #[serde(default)]
    pub y_min: Option<f64>,
    #[serde(default)]
    pub y_max: Option<f64>,
}

impl From<ObjectItem> for DetectedObject {
    fn from(item: ObjectItem) -> Self {
        let tag = item
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TAG.to_string());

        DetectedObject::new(
            tag,
            item.confidence.unwrap_or(0.0),
            BoundingBox::from_corners(
                item.x_min.unwrap_or(0.0),
                item.y_min.unwrap_or(0.0),
                item.x_max.unwrap_or(0.0),
                item.y_max.unwrap_or(0.0),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_best_description() {
        let result: LandmarkProviderResult = serde_json::from_value(json!({
            "status": "success",
            "items": [
                {"description": "Eiffel Tower", "confidence": 0.93},
                {"description": "Tour Montparnasse"}
            ]
        }))
        .unwrap();
        assert_eq!(result.best_description().as_deref(), Some("Eiffel Tower"));

        let empty: LandmarkProviderResult = serde_json::from_value(json!({"items": []})).unwrap();
        assert_eq!(empty.best_description(), None);

        let blank: LandmarkProviderResult =
            serde_json::from_value(json!({"items": [{"description": ""}]})).unwrap();
        assert_eq!(blank.best_description(), None);
    }

    #[test]
    fn test_object_item_conversion() {
        let item: ObjectItem = serde_json::from_value(json!({
            "label": "Tower",
            "confidence": 0.8,
            "x_min": 0.3,
            "x_max": 0.4,
            "y_min": 0.2,
            "y_max": 0.4
        }))
        .unwrap();

        let object = DetectedObject::from(item);
        assert_eq!(object.tag, "Tower");
        assert!((object.confidence - 0.8).abs() < 1e-9);
        assert!((object.bounding_box.x - 0.3).abs() < 1e-9);
        assert!((object.bounding_box.width - 0.1).abs() < 1e-9);
        assert!((object.bounding_box.height - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_object_item_defaults() {
        let item: ObjectItem = serde_json::from_value(json!({})).unwrap();
        let object = DetectedObject::from(item);
        assert_eq!(object.tag, UNKNOWN_TAG);
        assert_eq!(object.confidence, 0.0);
        assert_eq!(object.bounding_box, BoundingBox::new(0.0, 0.0, 0.0, 0.0));
    }
}
