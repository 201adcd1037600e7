//! Collaborator traits for the external vision services.
//!
//! Implementations absorb their own transport failures: a service that is
//! down looks the same to the pipeline as a service that found nothing.

use async_trait::async_trait;
use std::path::Path;

use lens_models::DetectedObject;

/// Maps an image to a best-guess famous-site name.
#[async_trait]
pub trait LandmarkClassifier: Send + Sync {
    /// Classify the image at `image_path`.
    ///
    /// # Returns
    /// `None` when nothing was recognised or the service could not be reached.
    async fn classify_landmark(&self, image_path: &Path) -> Option<String>;

    /// Provider name for logging and metrics.
    fn name(&self) -> &'static str;
}

/// Maps an image to tagged, located candidate objects.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in the image at `image_path`.
    ///
    /// # Returns
    /// Objects with normalized bounding boxes. Empty when nothing was found or
    /// the service could not be reached.
    async fn detect_objects(&self, image_path: &Path) -> Vec<DetectedObject>;

    /// Provider name for logging and metrics.
    fn name(&self) -> &'static str;
}

/// Collapse blank classifier answers into "no signal".
pub fn normalize_site_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_site_name() {
        assert_eq!(normalize_site_name(None), None);
        assert_eq!(normalize_site_name(Some(String::new())), None);
        assert_eq!(normalize_site_name(Some("   ".to_string())), None);
        assert_eq!(
            normalize_site_name(Some(" Eiffel Tower ".to_string())),
            Some("Eiffel Tower".to_string())
        );
    }
}
