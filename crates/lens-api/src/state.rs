//! Application state.

use std::sync::Arc;

use lens_vision::{DetectorConfig, EdenAiClient, SiteDetector, VisionResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detector: Arc<SiteDetector>,
}

impl AppState {
    /// Create state backed by Eden AI, configured from the environment.
    pub fn new(config: ApiConfig) -> VisionResult<Self> {
        let client = Arc::new(EdenAiClient::from_env()?);
        let detector_config = DetectorConfig::from_env()?;

        tracing::info!(
            landmark_provider = %client.config().landmark_provider,
            object_provider = %client.config().object_provider,
            crop_policy = %detector_config.crop_policy,
            relevant_categories = detector_config.relevant_tags.categories().count(),
            relevant_tags = detector_config.relevant_tags.flattened().len(),
            scratch_dir = %detector_config.scratch_dir.display(),
            "Site detector configured"
        );

        let worst_case = client.config().worst_case_duration();
        if worst_case > detector_config.classifier_timeout {
            tracing::warn!(
                worst_case_ms = worst_case.as_millis() as u64,
                classifier_timeout_ms = detector_config.classifier_timeout.as_millis() as u64,
                "Eden AI retries do not fit in CLASSIFIER_TIMEOUT; later attempts will be cut off"
            );
        }

        let detector = SiteDetector::new(client.clone(), client, detector_config);
        Ok(Self::with_detector(config, detector))
    }

    /// Create state around an existing detector.
    pub fn with_detector(config: ApiConfig, detector: SiteDetector) -> Self {
        Self {
            config,
            detector: Arc::new(detector),
        }
    }
}
