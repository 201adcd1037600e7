//! Eden AI HTTP client.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use lens_models::DetectedObject;

use crate::eden_ai::types::{LandmarkProviderResult, ObjectProviderResult};
use crate::error::{VisionError, VisionResult};
use crate::providers::{LandmarkClassifier, ObjectDetector};

const DEFAULT_BASE_URL: &str = "https://api.edenai.run/v2";
const LANDMARK_PATH: &str = "image/landmark_detection";
const OBJECT_PATH: &str = "image/object_detection";
const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Configuration for the Eden AI client.
#[derive(Debug, Clone)]
pub struct EdenAiConfig {
    /// Bearer token
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Provider used for landmark detection
    pub landmark_provider: String,
    /// Provider used for object detection
    pub object_provider: String,
    /// Per-attempt HTTP timeout
    pub timeout: Duration,
    /// Max retries for retryable failures
    pub max_retries: u32,
}

impl Default for EdenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            landmark_provider: "google".to_string(),
            object_provider: "clarifai".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 1,
        }
    }
}

impl EdenAiConfig {
    /// Create config from environment variables.
    ///
    /// `EDENAI_API_KEY` is required.
    pub fn from_env() -> VisionResult<Self> {
        let api_key = std::env::var("EDENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                VisionError::config("EDENAI_API_KEY is not set. Please check .env file.")
            })?;

        let defaults = Self::default();
        Ok(Self {
            api_key,
            base_url: std::env::var("EDENAI_BASE_URL").unwrap_or(defaults.base_url),
            landmark_provider: std::env::var("EDENAI_LANDMARK_PROVIDER")
                .unwrap_or(defaults.landmark_provider),
            object_provider: std::env::var("EDENAI_OBJECT_PROVIDER")
                .unwrap_or(defaults.object_provider),
            timeout: Duration::from_secs(
                std::env::var("EDENAI_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_retries: std::env::var("EDENAI_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
        })
    }

    /// Longest a single call can take: every attempt timing out plus the
    /// backoff sleeps between them.
    ///
    /// Callers that wrap calls in their own timeout should allow at least this
    /// much, otherwise the outer timeout wins and later retries never run.
    pub fn worst_case_duration(&self) -> Duration {
        let attempts = self.max_retries + 1;
        let backoff: Duration = (0..self.max_retries).map(retry_delay).sum();
        self.timeout * attempts + backoff
    }

    pub fn landmark_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), LANDMARK_PATH)
    }

    pub fn object_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), OBJECT_PATH)
    }
}

/// Client for the Eden AI image endpoints.
pub struct EdenAiClient {
    http: Client,
    config: EdenAiConfig,
}

impl EdenAiClient {
    /// Create a new client.
    pub fn new(config: EdenAiConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(EdenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &EdenAiConfig {
        &self.config
    }

    /// Best-guess landmark name for an image.
    ///
    /// `Ok(None)` means the provider answered but recognised nothing.
    pub async fn fetch_landmark(&self, image_path: &Path) -> VisionResult<Option<String>> {
        let result: LandmarkProviderResult = self
            .post_image(
                &self.config.landmark_url(),
                &self.config.landmark_provider,
                image_path,
            )
            .await?;

        Ok(result.best_description())
    }

    /// Objects detected in an image, with normalized boxes.
    pub async fn fetch_objects(&self, image_path: &Path) -> VisionResult<Vec<DetectedObject>> {
        let result: ObjectProviderResult = self
            .post_image(
                &self.config.object_url(),
                &self.config.object_provider,
                image_path,
            )
            .await?;

        Ok(result.items.into_iter().map(DetectedObject::from).collect())
    }

    /// Upload an image and decode the named provider's section of the reply.
    async fn post_image<T: DeserializeOwned>(
        &self,
        url: &str,
        provider: &str,
        image_path: &Path,
    ) -> VisionResult<T> {
        if !tokio::fs::try_exists(image_path).await.unwrap_or(false) {
            return Err(VisionError::FileNotFound(image_path.to_path_buf()));
        }

        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        debug!(url = %url, provider = %provider, "Sending image to Eden AI");

        let response = self
            .with_retry(|| async {
                let form = Form::new()
                    .text("providers", provider.to_string())
                    .part("file", Part::bytes(bytes.clone()).file_name(file_name.clone()));

                let response = self
                    .http
                    .post(url)
                    .bearer_auth(&self.config.api_key)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            VisionError::Timeout(self.config.timeout.as_secs())
                        } else {
                            VisionError::Network(e)
                        }
                    })?;

                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(VisionError::from_http_status(status, body));
                }

                Ok(response)
            })
            .await?;

        let mut by_provider: HashMap<String, serde_json::Value> = response.json().await?;
        let section = by_provider.remove(provider).ok_or_else(|| {
            VisionError::InvalidResponse(format!("no \"{}\" section in response", provider))
        })?;

        Ok(serde_json::from_value(section)?)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> VisionResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = VisionResult<T>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = retry_delay(attempt);
                    warn!(
                        "Eden AI request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(250 * 2u64.pow(attempt))
}

#[async_trait]
impl LandmarkClassifier for EdenAiClient {
    async fn classify_landmark(&self, image_path: &Path) -> Option<String> {
        match self.fetch_landmark(image_path).await {
            Ok(Some(landmark)) => {
                info!(landmark = %landmark, "Detected landmark");
                Some(landmark)
            }
            Ok(None) => {
                warn!(image = %image_path.display(), "No landmark detected");
                None
            }
            Err(e) => {
                error!(image = %image_path.display(), error = %e, "Error fetching landmark data");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "eden_ai_landmark"
    }
}

#[async_trait]
impl ObjectDetector for EdenAiClient {
    async fn detect_objects(&self, image_path: &Path) -> Vec<DetectedObject> {
        match self.fetch_objects(image_path).await {
            Ok(objects) if objects.is_empty() => {
                warn!(image = %image_path.display(), "No objects detected");
                objects
            }
            Ok(objects) => {
                info!(count = objects.len(), "Detected objects");
                objects
            }
            Err(e) => {
                error!(image = %image_path.display(), error = %e, "Error detecting objects");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "eden_ai_objects"
    }
}
