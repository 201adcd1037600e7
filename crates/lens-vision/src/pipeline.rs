//! Site detection orchestrator.
//!
//! Sequences the collaborators into one `DetectionResult`:
//!
//! 1. Classify the full image. No name means `failure`.
//! 2. A name becomes the provisional `assume` result.
//! 3. Detect objects and keep the relevant ones. None left means the
//!    provisional result stands.
//! 4. Rank and crop the candidates, then re-classify each crop. The first
//!    crop that yields a name produces a `success` result.
//! 5. Anything else falls back to the provisional result.
//!
//! Collaborator errors and timeouts are "no signal"; `detect_site` never fails.
//! The whole run is bounded by a deadline. Running out of time keeps whatever
//! result was reached so far.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, info, info_span, warn, Instrument};

use lens_models::{CroppedDetectedObject, DetectedObject, DetectionResult, RelevantTags};

use crate::cropper::crop_objects_from_image;
use crate::error::{VisionError, VisionResult};
use crate::filter::filter_relevant;
use crate::metrics::{self, CallOutcome};
use crate::providers::{normalize_site_name, LandmarkClassifier, ObjectDetector};
use crate::ranker::{rank_objects, select_primary};

const STAGE_FULL_IMAGE: &str = "full_image";
const STAGE_OBJECTS: &str = "objects";
const STAGE_CROP: &str = "crop";
const STAGE_REFINE: &str = "refine";

/// Which relevant objects get cropped and re-classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CropPolicy {
    /// Crop every relevant object in ranked order; first named crop wins.
    #[default]
    FirstMatch,
    /// Crop only the top-ranked object.
    TopCandidate,
}

impl CropPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropPolicy::FirstMatch => "first_match",
            CropPolicy::TopCandidate => "top_candidate",
        }
    }
}

impl fmt::Display for CropPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropPolicy {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_match" => Ok(CropPolicy::FirstMatch),
            "top_candidate" => Ok(CropPolicy::TopCandidate),
            other => Err(VisionError::config(format!("unknown crop policy: {}", other))),
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Parent of the per-request crop directories
    pub scratch_dir: PathBuf,
    /// Upper bound on any single classifier or detector call
    pub classifier_timeout: Duration,
    /// Upper bound on a whole `detect_site` run
    pub deadline: Duration,
    pub crop_policy: CropPolicy,
    /// Tags considered landmark-like
    pub relevant_tags: Arc<RelevantTags>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("lens-scratch"),
            classifier_timeout: Duration::from_secs(8),
            deadline: Duration::from_secs(40),
            crop_policy: CropPolicy::default(),
            relevant_tags: Arc::new(RelevantTags::default()),
        }
    }
}

impl DetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        let defaults = Self::default();

        let crop_policy = match std::env::var("CROP_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.crop_policy,
        };

        let relevant_tags = match std::env::var("RELEVANT_TAGS_PATH") {
            Ok(path) if !path.trim().is_empty() => Arc::new(RelevantTags::from_file(path)?),
            _ => defaults.relevant_tags,
        };

        Ok(Self {
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            classifier_timeout: Duration::from_secs(
                std::env::var("CLASSIFIER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8),
            ),
            deadline: std::env::var("DETECTION_DEADLINE")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.deadline),
            crop_policy,
            relevant_tags,
        })
    }
}

/// Runs the site detection pipeline against injected collaborators.
pub struct SiteDetector {
    classifier: Arc<dyn LandmarkClassifier>,
    detector: Arc<dyn ObjectDetector>,
    config: DetectorConfig,
}

impl SiteDetector {
    pub fn new(
        classifier: Arc<dyn LandmarkClassifier>,
        detector: Arc<dyn ObjectDetector>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            classifier,
            detector,
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Work out which famous site the image shows.
    ///
    /// Always returns a terminal result: `failure`, `assume` or `success`.
    pub async fn detect_site(&self, image_path: &Path) -> DetectionResult {
        self.detect_site_within(image_path, self.config.deadline).await
    }

    /// Like [`detect_site`](Self::detect_site), finishing within `budget`
    /// (or the configured deadline, whichever is shorter).
    pub async fn detect_site_within(
        &self,
        image_path: &Path,
        budget: Duration,
    ) -> DetectionResult {
        let budget = budget.min(self.config.deadline);
        let span = info_span!(
            "site_detection",
            image = %image_path.display(),
            policy = %self.config.crop_policy
        );

        async {
            let started = Instant::now();
            let deadline = tokio::time::Instant::now() + budget;
            let result = self.run(image_path, deadline).await;
            let elapsed = started.elapsed();

            metrics::record_detection(result.status, elapsed.as_secs_f64());
            info!(
                status = %result.status,
                site = result.site_name().unwrap_or(""),
                duration_ms = elapsed.as_millis() as u64,
                "Site detection finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, image_path: &Path, deadline: tokio::time::Instant) -> DetectionResult {
        let full_image = tokio::time::timeout_at(
            deadline,
            self.classify(image_path, STAGE_FULL_IMAGE),
        );
        let full_image_name = match full_image.await {
            Ok(Some(name)) => name,
            Ok(None) => return DetectionResult::failure(),
            Err(_) => {
                warn!("Detection deadline reached before the full image was classified");
                metrics::record_deadline_exceeded(STAGE_FULL_IMAGE);
                return DetectionResult::failure();
            }
        };
        let provisional = DetectionResult::assumed(full_image_name);

        match tokio::time::timeout_at(deadline, self.refine(image_path)).await {
            Ok(Some(confirmed)) => confirmed,
            Ok(None) => provisional,
            Err(_) => {
                warn!("Detection deadline reached, keeping full-image result");
                metrics::record_deadline_exceeded(STAGE_REFINE);
                provisional
            }
        }
    }

    /// Look for a cropped object that names the site.
    ///
    /// `None` leaves the provisional full-image result in place. Dropping
    /// the future part way removes any crops already written.
    async fn refine(&self, image_path: &Path) -> Option<DetectionResult> {
        let objects = self.detect(image_path).await;
        let relevant = filter_relevant(&objects, &self.config.relevant_tags);
        debug!(
            detected = objects.len(),
            relevant = relevant.len(),
            "Filtered detected objects"
        );
        if relevant.is_empty() {
            return None;
        }

        let candidates = match self.config.crop_policy {
            CropPolicy::FirstMatch => rank_objects(&relevant),
            CropPolicy::TopCandidate => select_primary(&relevant).into_iter().collect(),
        };
        if candidates.is_empty() {
            return None;
        }

        let (crop_dir, cropped) = match self.crop(image_path, candidates).await {
            Ok(crops) => crops,
            Err(e) => {
                warn!(error = %e, "Cropping failed, keeping full-image result");
                return None;
            }
        };

        let mut confirmed = None;
        for crop in &cropped {
            if let Some(name) = self.classify(&crop.cropped_image_path, STAGE_CROP).await {
                info!(label = %crop.label, site = %name, "Site confirmed from cropped object");
                confirmed = Some(DetectionResult::from_cropped(
                    crop.label.clone(),
                    crop.bounding_box.center(),
                    name,
                ));
                break;
            }
        }

        discard(crop_dir).await;
        confirmed
    }

    /// Classify with the configured timeout; blank names count as no signal.
    async fn classify(&self, image_path: &Path, stage: &str) -> Option<String> {
        let started = Instant::now();
        let call = tokio::time::timeout(
            self.config.classifier_timeout,
            self.classifier.classify_landmark(image_path),
        )
        .await;

        let (name, outcome) = match call {
            Ok(name) => {
                let name = normalize_site_name(name);
                let outcome = if name.is_some() {
                    CallOutcome::Signal
                } else {
                    CallOutcome::NoSignal
                };
                (name, outcome)
            }
            Err(_) => {
                warn!(
                    classifier = self.classifier.name(),
                    stage,
                    timeout_ms = self.config.classifier_timeout.as_millis() as u64,
                    "Landmark classifier timed out"
                );
                (None, CallOutcome::Timeout)
            }
        };

        metrics::record_collaborator_call(
            self.classifier.name(),
            stage,
            outcome,
            started.elapsed().as_secs_f64(),
        );
        name
    }

    async fn detect(&self, image_path: &Path) -> Vec<DetectedObject> {
        let started = Instant::now();
        let call = tokio::time::timeout(
            self.config.classifier_timeout,
            self.detector.detect_objects(image_path),
        )
        .await;

        let (objects, outcome) = match call {
            Ok(objects) if objects.is_empty() => (objects, CallOutcome::NoSignal),
            Ok(objects) => (objects, CallOutcome::Signal),
            Err(_) => {
                warn!(
                    detector = self.detector.name(),
                    timeout_ms = self.config.classifier_timeout.as_millis() as u64,
                    "Object detector timed out"
                );
                (Vec::new(), CallOutcome::Timeout)
            }
        };

        metrics::record_collaborator_call(
            self.detector.name(),
            STAGE_OBJECTS,
            outcome,
            started.elapsed().as_secs_f64(),
        );
        objects
    }

    /// Crop candidates into a fresh directory under the scratch dir.
    ///
    /// Crops come back in candidate order.
    async fn crop(
        &self,
        image_path: &Path,
        candidates: Vec<DetectedObject>,
    ) -> VisionResult<(TempDir, Vec<CroppedDetectedObject>)> {
        let scratch_dir = self.config.scratch_dir.clone();
        let image_path = image_path.to_path_buf();

        tokio::task::spawn_blocking(move || -> VisionResult<_> {
            std::fs::create_dir_all(&scratch_dir)?;
            let crop_dir = tempfile::Builder::new()
                .prefix("crops-")
                .tempdir_in(&scratch_dir)?;
            let cropped = crop_objects_from_image(&image_path, &candidates, crop_dir.path())?;
            Ok((crop_dir, cropped))
        })
        .await
        .map_err(|e| VisionError::internal(format!("crop task failed: {}", e)))?
    }
}

/// Remove a request's crop directory off the async runtime.
async fn discard(crop_dir: TempDir) {
    let path = crop_dir.path().to_path_buf();
    match tokio::task::spawn_blocking(move || crop_dir.close()).await {
        Ok(Ok(())) => debug!(dir = %path.display(), "Removed crop directory"),
        Ok(Err(e)) => warn!(dir = %path.display(), error = %e, "Failed to remove crop directory"),
        Err(e) => warn!(error = %e, "Crop cleanup task failed"),
    }
}
