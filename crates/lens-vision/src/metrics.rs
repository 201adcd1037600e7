//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, histogram};

use lens_models::DetectionStatus;

/// Metric names as constants for consistency.
pub mod names {
    pub const DETECTIONS_TOTAL: &str = "lens_detections_total";
    pub const DETECTION_DURATION_SECONDS: &str = "lens_detection_duration_seconds";
    pub const DEADLINE_EXCEEDED_TOTAL: &str = "lens_detection_deadline_exceeded_total";

    pub const COLLABORATOR_CALLS_TOTAL: &str = "lens_collaborator_calls_total";
    pub const COLLABORATOR_DURATION_SECONDS: &str = "lens_collaborator_duration_seconds";

    pub const CROPS_WRITTEN_TOTAL: &str = "lens_crops_written_total";
    pub const CROPS_SKIPPED_TOTAL: &str = "lens_crops_skipped_total";
}

/// Outcome of one call to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Signal,
    NoSignal,
    Timeout,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Signal => "signal",
            CallOutcome::NoSignal => "no_signal",
            CallOutcome::Timeout => "timeout",
        }
    }
}

/// Record a finished detection request.
pub fn record_detection(status: DetectionStatus, duration_secs: f64) {
    let labels = [("status", status.as_str().to_string())];
    counter!(names::DETECTIONS_TOTAL, &labels).increment(1);
    histogram!(names::DETECTION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a run cut short by its deadline, labelled with the stage reached.
pub fn record_deadline_exceeded(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::DEADLINE_EXCEEDED_TOTAL, &labels).increment(1);
}

/// Record a classifier or detector call.
pub fn record_collaborator_call(
    collaborator: &str,
    stage: &str,
    outcome: CallOutcome,
    duration_secs: f64,
) {
    let labels = [
        ("collaborator", collaborator.to_string()),
        ("stage", stage.to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];
    counter!(names::COLLABORATOR_CALLS_TOTAL, &labels).increment(1);
    histogram!(names::COLLABORATOR_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_crop_written() {
    counter!(names::CROPS_WRITTEN_TOTAL).increment(1);
}

/// Record a skipped crop (`out_of_bounds` or `extraction_failed`).
pub fn record_crop_skipped(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::CROPS_SKIPPED_TOTAL, &labels).increment(1);
}
