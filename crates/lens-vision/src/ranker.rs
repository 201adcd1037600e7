//! "Central and largest" ranking of candidate objects.
//!
//! Priority score on normalized boxes:
//!
//! ```text
//! score = area - DISTANCE_WEIGHT * distance(box_center, image_center)
//! ```
//!
//! Area lies in [0, 1] and the center distance in [0, ~0.707]. Ties fall back
//! to detector confidence and then to input order.

use std::cmp::Ordering;

use lens_models::{BoundingBox, DetectedObject};

/// Penalty per unit of distance between box center and image center.
pub const DISTANCE_WEIGHT: f64 = 0.5;

const IMAGE_CENTER: (f64, f64) = (0.5, 0.5);

/// Priority of a single box; higher is preferred.
pub fn priority_score(bbox: &BoundingBox) -> f64 {
    let (cx, cy) = bbox.center();
    let distance = ((cx - IMAGE_CENTER.0).powi(2) + (cy - IMAGE_CENTER.1).powi(2)).sqrt();
    bbox.area() - DISTANCE_WEIGHT * distance
}

/// Order objects most-preferred first.
pub fn rank_objects(objects: &[DetectedObject]) -> Vec<DetectedObject> {
    let mut ranked = objects.to_vec();
    // sort_by is stable: full ties keep their input order
    ranked.sort_by(compare_priority);
    ranked
}

/// The single most likely subject of the photo.
pub fn select_primary(objects: &[DetectedObject]) -> Option<DetectedObject> {
    objects.iter().min_by(|a, b| compare_priority(a, b)).cloned()
}

fn compare_priority(a: &DetectedObject, b: &DetectedObject) -> Ordering {
    priority_score(&b.bounding_box)
        .total_cmp(&priority_score(&a.bounding_box))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}
