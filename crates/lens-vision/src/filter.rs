//! Relevance filtering of detected objects.

use lens_models::{DetectedObject, RelevantTags};

/// Keep only objects whose tag appears in the taxonomy.
///
/// Matching is case-insensitive and exact. Input order is preserved.
pub fn filter_relevant(objects: &[DetectedObject], tags: &RelevantTags) -> Vec<DetectedObject> {
    objects
        .iter()
        .filter(|object| tags.contains(&object.tag))
        .cloned()
        .collect()
}
