//! Relevant-tag taxonomy.
//!
//! Maps a category name to the detector tags that count as landmark-like.
//! Passed around as a value so callers (and tests) can swap in their own table.

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

const MONUMENTS_AND_BUILDINGS: &[&str] = &[
    "statue", "monument", "historical site", "palace", "castle", "tower", "bridge",
    "fountain", "ruins", "memorial", "building", "skyscraper", "cathedral", "church",
    "mosque", "temple", "pagoda", "lighthouse",
];

const NATURAL_SITES: &[&str] = &[
    "mountain", "volcano", "canyon", "waterfall", "beach", "lake", "river", "forest",
    "desert", "glacier",
];

const PARKS: &[&str] = &["park", "garden", "botanical garden", "national park"];

const ART_AND_CULTURE: &[&str] = &[
    "sculpture", "painting", "art museum", "theater", "opera house",
];

/// Category → tag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RelevantTags {
    categories: BTreeMap<String, Vec<String>>,
}

impl Default for RelevantTags {
    fn default() -> Self {
        let mut tags = Self::empty();
        tags.insert_category("monuments and buildings", MONUMENTS_AND_BUILDINGS.iter().copied());
        tags.insert_category("natural sites", NATURAL_SITES.iter().copied());
        tags.insert_category("parks", PARKS.iter().copied());
        tags.insert_category("art and culture", ART_AND_CULTURE.iter().copied());
        tags
    }
}

impl RelevantTags {
    /// A taxonomy with no categories. Nothing is relevant.
    pub fn empty() -> Self {
        Self {
            categories: BTreeMap::new(),
        }
    }

    /// Builder-style category insertion.
    pub fn with_category<I, S>(mut self, name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert_category(name, tags);
        self
    }

    /// Add (or replace) a category. Tags are stored lowercased and trimmed.
    pub fn insert_category<I, S>(&mut self, name: impl Into<String>, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| normalize(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        self.categories.insert(name.into(), tags);
    }

    /// Parse a taxonomy from a JSON object of `category: [tags]`.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        if raw.is_empty() {
            return Err(ModelError::InvalidTaxonomy("no categories defined".to_string()));
        }

        let mut tags = Self::empty();
        for (name, list) in raw {
            tags.insert_category(name, list);
        }
        Ok(tags)
    }

    /// Load a taxonomy from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::TaxonomyRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, tags)| (name.as_str(), tags.as_slice()))
    }

    /// All tags across every category.
    pub fn flattened(&self) -> Vec<&str> {
        self.categories
            .values()
            .flat_map(|tags| tags.iter().map(String::as_str))
            .collect()
    }

    /// Case-insensitive exact membership test.
    pub fn contains(&self, tag: &str) -> bool {
        self.category_of(tag).is_some()
    }

    /// Category a tag belongs to, if any.
    pub fn category_of(&self, tag: &str) -> Option<&str> {
        let needle = normalize(tag);
        self.categories
            .iter()
            .find(|(_, tags)| tags.iter().any(|t| normalize(t) == needle))
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_taxonomy() {
        let tags = RelevantTags::default();
        assert_eq!(tags.categories().count(), 4);
        assert_eq!(tags.flattened().len(), 37);
        assert!(tags.contains("tower"));
        assert!(tags.contains("Opera House"));
        assert!(!tags.contains("person"));
        assert_eq!(tags.category_of("Waterfall"), Some("natural sites"));
    }

    #[test]
    fn test_membership_is_exact() {
        let tags = RelevantTags::default();
        assert!(!tags.contains("towers"));
        assert!(!tags.contains("botanical"));
    }

    #[test]
    fn test_custom_taxonomy() {
        let tags = RelevantTags::empty().with_category("bridges", ["Bridge", " viaduct "]);
        assert!(tags.contains("BRIDGE"));
        assert!(tags.contains("viaduct"));
        assert!(!tags.contains("tower"));
    }

    #[test]
    fn test_from_json() {
        let tags = RelevantTags::from_json(r#"{"water": ["Lake", "river"]}"#).unwrap();
        assert!(tags.contains("lake"));
        assert_eq!(tags.category_of("river"), Some("water"));

        assert!(RelevantTags::from_json("{}").is_err());
        assert!(RelevantTags::from_json("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tags.json");
        std::fs::write(&path, r#"{"parks": ["park"]}"#).unwrap();

        let tags = RelevantTags::from_file(&path).unwrap();
        assert!(tags.contains("Park"));

        let missing = RelevantTags::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ModelError::TaxonomyRead { .. })));
    }

    #[test]
    fn test_empty_taxonomy() {
        assert!(RelevantTags::empty().is_empty());
        assert!(!RelevantTags::empty().contains("tower"));
    }
}
