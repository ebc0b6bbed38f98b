use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One example value-set for a field type: opaque key to literal map,
/// merged into a row under a `{field_type}_` column prefix.
pub type SampleSet = BTreeMap<String, Value>;

/// Pool of example values per field type.
///
/// This is the external `samples.json` contract. The first entry of each
/// list is the canonical (non-random) sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SamplePool {
    #[serde(flatten)]
    types: BTreeMap<String, Vec<SampleSet>>,
}

impl SamplePool {
    /// Load and parse a sample-pool document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// All value-sets for a field type; empty when the type is unknown.
    pub fn sets(&self, field_type: &str) -> &[SampleSet] {
        self.types
            .get(field_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Canonical value-set for a field type (entry 0).
    pub fn canonical(&self, field_type: &str) -> Option<&SampleSet> {
        self.sets(field_type).first()
    }

    pub fn field_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Build a pool directly from memory; used by fixtures and tests.
    pub fn from_entries(entries: BTreeMap<String, Vec<SampleSet>>) -> Self {
        Self { types: entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_is_the_first_entry() {
        let doc = r#"{
            "text": [
                {"value": "first"},
                {"value": "second"}
            ]
        }"#;
        let pool: SamplePool = serde_json::from_str(doc).expect("parse pool");

        let canonical = pool.canonical("text").expect("canonical sample");
        assert_eq!(canonical.get("value"), Some(&Value::from("first")));
        assert_eq!(pool.sets("text").len(), 2);
    }

    #[test]
    fn unknown_type_has_no_sets() {
        let pool = SamplePool::default();
        assert!(pool.sets("unknown").is_empty());
        assert!(pool.canonical("unknown").is_none());
    }
}
