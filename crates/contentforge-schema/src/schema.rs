use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Weighted distribution over string keys.
///
/// Keys iterate in sorted order, which keeps weighted draws reproducible
/// under a fixed seed.
pub type WeightMap = BTreeMap<String, u64>;

/// Top-level content-model description, keyed by entity-type name.
///
/// This is the external `schema.json` contract: the document that a schema
/// discovery tool derives from a live content model and hands to the
/// generation engine.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContentSchema {
    /// Entity types captured from the content model.
    #[serde(flatten)]
    pub entity_types: BTreeMap<String, EntityTypeSchema>,
}

impl ContentSchema {
    /// Load and parse a schema document from disk.
    ///
    /// A missing or malformed file is fatal at startup; there is no
    /// partial run.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn entity_type(&self, name: &str) -> Option<&EntityTypeSchema> {
        self.entity_types.get(name)
    }
}

/// One entity type: its physical base tables, semantic key mapping, and
/// bundles.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityTypeSchema {
    /// Semantic key (`id`, `revision`, `uuid`, `bundle`, `label`, ...) to
    /// physical column name.
    #[serde(rename = "_entity_definition_keys")]
    pub entity_keys: BTreeMap<String, String>,
    /// Base table name to ordered column list.
    #[serde(rename = "_base_tables")]
    pub base_tables: BTreeMap<String, Vec<String>>,
    /// Bundle name to per-bundle schema.
    #[serde(rename = "_bundles")]
    pub bundles: BTreeMap<String, BundleSchema>,
}

impl EntityTypeSchema {
    /// Physical column for a semantic entity key, when the type declares one.
    pub fn key_column(&self, key: &str) -> Option<&str> {
        self.entity_keys.get(key).map(String::as_str)
    }

    /// Semantic key a physical column maps to, if any.
    pub fn semantic_key(&self, column: &str) -> Option<&str> {
        self.entity_keys
            .iter()
            .find(|(_, physical)| physical.as_str() == column)
            .map(|(key, _)| key.as_str())
    }
}

/// A named sub-type of an entity type with its own field set and instance
/// quota.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BundleSchema {
    /// Declared number of instances to create.
    pub instances: u64,
    /// Configured fields attached to the bundle.
    #[serde(rename = "_fields", default)]
    pub fields: Vec<FieldSchema>,
}

/// One configured field on a bundle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldSchema {
    pub field_name: String,
    pub field_type: String,
    /// Physical field data table.
    #[serde(rename = "_table")]
    pub table: String,
    /// Physical field revision table.
    #[serde(rename = "_rev_table")]
    pub revision_table: String,
    /// Present iff the field is an entity reference.
    #[serde(rename = "_bundle_info", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceSchema>,
}

impl FieldSchema {
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// Reference metadata for an entity-reference field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceSchema {
    /// Entity type the field points at.
    pub target_type: String,
    /// Reference flavor; revision-aware references also carry the target
    /// revision id.
    pub reference: ReferenceKind,
    /// Fan-out distribution: weight per reference count.
    #[serde(default)]
    pub histogram: WeightMap,
    /// Optional allow-list of target bundles with per-bundle weights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bundles: Option<WeightMap>,
}

/// Kind of entity reference a field stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    EntityReference,
    EntityReferenceRevisions,
}

impl ReferenceKind {
    pub fn is_revision_aware(self) -> bool {
        matches!(self, ReferenceKind::EntityReferenceRevisions)
    }
}
