use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use contentforge_schema::{EntityTypeSchema, SamplePool};

use crate::generator::ParentLink;
use crate::sampler::sample_from_pool;

/// Reference date for generated timestamp columns.
pub fn base_timestamp() -> i64 {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp()
}

/// Row skeleton for one table: a fixed column order plus per-column values.
///
/// Cloned per instance; variable fields are overlaid with `set` and the
/// result serialized with `record`.
#[derive(Debug, Clone)]
pub struct RowTemplate {
    columns: Vec<String>,
    values: HashMap<String, Value>,
}

impl RowTemplate {
    pub fn new(columns: Vec<String>) -> Self {
        let values = columns
            .iter()
            .map(|column| (column.clone(), Value::Null))
            .collect();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Overlay a value; ignored when the table does not carry the column.
    pub fn set(&mut self, column: &str, value: Value) -> bool {
        match self.values.get_mut(column) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Serialize the row in column order.
    pub fn record(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                self.values
                    .get(column)
                    .map(cell_text)
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Render one JSON literal as a CSV cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => if *flag { "1" } else { "0" }.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Build one row template per base table of an entity type.
///
/// Columns that map (via the entity key mapping) to a known semantic key
/// get its canonical default; everything else defaults to NULL.
pub fn build_templates(entity: &EntityTypeSchema) -> BTreeMap<String, RowTemplate> {
    let mut templates = BTreeMap::new();
    for (table, columns) in &entity.base_tables {
        let mut template = RowTemplate::new(columns.clone());
        for column in columns {
            if let Some(key) = entity.semantic_key(column)
                && let Some(default) = default_for_key(key)
            {
                template.set(column, default);
            }
        }
        templates.insert(table.clone(), template);
    }
    templates
}

fn default_for_key(key: &str) -> Option<Value> {
    match key {
        "langcode" => Some(Value::from("en")),
        "default_langcode" => Some(Value::from(1)),
        "status" | "published" => Some(Value::from(1)),
        "uid" | "owner" | "revision_uid" => Some(Value::from(1)),
        "created" | "changed" | "revision_created" => Some(Value::from(base_timestamp())),
        _ => None,
    }
}

/// Per-entity-type row alteration strategy.
///
/// A closed set keyed by entity-type name; unknown types fall back to
/// `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityVariant {
    Generic,
    Media,
    Paragraph,
    TaxonomyTerm,
}

impl EntityVariant {
    pub fn for_entity_type(entity_type: &str) -> Self {
        match entity_type {
            "media" => EntityVariant::Media,
            "paragraph" => EntityVariant::Paragraph,
            "taxonomy_term" => EntityVariant::TaxonomyTerm,
            _ => EntityVariant::Generic,
        }
    }

    /// Alter one instance's base rows with generation-state context.
    pub fn alter_rows(
        &self,
        rows: &mut BTreeMap<String, RowTemplate>,
        parent: Option<&ParentLink>,
        pool: &SamplePool,
        rng: &mut ChaCha8Rng,
    ) {
        match self {
            EntityVariant::Generic | EntityVariant::TaxonomyTerm => {}
            EntityVariant::Media => {
                let Some(sample) = sample_from_pool(pool, "image", rng) else {
                    return;
                };
                for template in rows.values_mut() {
                    for key in ["target_id", "alt", "title", "width", "height"] {
                        let value = sample.get(key).cloned().unwrap_or(Value::Null);
                        template.set(&format!("thumbnail__{key}"), value);
                    }
                }
            }
            EntityVariant::Paragraph => {
                let Some(parent) = parent else {
                    return;
                };
                for template in rows.values_mut() {
                    template.set("parent_id", Value::from(parent.id));
                    template.set("parent_type", Value::from(parent.entity_type.as_str()));
                    template.set("parent_field_name", Value::from(parent.field_name.as_str()));
                }
            }
        }
    }

    /// Extra hierarchy tables an entity type maintains alongside its base
    /// tables. Terms keep a parent link per revision.
    pub fn hierarchy_tables(&self, entity_type: &str) -> Vec<String> {
        match self {
            EntityVariant::TaxonomyTerm => vec![
                format!("{entity_type}__parent"),
                format!("{entity_type}_revision__parent"),
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentforge_schema::ContentSchema;

    fn entity_fixture() -> EntityTypeSchema {
        let doc = r#"{
            "node": {
                "_entity_definition_keys": {
                    "id": "nid", "revision": "vid", "bundle": "type",
                    "label": "title", "uuid": "uuid", "langcode": "langcode",
                    "status": "status", "uid": "uid", "created": "created"
                },
                "_base_tables": {
                    "node_field_data": ["nid", "vid", "type", "langcode", "title", "uid", "status", "created", "extra"]
                },
                "_bundles": {}
            }
        }"#;
        let schema: ContentSchema = serde_json::from_str(doc).expect("parse fixture");
        schema.entity_type("node").expect("node").clone()
    }

    #[test]
    fn semantic_defaults_applied() {
        let entity = entity_fixture();
        let templates = build_templates(&entity);
        let template = templates.get("node_field_data").expect("template");
        let record = template.record();

        let index = |name: &str| {
            template
                .columns()
                .iter()
                .position(|column| column == name)
                .expect("column present")
        };

        assert_eq!(record[index("langcode")], "en");
        assert_eq!(record[index("status")], "1");
        assert_eq!(record[index("uid")], "1");
        assert_eq!(record[index("created")], base_timestamp().to_string());
        // Unmapped columns stay NULL.
        assert_eq!(record[index("extra")], "");
        assert_eq!(record[index("nid")], "");
    }

    #[test]
    fn set_ignores_unknown_columns() {
        let mut template = RowTemplate::new(vec!["a".to_string()]);
        assert!(template.set("a", Value::from(1)));
        assert!(!template.set("missing", Value::from(1)));
        assert_eq!(template.record(), vec!["1".to_string()]);
    }

    #[test]
    fn variant_selection_falls_back_to_generic() {
        assert_eq!(EntityVariant::for_entity_type("media"), EntityVariant::Media);
        assert_eq!(
            EntityVariant::for_entity_type("taxonomy_term"),
            EntityVariant::TaxonomyTerm
        );
        assert_eq!(EntityVariant::for_entity_type("node"), EntityVariant::Generic);
    }

    #[test]
    fn term_hierarchy_tables_follow_type_name() {
        let variant = EntityVariant::TaxonomyTerm;
        assert_eq!(
            variant.hierarchy_tables("taxonomy_term"),
            vec![
                "taxonomy_term__parent".to_string(),
                "taxonomy_term_revision__parent".to_string()
            ]
        );
        assert!(EntityVariant::Generic.hierarchy_tables("node").is_empty());
    }
}
