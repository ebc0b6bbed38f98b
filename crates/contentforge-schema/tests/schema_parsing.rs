use contentforge_schema::{validate_schema, ContentSchema, ReferenceKind};

const SCHEMA_DOC: &str = r#"{
  "node": {
    "_entity_definition_keys": {
      "id": "nid",
      "revision": "vid",
      "bundle": "type",
      "label": "title",
      "uuid": "uuid",
      "langcode": "langcode",
      "status": "status",
      "uid": "uid"
    },
    "_base_tables": {
      "node": ["nid", "vid", "type", "uuid", "langcode"],
      "node_field_data": ["nid", "vid", "type", "langcode", "title", "uid", "status"]
    },
    "_bundles": {
      "article": {
        "instances": 10,
        "_fields": [
          {
            "field_name": "field_tags",
            "field_type": "entity_reference",
            "_table": "node__field_tags",
            "_rev_table": "node_revision__field_tags",
            "_bundle_info": {
              "target_type": "taxonomy_term",
              "reference": "entity_reference",
              "histogram": {"0": 1, "1": 2, "2": 1},
              "target_bundles": {"tags": 1}
            }
          },
          {
            "field_name": "body",
            "field_type": "text_with_summary",
            "_table": "node__body",
            "_rev_table": "node_revision__body"
          }
        ]
      }
    }
  },
  "taxonomy_term": {
    "_entity_definition_keys": {
      "id": "tid",
      "revision": "revision_id",
      "bundle": "vid",
      "label": "name",
      "uuid": "uuid",
      "langcode": "langcode"
    },
    "_base_tables": {
      "taxonomy_term_data": ["tid", "revision_id", "vid", "uuid", "langcode"]
    },
    "_bundles": {
      "tags": {"instances": 5, "_fields": []}
    }
  }
}"#;

#[test]
fn parses_schema_contract() {
    let schema: ContentSchema = serde_json::from_str(SCHEMA_DOC).expect("parse schema");

    let node = schema.entity_type("node").expect("node entity type");
    assert_eq!(node.key_column("id"), Some("nid"));
    assert_eq!(node.semantic_key("vid"), Some("revision"));
    assert_eq!(node.base_tables.len(), 2);

    let article = node.bundles.get("article").expect("article bundle");
    assert_eq!(article.instances, 10);
    assert_eq!(article.fields.len(), 2);

    let tags = &article.fields[0];
    assert!(tags.is_reference());
    let reference = tags.reference.as_ref().expect("reference info");
    assert_eq!(reference.target_type, "taxonomy_term");
    assert_eq!(reference.reference, ReferenceKind::EntityReference);
    assert_eq!(reference.histogram.get("1"), Some(&2));

    let body = &article.fields[1];
    assert!(!body.is_reference());
}

#[test]
fn validates_schema_contract() {
    let schema: ContentSchema = serde_json::from_str(SCHEMA_DOC).expect("parse schema");
    validate_schema(&schema).expect("schema is valid");
}

#[test]
fn rejects_unknown_reference_target() {
    let doc = SCHEMA_DOC.replace("\"target_type\": \"taxonomy_term\"", "\"target_type\": \"media\"");
    let schema: ContentSchema = serde_json::from_str(&doc).expect("parse schema");
    let err = validate_schema(&schema).expect_err("unknown target must fail");
    assert!(err.to_string().contains("unknown entity type"));
}

#[test]
fn rejects_zero_weight_histogram() {
    let doc = SCHEMA_DOC.replace("\"histogram\": {\"0\": 1, \"1\": 2, \"2\": 1}", "\"histogram\": {\"0\": 0}");
    let schema: ContentSchema = serde_json::from_str(&doc).expect("parse schema");
    let err = validate_schema(&schema).expect_err("zero weights must fail");
    assert!(err.to_string().contains("zero weight sum"));
}
