use crate::error::{Error, Result};
use crate::samples::SamplePool;
use crate::schema::{ContentSchema, WeightMap};

/// Validate internal consistency of a content schema.
///
/// This checks:
/// - entity types declare at least one base table with columns
/// - reference fields point at known entity types and bundles
/// - non-empty weight maps carry a positive weight sum
pub fn validate_schema(schema: &ContentSchema) -> Result<()> {
    if schema.entity_types.is_empty() {
        return Err(Error::InvalidSchema("no entity types declared".to_string()));
    }

    for (type_name, entity) in &schema.entity_types {
        if entity.base_tables.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "entity type '{type_name}' has no base tables"
            )));
        }
        for (table, columns) in &entity.base_tables {
            if columns.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "base table '{table}' of '{type_name}' has no columns"
                )));
            }
        }

        for (bundle_name, bundle) in &entity.bundles {
            for field in &bundle.fields {
                let Some(reference) = &field.reference else {
                    continue;
                };

                let target = schema.entity_types.get(&reference.target_type).ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "field '{}' of '{type_name}.{bundle_name}' references unknown entity type '{}'",
                        field.field_name, reference.target_type
                    ))
                })?;

                check_weights(&reference.histogram, || {
                    format!(
                        "histogram of field '{}' on '{type_name}.{bundle_name}'",
                        field.field_name
                    )
                })?;

                if let Some(target_bundles) = &reference.target_bundles {
                    check_weights(target_bundles, || {
                        format!(
                            "target bundles of field '{}' on '{type_name}.{bundle_name}'",
                            field.field_name
                        )
                    })?;
                    for bundle in target_bundles.keys() {
                        if !target.bundles.contains_key(bundle) {
                            return Err(Error::InvalidSchema(format!(
                                "field '{}' of '{type_name}.{bundle_name}' allows unknown bundle '{}' of '{}'",
                                field.field_name, bundle, reference.target_type
                            )));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Validate a sample pool: every known field type must carry at least one
/// value-set so canonical sampling is always possible.
pub fn validate_pool(pool: &SamplePool) -> Result<()> {
    for field_type in pool.field_types() {
        if pool.sets(field_type).is_empty() {
            return Err(Error::InvalidPool(format!(
                "field type '{field_type}' has an empty sample list"
            )));
        }
    }
    Ok(())
}

fn check_weights(weights: &WeightMap, context: impl Fn() -> String) -> Result<()> {
    if weights.is_empty() {
        return Ok(());
    }
    if weights.values().all(|weight| *weight == 0) {
        return Err(Error::InvalidSchema(format!(
            "{} has a zero weight sum",
            context()
        )));
    }
    Ok(())
}
