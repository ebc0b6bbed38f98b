use std::collections::{BTreeMap, HashMap};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::debug;

use contentforge_schema::{
    BundleSchema, ContentSchema, EntityTypeSchema, ReferenceSchema, SamplePool, SampleSet,
    WeightMap, PARAGRAPH_TYPE,
};

use crate::errors::GenerationError;
use crate::sampler::{pick_weighted, sample_from_pool};
use crate::sink::TableSink;
use crate::template::{build_templates, cell_text, EntityVariant, RowTemplate};

/// Linkage from an owned instance back to the entity that embeds it.
#[derive(Debug, Clone)]
pub struct ParentLink {
    pub id: u64,
    pub entity_type: String,
    pub field_name: String,
}

/// One `(entity type, bundle)` pair currently being generated on the call
/// path. Presence blocks re-entrant generation of the same bundle.
#[derive(Debug)]
struct ActiveFrame {
    entity_type: String,
    bundle: String,
    parent: Option<ParentLink>,
}

/// Mutable state for one generation run.
///
/// Owned exclusively by the generator, created at run start and discarded
/// at the end; never global.
#[derive(Debug)]
struct GenerationContext {
    rng: ChaCha8Rng,
    /// Cumulative instances requested per bundle, including reused targets.
    requested: BTreeMap<String, BTreeMap<String, u64>>,
    /// Monotonic id sequence per entity type; ids start at 1.
    total_count: BTreeMap<String, u64>,
    /// Ids actually created per bundle, in creation order.
    created_ids: BTreeMap<String, BTreeMap<String, Vec<u64>>>,
    active: Vec<ActiveFrame>,
    /// First-seen orders used for deterministic UUID derivation.
    type_order: Vec<String>,
    bundle_order: BTreeMap<String, Vec<String>>,
}

impl GenerationContext {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            requested: BTreeMap::new(),
            total_count: BTreeMap::new(),
            created_ids: BTreeMap::new(),
            active: Vec::new(),
            type_order: Vec::new(),
            bundle_order: BTreeMap::new(),
        }
    }

    fn register(&mut self, entity_type: &str, bundle: &str) {
        if !self.type_order.iter().any(|name| name == entity_type) {
            self.type_order.push(entity_type.to_string());
        }
        self.total_count.entry(entity_type.to_string()).or_insert(1);

        let bundles = self.bundle_order.entry(entity_type.to_string()).or_default();
        if !bundles.iter().any(|name| name == bundle) {
            bundles.push(bundle.to_string());
        }
    }

    fn add_requested(&mut self, entity_type: &str, bundle: &str, count: u64) {
        *self
            .requested
            .entry(entity_type.to_string())
            .or_default()
            .entry(bundle.to_string())
            .or_insert(0) += count;
    }

    fn next_id(&mut self, entity_type: &str) -> u64 {
        let counter = self.total_count.entry(entity_type.to_string()).or_insert(1);
        let id = *counter;
        *counter += 1;
        id
    }

    fn is_active(&self, entity_type: &str, bundle: &str) -> bool {
        self.active
            .iter()
            .any(|frame| frame.entity_type == entity_type && frame.bundle == bundle)
    }

    fn push_created(&mut self, entity_type: &str, bundle: &str, id: u64) {
        self.created_ids
            .entry(entity_type.to_string())
            .or_default()
            .entry(bundle.to_string())
            .or_default()
            .push(id);
    }

    fn created(&self, entity_type: &str, bundle: &str) -> &[u64] {
        self.created_ids
            .get(entity_type)
            .and_then(|bundles| bundles.get(bundle))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn created_count(&self, entity_type: &str, bundle: &str) -> u64 {
        self.created(entity_type, bundle).len() as u64
    }

    fn type_index(&self, entity_type: &str) -> usize {
        self.type_order
            .iter()
            .position(|name| name == entity_type)
            .unwrap_or_default()
    }

    fn bundle_index(&self, entity_type: &str, bundle: &str) -> usize {
        self.bundle_order
            .get(entity_type)
            .and_then(|bundles| bundles.iter().position(|name| name == bundle))
            .unwrap_or_default()
    }
}

/// Recursive entity/bundle instantiation engine.
///
/// Owns the id counters, per-bundle id registries, and the active stack
/// used for cycle avoidance. Recursion depth is bounded by the number of
/// distinct `(entity type, bundle)` pairs in the schema.
pub struct EntityGraphGenerator<'a> {
    schema: &'a ContentSchema,
    pool: &'a SamplePool,
    templates: HashMap<String, BTreeMap<String, RowTemplate>>,
    ctx: GenerationContext,
}

impl<'a> EntityGraphGenerator<'a> {
    pub fn new(schema: &'a ContentSchema, pool: &'a SamplePool, seed: u64) -> Self {
        Self {
            schema,
            pool,
            templates: HashMap::new(),
            ctx: GenerationContext::new(seed),
        }
    }

    /// Ids actually created so far for a bundle.
    pub fn created_count(&self, entity_type: &str, bundle: &str) -> u64 {
        self.ctx.created_count(entity_type, bundle)
    }

    /// Created-instance tallies per entity type and bundle.
    pub fn created_counts(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.ctx
            .created_ids
            .iter()
            .map(|(entity_type, bundles)| {
                let counts = bundles
                    .iter()
                    .map(|(bundle, ids)| (bundle.clone(), ids.len() as u64))
                    .collect();
                (entity_type.clone(), counts)
            })
            .collect()
    }

    /// Cumulative requested tallies, including reused targets.
    pub fn requested_counts(&self) -> &BTreeMap<String, BTreeMap<String, u64>> {
        &self.ctx.requested
    }

    /// Create `count` instances of a bundle, writing every produced row to
    /// the sink, and return the ids created by this call.
    ///
    /// Re-entrant calls for a bundle already on the active stack return an
    /// empty id list; the cycle is not an error.
    pub fn create_bundle(
        &mut self,
        sink: &mut TableSink,
        entity_type: &str,
        bundle: &str,
        count: u64,
        parent: Option<ParentLink>,
    ) -> Result<Vec<u64>, GenerationError> {
        let schema = self.schema;
        let entity = schema.entity_type(entity_type).ok_or_else(|| {
            GenerationError::Model(format!("unknown entity type '{entity_type}'"))
        })?;
        let bundle_schema = entity.bundles.get(bundle).ok_or_else(|| {
            GenerationError::Model(format!("unknown bundle '{entity_type}.{bundle}'"))
        })?;

        self.ctx.register(entity_type, bundle);
        self.ctx.add_requested(entity_type, bundle, count);

        if self.ctx.is_active(entity_type, bundle) {
            debug!(entity_type, bundle, "cycle guard: bundle already active");
            return Ok(Vec::new());
        }

        self.ctx.active.push(ActiveFrame {
            entity_type: entity_type.to_string(),
            bundle: bundle.to_string(),
            parent,
        });
        let result = self.generate_instances(sink, entity_type, entity, bundle, bundle_schema, count);
        self.ctx.active.pop();

        result
    }

    fn generate_instances(
        &mut self,
        sink: &mut TableSink,
        entity_type: &str,
        entity: &EntityTypeSchema,
        bundle: &str,
        bundle_schema: &BundleSchema,
        count: u64,
    ) -> Result<Vec<u64>, GenerationError> {
        let variant = EntityVariant::for_entity_type(entity_type);
        let templates = self.templates_for(entity_type, entity);
        let hierarchy_tables = variant.hierarchy_tables(entity_type);

        let mut new_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = self.ctx.next_id(entity_type);
            let uuid = self.derive_uuid(entity_type, bundle, id);
            let label = format!("{bundle} {id}");

            let mut rows = templates.clone();
            for template in rows.values_mut() {
                apply_entity_keys(template, entity, bundle, id, &uuid, &label);
            }

            let parent = self
                .ctx
                .active
                .last()
                .and_then(|frame| frame.parent.clone());
            variant.alter_rows(&mut rows, parent.as_ref(), self.pool, &mut self.ctx.rng);

            for (table, template) in &rows {
                sink.write(table, template.columns(), &template.record())?;
            }
            for table in &hierarchy_tables {
                let (columns, record) = hierarchy_row(bundle, id);
                sink.write(table, &columns, &record)?;
            }

            self.ctx.push_created(entity_type, bundle, id);
            new_ids.push(id);
        }

        self.generate_own_fields(sink, bundle, bundle_schema, &new_ids)?;
        self.generate_reference_fields(sink, entity_type, bundle, bundle_schema, &new_ids)?;

        Ok(new_ids)
    }

    /// Non-reference fields: one sampled value-set per new entity, written
    /// to the field table and its revision copy.
    fn generate_own_fields(
        &mut self,
        sink: &mut TableSink,
        bundle: &str,
        bundle_schema: &BundleSchema,
        ids: &[u64],
    ) -> Result<(), GenerationError> {
        for field in bundle_schema.fields.iter().filter(|field| !field.is_reference()) {
            for id in ids {
                let Some(sample) =
                    sample_from_pool(self.pool, &field.field_type, &mut self.ctx.rng)
                else {
                    // Unknown field type in the pool: skip silently.
                    continue;
                };
                let (columns, record) = value_field_row(bundle, *id, &field.field_type, sample);
                sink.write(&field.table, &columns, &record)?;
                sink.write(&field.revision_table, &columns, &record)?;
            }
        }
        Ok(())
    }

    /// Reference fields: weighted fan-out per entity, weighted target
    /// bundle pick, reuse-or-create target resolution.
    fn generate_reference_fields(
        &mut self,
        sink: &mut TableSink,
        entity_type: &str,
        bundle: &str,
        bundle_schema: &BundleSchema,
        ids: &[u64],
    ) -> Result<(), GenerationError> {
        for field in &bundle_schema.fields {
            let Some(reference) = &field.reference else {
                continue;
            };
            if reference.histogram.is_empty() {
                // No fan-out distribution: the field is skipped entirely.
                continue;
            }
            let eligible = self.eligible_target_bundles(reference);
            if eligible.is_empty() {
                continue;
            }

            for id in ids {
                let Some(fanout_key) = pick_weighted(&mut self.ctx.rng, &reference.histogram)
                else {
                    continue;
                };
                let fanout: u64 = fanout_key.parse().map_err(|_| {
                    GenerationError::Model(format!(
                        "non-numeric fan-out '{fanout_key}' in histogram of '{}'",
                        field.field_name
                    ))
                })?;

                let mut delta = 0_u64;
                for _ in 0..fanout {
                    let Some(target_bundle) = pick_weighted(&mut self.ctx.rng, &eligible) else {
                        break;
                    };
                    let target_bundle = target_bundle.to_string();
                    if self.ctx.is_active(&reference.target_type, &target_bundle) {
                        // Reference-level cycle protection.
                        continue;
                    }

                    let targets = self.resolve_reference_target(
                        sink,
                        &reference.target_type,
                        &target_bundle,
                        1,
                        *id,
                        entity_type,
                        &field.field_name,
                    )?;
                    for target in targets {
                        let (columns, record) = reference_field_row(
                            bundle,
                            *id,
                            delta,
                            &field.field_type,
                            target,
                            reference.reference.is_revision_aware(),
                        );
                        sink.write(&field.table, &columns, &record)?;
                        sink.write(&field.revision_table, &columns, &record)?;
                        delta += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Reuse-vs-create policy for reference targets.
    ///
    /// Once a target bundle met its instance quota, references are
    /// satisfied by uniform sampling (without replacement within one draw)
    /// from the already-created ids. Paragraphs are owned sub-objects and
    /// are always created fresh.
    fn resolve_reference_target(
        &mut self,
        sink: &mut TableSink,
        target_type: &str,
        target_bundle: &str,
        n: u64,
        parent_id: u64,
        parent_type: &str,
        parent_field: &str,
    ) -> Result<Vec<u64>, GenerationError> {
        let quota = self
            .schema
            .entity_type(target_type)
            .and_then(|entity| entity.bundles.get(target_bundle))
            .map(|bundle| bundle.instances)
            .ok_or_else(|| {
                GenerationError::Model(format!(
                    "unknown reference target '{target_type}.{target_bundle}'"
                ))
            })?;

        let created = self.ctx.created_count(target_type, target_bundle);
        if created >= quota && target_type != PARAGRAPH_TYPE {
            let len = created as usize;
            let take = (n as usize).min(len);
            if take == 0 {
                return Ok(Vec::new());
            }
            let picks = rand::seq::index::sample(&mut self.ctx.rng, len, take).into_vec();
            let ids = self.ctx.created(target_type, target_bundle);
            return Ok(picks.into_iter().map(|index| ids[index]).collect());
        }

        let parent = ParentLink {
            id: parent_id,
            entity_type: parent_type.to_string(),
            field_name: parent_field.to_string(),
        };
        self.create_bundle(sink, target_type, target_bundle, n, Some(parent))
    }

    /// Target bundles a reference may point at: quota above zero, filtered
    /// and weighted by the field's allow-list when present, weight 1 each
    /// otherwise.
    fn eligible_target_bundles(&self, reference: &ReferenceSchema) -> WeightMap {
        let Some(target) = self.schema.entity_type(&reference.target_type) else {
            return WeightMap::new();
        };

        let mut eligible = WeightMap::new();
        match &reference.target_bundles {
            Some(allowed) => {
                for (bundle, weight) in allowed {
                    let quota = target
                        .bundles
                        .get(bundle)
                        .map(|bundle| bundle.instances)
                        .unwrap_or(0);
                    if quota > 0 && *weight > 0 {
                        eligible.insert(bundle.clone(), *weight);
                    }
                }
            }
            None => {
                for (bundle, schema) in &target.bundles {
                    if schema.instances > 0 {
                        eligible.insert(bundle.clone(), 1);
                    }
                }
            }
        }
        eligible
    }

    fn templates_for(
        &mut self,
        entity_type: &str,
        entity: &EntityTypeSchema,
    ) -> BTreeMap<String, RowTemplate> {
        if let Some(cached) = self.templates.get(entity_type) {
            return cached.clone();
        }
        let built = build_templates(entity);
        self.templates.insert(entity_type.to_string(), built.clone());
        built
    }

    /// UUID-shaped deterministic identifier derived from the first-seen
    /// type index, the bundle index within the type, and the entity id.
    fn derive_uuid(&self, entity_type: &str, bundle: &str, id: u64) -> String {
        let type_index = self.ctx.type_index(entity_type);
        let bundle_index = self.ctx.bundle_index(entity_type, bundle);
        format!("{type_index:08}-{bundle_index:04}-0000-0000-{id:012}")
    }
}

fn apply_entity_keys(
    template: &mut RowTemplate,
    entity: &EntityTypeSchema,
    bundle: &str,
    id: u64,
    uuid: &str,
    label: &str,
) {
    let values = [
        ("id", Value::from(id)),
        ("revision", Value::from(id)),
        ("uuid", Value::from(uuid)),
        ("bundle", Value::from(bundle)),
        ("label", Value::from(label)),
    ];
    for (key, value) in values {
        if let Some(column) = entity.key_column(key) {
            template.set(column, value);
        }
    }
}

fn field_prelude(bundle: &str, id: u64, delta: u64) -> (Vec<String>, Vec<String>) {
    let columns = vec![
        "bundle".to_string(),
        "entity_id".to_string(),
        "revision_id".to_string(),
        "langcode".to_string(),
        "delta".to_string(),
    ];
    let record = vec![
        bundle.to_string(),
        id.to_string(),
        id.to_string(),
        "en".to_string(),
        delta.to_string(),
    ];
    (columns, record)
}

fn value_field_row(
    bundle: &str,
    id: u64,
    field_type: &str,
    sample: &SampleSet,
) -> (Vec<String>, Vec<String>) {
    let (mut columns, mut record) = field_prelude(bundle, id, 0);
    for (key, value) in sample {
        columns.push(format!("{field_type}_{key}"));
        record.push(cell_text(value));
    }
    (columns, record)
}

fn reference_field_row(
    bundle: &str,
    id: u64,
    delta: u64,
    field_type: &str,
    target_id: u64,
    revision_aware: bool,
) -> (Vec<String>, Vec<String>) {
    let (mut columns, mut record) = field_prelude(bundle, id, delta);
    columns.push(format!("{field_type}_target_id"));
    record.push(target_id.to_string());
    if revision_aware {
        columns.push(format!("{field_type}_target_revision_id"));
        record.push(target_id.to_string());
    }
    (columns, record)
}

fn hierarchy_row(bundle: &str, id: u64) -> (Vec<String>, Vec<String>) {
    let (mut columns, mut record) = field_prelude(bundle, id, 0);
    columns.push("parent_target_id".to_string());
    record.push("0".to_string());
    (columns, record)
}
