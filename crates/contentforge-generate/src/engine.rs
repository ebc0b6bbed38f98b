use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use contentforge_schema::{validate_pool, validate_schema, ContentSchema, SamplePool};

use crate::errors::GenerationError;
use crate::generator::EntityGraphGenerator;
use crate::model::{GenerateOptions, GenerationReport};
use crate::sink::TableSink;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Directory holding one CSV file per table plus the run report.
    pub run_dir: PathBuf,
    pub report: GenerationReport,
}

/// Entry point for generating table files from schema + sample pool.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Walk every entity type and bundle in schema order, creating each
    /// bundle's outstanding quota and flushing all table files.
    pub fn run(
        &self,
        schema: &ContentSchema,
        pool: &SamplePool,
    ) -> Result<GenerationResult, GenerationError> {
        validate_schema(schema)?;
        validate_pool(pool)?;

        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_dir = self.options.out_dir.join(format!("run_{run_id}"));
        let mut sink = TableSink::create(run_dir.clone())?;
        let mut generator = EntityGraphGenerator::new(schema, pool, self.options.seed);

        info!(
            run_id = %run_id,
            seed = self.options.seed,
            entity_types = schema.entity_types.len(),
            "generation started"
        );

        for (entity_type, entity) in &schema.entity_types {
            for (bundle, bundle_schema) in &entity.bundles {
                let created = generator.created_count(entity_type, bundle);
                if created >= bundle_schema.instances {
                    // Reference fan-out from earlier bundles already filled
                    // this quota.
                    continue;
                }
                let remaining = bundle_schema.instances - created;
                info!(
                    entity_type = %entity_type,
                    bundle = %bundle,
                    instances = remaining,
                    "generating bundle"
                );
                generator.create_bundle(&mut sink, entity_type, bundle, remaining, None)?;
            }
        }

        sink.flush_all()?;

        let report = GenerationReport {
            run_id: run_id.clone(),
            seed: self.options.seed,
            requested: generator.requested_counts().clone(),
            created: generator.created_counts(),
            tables: sink.row_counts().clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let report_path = run_dir.join("generation_report.json");
        std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;

        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult { run_dir, report })
    }
}
