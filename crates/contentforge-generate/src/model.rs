use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory where run artifacts are written.
    pub out_dir: PathBuf,
    /// Seed for the run RNG; a fixed seed reproduces table files
    /// byte-for-byte.
    pub seed: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            seed: 0,
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    /// Cumulative instances requested per entity type and bundle,
    /// including reused reference targets.
    pub requested: BTreeMap<String, BTreeMap<String, u64>>,
    /// Instances actually created per entity type and bundle.
    pub created: BTreeMap<String, BTreeMap<String, u64>>,
    /// Rows written per table file.
    pub tables: BTreeMap<String, u64>,
    pub duration_ms: u64,
}
