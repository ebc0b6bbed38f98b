//! Core contracts for Contentforge.
//!
//! This crate defines the canonical content-schema and sample-pool types
//! shared between the generation engine, the bulk importer, and the CLI.

pub mod error;
pub mod samples;
pub mod schema;
pub mod validation;

pub use error::{Error, Result};
pub use samples::{SamplePool, SampleSet};
pub use schema::{
    BundleSchema, ContentSchema, EntityTypeSchema, FieldSchema, ReferenceKind, ReferenceSchema,
    WeightMap,
};
pub use validation::{validate_pool, validate_schema};

/// Entity type whose instances are owned sub-objects and never reused as
/// reference targets.
pub const PARAGRAPH_TYPE: &str = "paragraph";
