//! Parallel bulk-load orchestrator for Contentforge.
//!
//! Partitions a directory of per-table CSV files across a fixed-size pool
//! of independent workers, each loading its files into MySQL over its own
//! session via `LOAD DATA LOCAL INFILE`.

pub mod errors;
pub mod orchestrator;
pub mod partition;
pub mod sink;

pub use errors::ImportError;
pub use orchestrator::{ImportOptions, ImportReport, Importer};
pub use partition::{default_worker_count, discover_table_files, partition_by_size, TableFile};
pub use sink::{BulkSink, MySqlSink};
