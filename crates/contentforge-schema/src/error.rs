use thiserror::Error;

/// Core error type shared across Contentforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema document violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The sample-data pool violates internal invariants.
    #[error("invalid sample pool: {0}")]
    InvalidPool(String),
    /// Failed to read an input document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse an input document.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by Contentforge crates.
pub type Result<T> = std::result::Result<T, Error>;
