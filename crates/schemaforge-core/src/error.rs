use thiserror::Error;

/// Core error type shared across schemaforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A requested feature is not yet supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The schema could not be converted to or from JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by schemaforge crates.
pub type Result<T> = std::result::Result<T, Error>;
