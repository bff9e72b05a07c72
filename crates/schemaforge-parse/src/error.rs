use thiserror::Error;

/// Problems found while turning source text into a schema.
///
/// Parsers collect these instead of failing; the partial schema built so far
/// is returned next to them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// A construct the parser recognises but cannot represent, such as a
    /// table name computed at runtime.
    #[error("unsupported token: {0}")]
    UnsupportedToken(String),
    /// Input that does not follow the grammar of the format.
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    /// The document is not well-formed JSON or YAML.
    #[error("invalid json: {0}")]
    InvalidJson(String),
    /// The document is well-formed but violates the format's schema.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
