use thiserror::Error;

/// A schema entity or operation that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeparseError {
    pub message: String,
}

impl DeparseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rendered text plus the problems met while rendering it.
///
/// `value` holds whatever could be rendered; it may be partial or empty when
/// `errors` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeparseResult {
    pub value: String,
    pub errors: Vec<DeparseError>,
}

impl DeparseResult {
    pub fn ok(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            errors: Vec::new(),
        }
    }

    pub fn failed(error: DeparseError) -> Self {
        Self {
            value: String::new(),
            errors: vec![error],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
