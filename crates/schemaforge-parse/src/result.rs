use schemaforge_core::Schema;

use crate::error::ProcessError;

/// Outcome of parsing one source document.
///
/// `value` always holds the best-effort schema assembled so far, even when
/// `errors` is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    pub value: Schema,
    pub errors: Vec<ProcessError>,
}

impl ProcessResult {
    pub fn new(value: Schema, errors: Vec<ProcessError>) -> Self {
        Self { value, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
