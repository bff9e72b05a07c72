use thiserror::Error;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new error-level issue.
    pub fn error(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }
}

/// An operation does not fit any recognized path/value shape.
#[derive(Debug, Error, PartialEq)]
pub enum OperationError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("path does not match any known pattern: {0}")]
    UnmatchedPath(String),
    #[error("operation '{op}' is not allowed on {path}")]
    UnsupportedOp { op: String, path: String },
    #[error("operation on {0} requires a value")]
    MissingValue(String),
    #[error("invalid value at {path}: {message}")]
    InvalidValue { path: String, message: String },
    #[error("name mismatch at {path}: path names '{expected}' but value is named '{found}'")]
    NameMismatch {
        path: String,
        expected: String,
        found: String,
    },
    #[error("json schema error: {0}")]
    Schema(String),
}

/// Structural precondition violated while applying a patch.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("parent path does not exist: {0}")]
    ParentNotFound(String),
    #[error("path does not exist: {0}")]
    PathNotFound(String),
    #[error("parent of {0} is not an object or array")]
    NotAContainer(String),
    #[error("invalid array index at {0}")]
    InvalidIndex(String),
    #[error("operation on {0} requires a value")]
    MissingValue(String),
    #[error("patched document is not a valid schema: {0}")]
    InvalidSchema(#[from] serde_json::Error),
}
