//! Patch/operation vocabulary for schemaforge schemas.
//!
//! Operations are JSON-Patch style (`add`/`remove`/`replace`) and addressed
//! by slash-delimited paths. [`SchemaOperation`] is the validated, typed view;
//! [`apply_patch_operations`] applies raw operations without touching the input.

pub mod apply;
pub mod errors;
pub mod operation;
pub mod path;
pub mod validate;

pub use apply::{apply_patch_operations, apply_to_schema};
pub use errors::{IssueSeverity, OperationError, PatchError, ValidationIssue, ValidationReport};
pub use operation::*;
pub use path::{MatchedPath, PathKind, PathScope, SchemaPath, classify_path, match_path, pointer};
pub use validate::{operations_json_schema, validate_operations, validate_operations_json};
