use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::errors::{OperationError, ValidationIssue, ValidationReport};
use crate::operation::{Operation, SchemaOperation};

/// Emit the JSON Schema for an operation list document.
pub fn operations_json_schema() -> RootSchema {
    schema_for!(Vec<Operation>)
}

/// Validate an operation list document against the operation JSON Schema.
pub fn validate_operations_json(document: &Value) -> Result<ValidationReport, OperationError> {
    let schema = serde_json::to_value(operations_json_schema())
        .map_err(|err| OperationError::Schema(err.to_string()))?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| OperationError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate a document end-to-end: structure first, then each operation
/// against the path grammar and value shapes.
pub fn validate_operations(document: &Value) -> Result<Vec<SchemaOperation>, ValidationReport> {
    let structural = match validate_operations_json(document) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let operations: Vec<Operation> = match serde_json::from_value(document.clone()) {
        Ok(operations) => operations,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "invalid_operations_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    let mut report = ValidationReport::default();
    let mut typed = Vec::with_capacity(operations.len());

    for (idx, operation) in operations.iter().enumerate() {
        match SchemaOperation::try_from(operation) {
            Ok(op) => typed.push(op),
            Err(err) => report.push_error(ValidationIssue::error(
                issue_code(&err),
                format!("/{idx}"),
                err.to_string(),
                issue_hint(&err),
            )),
        }
    }

    if report.is_ok() { Ok(typed) } else { Err(report) }
}

fn issue_code(err: &OperationError) -> &'static str {
    match err {
        OperationError::InvalidPath(_) => "invalid_path",
        OperationError::UnmatchedPath(_) => "unmatched_path",
        OperationError::UnsupportedOp { .. } => "unsupported_op",
        OperationError::MissingValue(_) => "missing_value",
        OperationError::InvalidValue { .. } => "invalid_value",
        OperationError::NameMismatch { .. } => "name_mismatch",
        OperationError::Schema(_) => "schema_validation_error",
    }
}

fn issue_hint(err: &OperationError) -> Option<String> {
    match err {
        OperationError::UnmatchedPath(_) => Some(
            "paths are rooted at /tables/{table}, /enums/{enum} or /extensions/{extension}"
                .to_string(),
        ),
        OperationError::UnsupportedOp { .. } => {
            Some("properties accept add/replace; entities accept add/remove/replace".to_string())
        }
        OperationError::NameMismatch { .. } => {
            Some("the entity name must equal the last path segment".to_string())
        }
        _ => None,
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structural_errors_carry_pointer() {
        let document = json!([{ "op": "move", "path": "/tables/users" }]);
        let report = validate_operations_json(&document).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].code, "schema_violation");
        assert!(report.errors[0].path.starts_with("/0"));
    }

    #[test]
    fn grammar_errors_are_reported_per_operation() {
        let document = json!([
            { "op": "remove", "path": "/tables/users" },
            { "op": "remove", "path": "/tables/users/columns" }
        ]);
        let report = validate_operations(&document).unwrap_err();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "/1");
        assert_eq!(report.errors[0].code, "unmatched_path");
        assert!(report.errors[0].hint.is_some());
    }

    #[test]
    fn valid_document_yields_typed_operations() {
        let document = json!([
            { "op": "replace", "path": "/tables/users/columns/id/type", "value": "uuid" },
            { "op": "remove", "path": "/enums/status" }
        ]);
        let typed = validate_operations(&document).unwrap();
        assert_eq!(typed.len(), 2);
        assert_eq!(typed[0].table_name(), Some("users"));
        assert_eq!(typed[1].table_name(), None);
    }
}
