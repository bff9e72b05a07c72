use schemaforge_core::Schema;

use crate::error::ProcessError;
use crate::result::ProcessResult;

/// Read a schema serialized in the canonical JSON shape.
pub fn process_json(source: &str) -> ProcessResult {
    match serde_json::from_str::<Schema>(source) {
        Ok(schema) => ProcessResult::new(schema, Vec::new()),
        Err(err) if err.is_data() => failed(ProcessError::InvalidSchema(err.to_string())),
        Err(err) => failed(ProcessError::InvalidJson(err.to_string())),
    }
}

/// Read a schema serialized in the canonical YAML shape, as written by the
/// YAML deparser. Omitted optional fields fall back to their defaults.
pub fn process_yaml(source: &str) -> ProcessResult {
    let document: serde_yaml::Value = match serde_yaml::from_str(source) {
        Ok(document) => document,
        Err(err) => return failed(ProcessError::InvalidJson(err.to_string())),
    };
    match serde_yaml::from_value::<Schema>(document) {
        Ok(schema) => ProcessResult::new(schema, Vec::new()),
        Err(err) => failed(ProcessError::InvalidSchema(err.to_string())),
    }
}

fn failed(error: ProcessError) -> ProcessResult {
    ProcessResult::new(Schema::default(), vec![error])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_canonical_json() {
        let source = r#"{
            "tables": {
                "users": {
                    "name": "users",
                    "columns": { "id": { "name": "id", "type": "bigint", "notNull": true } }
                }
            },
            "enums": {}
        }"#;
        let result = process_json(source);
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.value.tables["users"].columns["id"].not_null);
    }

    #[test]
    fn classifies_json_failures() {
        assert!(matches!(
            process_json("{ not json").errors[0],
            ProcessError::InvalidJson(_)
        ));
        assert!(matches!(
            process_json(r#"{ "tables": [] }"#).errors[0],
            ProcessError::InvalidSchema(_)
        ));
    }

    #[test]
    fn reads_yaml_without_nulls() {
        let source = "tables:\n  users:\n    name: users\n    columns:\n      id:\n        name: id\n        type: bigint\n        primary: true\nenums: {}\n";
        let result = process_yaml(source);
        assert!(result.is_ok(), "{:?}", result.errors);
        let id = &result.value.tables["users"].columns["id"];
        assert!(id.primary);
        assert_eq!(id.default, None);
    }
}
