use schemaforge_core::Schema;
use serde_json::Value;

use crate::result::{DeparseError, DeparseResult};

/// Serialize a schema as YAML, leaving out null fields.
pub fn yaml_schema_deparser(schema: &Schema) -> DeparseResult {
    let value = match serde_json::to_value(schema) {
        Ok(value) => strip_nulls(value),
        Err(err) => return DeparseResult::failed(DeparseError::new(err.to_string())),
    };
    match serde_yaml::to_string(&value) {
        Ok(text) => DeparseResult::ok(text),
        Err(err) => DeparseResult::failed(DeparseError::new(err.to_string())),
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key, strip_nulls(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_nested_nulls_only_from_objects() {
        let value = json!({ "a": null, "b": { "c": null, "d": 1 }, "e": [null, 2] });
        assert_eq!(strip_nulls(value), json!({ "b": { "d": 1 }, "e": [null, 2] }));
    }
}
