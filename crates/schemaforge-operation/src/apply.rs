use schemaforge_core::Schema;
use serde_json::Value;

use crate::errors::PatchError;
use crate::operation::{Operation, OperationKind};
use crate::path::SchemaPath;

/// Apply operations to a copy of `target`.
///
/// The input is never modified. `add` and `replace` require the parent of the
/// addressed path to exist; `remove` requires the path itself to exist. The
/// first failing operation aborts the whole batch.
pub fn apply_patch_operations(
    target: &Value,
    operations: &[Operation],
) -> Result<Value, PatchError> {
    let mut document = target.clone();
    for operation in operations {
        apply_operation(&mut document, operation)?;
    }
    tracing::debug!(event = "patch_applied", operations = operations.len());
    Ok(document)
}

/// Apply operations to a schema through its JSON form.
pub fn apply_to_schema(schema: &Schema, operations: &[Operation]) -> Result<Schema, PatchError> {
    let document = serde_json::to_value(schema)?;
    let patched = apply_patch_operations(&document, operations)?;
    Ok(serde_json::from_value(patched)?)
}

fn apply_operation(document: &mut Value, operation: &Operation) -> Result<(), PatchError> {
    let path = SchemaPath::parse(&operation.path)
        .map_err(|_| PatchError::InvalidPath(operation.path.clone()))?;

    let Some(parent_path) = path.parent() else {
        return match operation.op {
            OperationKind::Add | OperationKind::Replace => {
                *document = required_value(operation)?.clone();
                Ok(())
            }
            OperationKind::Remove => Err(PatchError::PathNotFound(operation.path.clone())),
        };
    };
    let key = path.last().unwrap_or_default();

    let parent = resolve_mut(document, &parent_path)
        .ok_or_else(|| PatchError::ParentNotFound(parent_path.to_pointer()))?;

    match parent {
        Value::Object(map) => match operation.op {
            OperationKind::Add | OperationKind::Replace => {
                map.insert(key.to_string(), required_value(operation)?.clone());
                Ok(())
            }
            OperationKind::Remove => map
                .shift_remove(key)
                .map(|_| ())
                .ok_or_else(|| PatchError::PathNotFound(operation.path.clone())),
        },
        Value::Array(items) => {
            let len = items.len();
            match operation.op {
                OperationKind::Add => {
                    let value = required_value(operation)?.clone();
                    if key == "-" {
                        items.push(value);
                        return Ok(());
                    }
                    let index = array_index(key, &operation.path)?;
                    if index > len {
                        return Err(PatchError::InvalidIndex(operation.path.clone()));
                    }
                    items.insert(index, value);
                    Ok(())
                }
                OperationKind::Replace => {
                    let index = array_index(key, &operation.path)?;
                    let slot = items
                        .get_mut(index)
                        .ok_or_else(|| PatchError::PathNotFound(operation.path.clone()))?;
                    *slot = required_value(operation)?.clone();
                    Ok(())
                }
                OperationKind::Remove => {
                    let index = array_index(key, &operation.path)?;
                    if index >= len {
                        return Err(PatchError::PathNotFound(operation.path.clone()));
                    }
                    items.remove(index);
                    Ok(())
                }
            }
        }
        _ => Err(PatchError::NotAContainer(operation.path.clone())),
    }
}

fn resolve_mut<'a>(document: &'a mut Value, path: &SchemaPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(document, |node, segment| match node {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(move |index| items.get_mut(index)),
            _ => None,
        })
}

fn array_index(segment: &str, path: &str) -> Result<usize, PatchError> {
    if segment.len() > 1 && segment.starts_with('0') {
        return Err(PatchError::InvalidIndex(path.to_string()));
    }
    segment
        .parse::<usize>()
        .map_err(|_| PatchError::InvalidIndex(path.to_string()))
}

fn required_value(operation: &Operation) -> Result<&Value, PatchError> {
    operation
        .value
        .as_ref()
        .ok_or_else(|| PatchError::MissingValue(operation.path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaforge_core::{Column, Table};
    use serde_json::json;

    #[test]
    fn add_under_missing_parent_fails_without_mutation() {
        let target = json!({});
        let ops = vec![Operation::add("/user/profile/name", json!("John"))];

        let result = apply_patch_operations(&target, &ops);
        match result {
            Err(PatchError::ParentNotFound(parent)) => assert_eq!(parent, "/user/profile"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(target, json!({}));
    }

    #[test]
    fn applies_operations_immutably() {
        let target = json!({ "user": { "name": "Ann", "tags": ["a", "c"] } });
        let ops = vec![
            Operation::replace("/user/name", json!("Bea")),
            Operation::add("/user/tags/1", json!("b")),
            Operation::add("/user/tags/-", json!("d")),
            Operation::add("/user/age", json!(30)),
        ];

        let patched = apply_patch_operations(&target, &ops).unwrap();
        assert_eq!(
            patched,
            json!({ "user": { "name": "Bea", "tags": ["a", "b", "c", "d"], "age": 30 } })
        );
        assert_eq!(target["user"]["name"], "Ann");
    }

    #[test]
    fn remove_missing_path_fails() {
        let target = json!({ "a": { "b": 1 } });
        assert!(matches!(
            apply_patch_operations(&target, &[Operation::remove("/a/c")]),
            Err(PatchError::PathNotFound(_))
        ));
        assert!(matches!(
            apply_patch_operations(&target, &[Operation::remove("/a/b/0")]),
            Err(PatchError::NotAContainer(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_array_index() {
        let target = json!({ "items": [1] });
        assert!(matches!(
            apply_patch_operations(&target, &[Operation::add("/items/5", json!(2))]),
            Err(PatchError::InvalidIndex(_))
        ));
        assert!(matches!(
            apply_patch_operations(&target, &[Operation::remove("/items/01")]),
            Err(PatchError::InvalidIndex(_))
        ));
    }

    #[test]
    fn applies_typed_schema_operations() {
        let mut users = Table::new("users");
        users.insert_column(Column::new("id", "bigint"));
        let mut schema = Schema::default();
        schema.insert_table(users);

        let ops = vec![
            Operation::add(
                "/tables/users/columns/email",
                json!({ "name": "email", "type": "text", "notNull": true }),
            ),
            Operation::replace("/tables/users/comment", json!("people")),
        ];

        let patched = apply_to_schema(&schema, &ops).unwrap();
        let users = &patched.tables["users"];
        assert_eq!(users.comment.as_deref(), Some("people"));
        assert!(users.columns["email"].not_null);
        assert!(schema.tables["users"].columns.get("email").is_none());
    }
}
