use schemaforge_operation::{Operation, SchemaPath};
use serde_json::Value;

/// Structural JSON-Patch between two plain JSON trees.
///
/// Objects are compared key by key and arrays index by index. Removals are
/// emitted last-key-first so that applying the patch in order never shifts an
/// array index that a later removal still refers to. Containers of different
/// kinds are replaced wholesale.
pub fn compare(before: &Value, after: &Value) -> Vec<Operation> {
    let mut operations = Vec::new();
    let root = SchemaPath::from_segments(Vec::<String>::new());
    generate(before, after, &root, &mut operations);
    operations
}

fn generate(before: &Value, after: &Value, path: &SchemaPath, operations: &mut Vec<Operation>) {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            let mut removed = false;
            for (key, old_value) in old.iter().rev() {
                let child = path.child(key.as_str());
                match new.get(key) {
                    Some(new_value) => diff_child(old_value, new_value, &child, operations),
                    None => {
                        operations.push(Operation::remove(child.to_pointer()));
                        removed = true;
                    }
                }
            }

            if !removed && old.len() == new.len() {
                return;
            }

            for (key, new_value) in new {
                if !old.contains_key(key) {
                    operations.push(Operation::add(
                        path.child(key.as_str()).to_pointer(),
                        new_value.clone(),
                    ));
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            for index in (0..old.len()).rev() {
                let child = path.child(index.to_string());
                match new.get(index) {
                    Some(new_value) => diff_child(&old[index], new_value, &child, operations),
                    None => operations.push(Operation::remove(child.to_pointer())),
                }
            }
            for (index, new_value) in new.iter().enumerate().skip(old.len()) {
                operations.push(Operation::add(
                    path.child(index.to_string()).to_pointer(),
                    new_value.clone(),
                ));
            }
        }
        _ if before != after => {
            operations.push(Operation::replace(path.to_pointer(), after.clone()));
        }
        _ => {}
    }
}

fn diff_child(old: &Value, new: &Value, path: &SchemaPath, operations: &mut Vec<Operation>) {
    let same_container = matches!(
        (old, new),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    );
    if same_container {
        generate(old, new, path, operations);
    } else if old != new {
        operations.push(Operation::replace(path.to_pointer(), new.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaforge_operation::apply_patch_operations;
    use serde_json::json;

    #[test]
    fn identical_documents_produce_no_operations() {
        let doc = json!({ "a": [1, 2, { "b": null }] });
        assert!(compare(&doc, &doc).is_empty());
    }

    #[test]
    fn emits_add_remove_replace() {
        let before = json!({ "keep": 1, "drop": true, "change": "x" });
        let after = json!({ "keep": 1, "change": "y", "new": [1] });

        let ops = compare(&before, &after);
        assert_eq!(
            ops,
            vec![
                Operation::replace("/change", json!("y")),
                Operation::remove("/drop"),
                Operation::add("/new", json!([1])),
            ]
        );
    }

    #[test]
    fn shrinking_arrays_remove_from_the_end() {
        let before = json!({ "cols": ["a", "b", "c"] });
        let after = json!({ "cols": ["a"] });
        let ops = compare(&before, &after);
        assert_eq!(
            ops,
            vec![Operation::remove("/cols/2"), Operation::remove("/cols/1")]
        );
        assert_eq!(apply_patch_operations(&before, &ops).unwrap(), after);
    }

    #[test]
    fn patch_reproduces_target() {
        let before = json!({ "t": { "x": { "n": 1 }, "list": [1, 2] }, "gone": {} });
        let after = json!({ "t": { "x": { "n": 2, "m": null }, "list": [3, 2, 1] } });
        let ops = compare(&before, &after);
        assert_eq!(apply_patch_operations(&before, &ops).unwrap(), after);
    }

    #[test]
    fn escapes_keys_in_paths() {
        let before = json!({ "tables": {} });
        let after = json!({ "tables": { "a/b": 1 } });
        assert_eq!(
            compare(&before, &after),
            vec![Operation::add("/tables/a~1b", json!(1))]
        );
    }
}
