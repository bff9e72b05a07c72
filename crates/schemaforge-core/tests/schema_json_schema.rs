use jsonschema::JSONSchema;
use schemaforge_core::schema_json_schema;
use serde_json::json;

fn compiled() -> JSONSchema {
    let schema = serde_json::to_value(schema_json_schema()).expect("serialize json schema");
    JSONSchema::compile(&schema).expect("compile json schema")
}

#[test]
fn accepts_canonical_document() {
    let document = json!({
        "tables": {
            "posts": {
                "name": "posts",
                "columns": {
                    "user_id": { "name": "user_id", "type": "bigint", "notNull": true }
                },
                "comment": null,
                "indexes": {},
                "constraints": {
                    "fk_posts_user": {
                        "type": "FOREIGN KEY",
                        "name": "fk_posts_user",
                        "columnNames": ["user_id"],
                        "targetTableName": "users",
                        "targetColumnNames": ["id"],
                        "updateConstraint": "NO_ACTION",
                        "deleteConstraint": "SET_NULL"
                    }
                }
            }
        },
        "enums": {}
    });

    assert!(compiled().is_valid(&document));
}

#[test]
fn rejects_unknown_constraint_type() {
    let document = json!({
        "tables": {
            "posts": {
                "name": "posts",
                "constraints": {
                    "x": { "type": "EXCLUDE", "name": "x" }
                }
            }
        }
    });

    assert!(!compiled().is_valid(&document));
}
