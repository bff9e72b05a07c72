use pretty_assertions::assert_eq;
use schemaforge_core::{Column, DefaultValue, Schema, Table};
use serde_json::json;

fn users_schema() -> Schema {
    let mut id = Column::new("id", "bigserial");
    id.primary = true;
    id.not_null = true;

    let mut active = Column::new("active", "boolean");
    active.default = Some(DefaultValue::Boolean(true));

    let mut users = Table::new("users");
    users.comment = Some("people".to_string());
    users.insert_column(id);
    users.insert_column(active);

    let mut schema = Schema::default();
    schema.insert_table(users);
    schema
}

#[test]
fn serializes_schema_deterministically() {
    let value = serde_json::to_value(users_schema()).expect("serialize schema");
    let expected = json!({
        "tables": {
            "users": {
                "name": "users",
                "columns": {
                    "id": {
                        "name": "id",
                        "type": "bigserial",
                        "default": null,
                        "check": null,
                        "primary": true,
                        "unique": false,
                        "notNull": true,
                        "comment": null
                    },
                    "active": {
                        "name": "active",
                        "type": "boolean",
                        "default": true,
                        "check": null,
                        "primary": false,
                        "unique": false,
                        "notNull": false,
                        "comment": null
                    }
                },
                "comment": "people",
                "indexes": {},
                "constraints": {}
            }
        },
        "enums": {}
    });
    assert_eq!(value, expected);
}

#[test]
fn preserves_column_order_through_json() {
    let schema = users_schema();
    let text = serde_json::to_string(&schema).expect("serialize schema");
    let decoded: Schema = serde_json::from_str(&text).expect("decode schema");

    let names: Vec<&str> = decoded.tables["users"]
        .columns
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["id", "active"]);
    assert_eq!(decoded, schema);
}

#[test]
fn default_values_keep_their_json_kind() {
    let column: Column = serde_json::from_value(json!({
        "name": "count",
        "type": "integer",
        "default": 0
    }))
    .expect("decode column");
    assert_eq!(column.default, Some(DefaultValue::integer(0)));
    assert!(!column.not_null);

    let column: Column = serde_json::from_value(json!({
        "name": "status",
        "type": "text",
        "default": "draft"
    }))
    .expect("decode column");
    assert_eq!(column.default, Some(DefaultValue::text("draft")));
}
