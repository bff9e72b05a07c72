use pretty_assertions::assert_eq;
use schemaforge_deparse::{postgres_operation_deparser, postgres_operations_deparser};
use schemaforge_diff::compare;
use schemaforge_operation::Operation;
use schemaforge_parse::{SupportedFormat, process};
use serde_json::json;

fn deparse(operation: Operation) -> String {
    let result = postgres_operation_deparser(&operation);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    result.value
}

#[test]
fn renders_table_operations() {
    assert_eq!(
        deparse(Operation::add(
            "/tables/tags",
            json!({
                "name": "tags",
                "comment": "labels",
                "columns": {
                    "id": { "name": "id", "type": "serial", "primary": true, "notNull": true }
                },
                "indexes": {},
                "constraints": {
                    "tags_pkey": { "type": "PRIMARY KEY", "name": "tags_pkey", "columnNames": ["id"] }
                }
            })
        )),
        "CREATE TABLE \"tags\" (\n  \"id\" serial NOT NULL\n);\n\nCOMMENT ON TABLE \"tags\" IS 'labels';\n\nALTER TABLE \"tags\" ADD CONSTRAINT \"tags_pkey\" PRIMARY KEY (\"id\");"
    );
    assert_eq!(deparse(Operation::remove("/tables/tags")), "DROP TABLE \"tags\";");
    assert_eq!(
        deparse(Operation::replace("/tables/tags/name", json!("labels"))),
        "ALTER TABLE \"tags\" RENAME TO \"labels\";"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/tags/comment", json!(null))),
        "COMMENT ON TABLE \"tags\" IS NULL;"
    );
}

#[test]
fn renders_column_operations() {
    assert_eq!(
        deparse(Operation::add(
            "/tables/users/columns/age",
            json!({ "name": "age", "type": "integer", "notNull": true, "default": 18 })
        )),
        "ALTER TABLE \"users\" ADD COLUMN \"age\" integer NOT NULL DEFAULT 18;"
    );
    assert_eq!(
        deparse(Operation::remove("/tables/users/columns/age")),
        "ALTER TABLE \"users\" DROP COLUMN \"age\";"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/users/columns/age/name", json!("years"))),
        "ALTER TABLE \"users\" RENAME COLUMN \"age\" TO \"years\";"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/users/columns/age/type", json!("bigint"))),
        "ALTER TABLE \"users\" ALTER COLUMN \"age\" TYPE bigint;"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/users/columns/nick/default", json!("anon"))),
        "ALTER TABLE \"users\" ALTER COLUMN \"nick\" SET DEFAULT 'anon';"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/users/columns/nick/default", json!(null))),
        "ALTER TABLE \"users\" ALTER COLUMN \"nick\" DROP DEFAULT;"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/users/columns/nick/notNull", json!(false))),
        "ALTER TABLE \"users\" ALTER COLUMN \"nick\" DROP NOT NULL;"
    );
    assert_eq!(
        deparse(Operation::replace("/tables/users/columns/nick/comment", json!("shown name"))),
        "COMMENT ON COLUMN \"users\".\"nick\" IS 'shown name';"
    );
}

#[test]
fn renders_index_constraint_and_enum_operations() {
    assert_eq!(
        deparse(Operation::add(
            "/tables/users/indexes/users_nick_idx",
            json!({ "name": "users_nick_idx", "columns": ["nick"], "unique": true, "type": "" })
        )),
        "CREATE UNIQUE INDEX \"users_nick_idx\" ON \"users\" (\"nick\");"
    );
    assert_eq!(
        deparse(Operation::remove("/tables/users/indexes/users_nick_idx")),
        "DROP INDEX \"users_nick_idx\";"
    );
    assert_eq!(
        deparse(Operation::add(
            "/tables/posts/constraints/posts_user_fk",
            json!({
                "type": "FOREIGN KEY",
                "name": "posts_user_fk",
                "columnNames": ["user_id"],
                "targetTableName": "users",
                "targetColumnNames": ["id"],
                "updateConstraint": "CASCADE",
                "deleteConstraint": "SET_DEFAULT"
            })
        )),
        "ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_user_fk\" FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON UPDATE CASCADE ON DELETE SET DEFAULT;"
    );
    assert_eq!(
        deparse(Operation::remove("/tables/posts/constraints/posts_user_fk")),
        "ALTER TABLE \"posts\" DROP CONSTRAINT \"posts_user_fk\";"
    );
    assert_eq!(
        deparse(Operation::add(
            "/enums/mood",
            json!({ "name": "mood", "values": ["ok", "sad"] })
        )),
        "CREATE TYPE \"mood\" AS ENUM ('ok', 'sad');"
    );
    assert_eq!(deparse(Operation::remove("/enums/mood")), "DROP TYPE \"mood\";");
}

#[test]
fn unsupported_and_unmatched_operations_are_errors() {
    let result = postgres_operation_deparser(&Operation::replace(
        "/tables/users/columns/id/primary",
        json!(true),
    ));
    assert!(result.value.is_empty());
    assert_eq!(
        result.errors[0].message,
        "unsupported operation: replace /tables/users/columns/id/primary"
    );

    let result = postgres_operation_deparser(&Operation::remove("/tables/users/columns"));
    assert!(result.value.is_empty());
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn deparses_operation_lists() {
    let result = postgres_operations_deparser(&[
        Operation::remove("/tables/a"),
        Operation::replace("/tables/b/columns/c/check", json!("c > 0")),
        Operation::remove("/tables/b"),
    ]);
    assert_eq!(result.value, "DROP TABLE \"a\";\n\nDROP TABLE \"b\";");
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn drizzle_property_keys_deparse_with_sql_column_names() {
    let before = process(
        SupportedFormat::Drizzle,
        r#"export const users = pgTable("users", { id: serial("id").primaryKey() });"#,
    );
    let after = process(
        SupportedFormat::Drizzle,
        r#"export const users = pgTable("users", {
  id: serial("id").primaryKey(),
  createdAt: timestamp("created_at").defaultNow().notNull(),
});"#,
    );
    assert!(before.errors.is_empty() && after.errors.is_empty());

    let operations = compare(
        &serde_json::to_value(&before.value).unwrap(),
        &serde_json::to_value(&after.value).unwrap(),
    );
    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0].path, "/tables/users/columns/createdAt");

    let result = postgres_operations_deparser(&operations);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.value,
        "ALTER TABLE \"users\" ADD COLUMN \"created_at\" timestamp NOT NULL DEFAULT now();"
    );
}
