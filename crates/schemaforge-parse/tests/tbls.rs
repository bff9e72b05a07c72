use pretty_assertions::assert_eq;
use schemaforge_core::{Constraint, DefaultValue, ForeignKeyAction};
use schemaforge_parse::{ProcessError, SupportedFormat, process};
use serde_json::json;

fn document() -> String {
    json!({
        "name": "app",
        "tables": [
            {
                "name": "users",
                "type": "BASE TABLE",
                "comment": "",
                "columns": [
                    { "name": "id", "type": "bigint", "nullable": false },
                    { "name": "active", "type": "boolean", "nullable": true, "default": "true" },
                    { "name": "nick", "type": "text", "nullable": true, "comment": "display name" }
                ],
                "indexes": [
                    {
                        "name": "users_nick_idx",
                        "def": "CREATE UNIQUE INDEX users_nick_idx ON public.users USING btree (nick)",
                        "columns": ["nick"]
                    }
                ],
                "constraints": [
                    { "name": "users_pkey", "type": "PRIMARY KEY", "def": "PRIMARY KEY (id)", "columns": ["id"] }
                ]
            },
            {
                "name": "posts",
                "type": "BASE TABLE",
                "columns": [
                    { "name": "id", "type": "bigint", "nullable": false },
                    { "name": "user_id", "type": "bigint", "nullable": false, "default": "0" }
                ],
                "constraints": [
                    {
                        "name": "posts_user_id_fkey",
                        "type": "FOREIGN KEY",
                        "def": "FOREIGN KEY (user_id) REFERENCES users(id) ON UPDATE RESTRICT ON DELETE CASCADE",
                        "columns": ["user_id"],
                        "referenced_table": "users",
                        "referenced_columns": ["id"]
                    },
                    { "name": "posts_trigger", "type": "TRIGGER", "def": "", "columns": [] }
                ]
            }
        ],
        "enums": [
            { "name": "mood", "values": ["happy", "sad"] }
        ]
    })
    .to_string()
}

#[test]
fn converts_tbls_document() {
    let result = process(SupportedFormat::Tbls, &document());
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let schema = result.value;

    let users = &schema.tables["users"];
    assert_eq!(users.comment, None);
    assert!(users.columns["id"].not_null);
    assert!(users.columns["id"].primary);
    assert_eq!(users.columns["active"].default, Some(DefaultValue::Boolean(true)));
    assert_eq!(users.columns["nick"].comment.as_deref(), Some("display name"));

    let index = &users.indexes["users_nick_idx"];
    assert!(index.unique);
    assert_eq!(index.index_type, "btree");

    let posts = &schema.tables["posts"];
    assert_eq!(posts.columns["user_id"].default, Some(DefaultValue::integer(0)));
    assert_eq!(posts.constraints.len(), 1);
    match &posts.constraints["posts_user_id_fkey"] {
        Constraint::ForeignKey(fk) => {
            assert_eq!(fk.update_constraint, ForeignKeyAction::Restrict);
            assert_eq!(fk.delete_constraint, ForeignKeyAction::Cascade);
        }
        other => panic!("unexpected constraint {other:?}"),
    }

    assert_eq!(schema.enums["mood"].values, vec!["happy", "sad"]);
}

#[test]
fn rejects_documents_outside_the_tbls_shape() {
    let result = process(SupportedFormat::Tbls, r#"{"tables": [{"columns": []}]}"#);
    assert!(result.value.tables.is_empty());
    assert!(!result.errors.is_empty());
    assert!(result
        .errors
        .iter()
        .all(|err| matches!(err, ProcessError::InvalidSchema(_))));

    let result = process(SupportedFormat::Tbls, "{ not json");
    assert!(matches!(result.errors[0], ProcessError::InvalidJson(_)));
}
