use pretty_assertions::assert_eq;
use schemaforge_core::{Constraint, DefaultValue, ForeignKeyAction};
use schemaforge_parse::{ProcessError, SupportedFormat, process};

const SCHEMA: &str = r#"
ActiveRecord::Schema[7.1].define(version: 2024_01_01_000000) do
  enable_extension "plpgsql"

  create_enum "status", ["draft", "published"]

  create_table "users", comment: "accounts", force: :cascade do |t|
    t.string "email", null: false, unique: true
    t.boolean "active", default: true
    t.datetime "joined_at", default: -> { "CURRENT_TIMESTAMP" }
    t.timestamps
    t.index ["email", "active"], unique: true
  end

  create_table "posts" do |t|
    t.references :user, null: false, foreign_key: { on_delete: :cascade }
    t.text "body"
    t.integer "score", default: 0
  end

  add_foreign_key "posts", "users", column: "user_id", name: "posts_author_fk", on_update: :cascade
  add_check_constraint "posts", "score >= 0", name: "score_positive"
end
"#;

#[test]
fn parses_rails_schema() {
    let result = process(SupportedFormat::Schemarb, SCHEMA);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let schema = result.value;

    assert!(schema.extensions.contains_key("plpgsql"));
    assert_eq!(schema.enums["status"].values, vec!["draft", "published"]);

    let users = &schema.tables["users"];
    assert_eq!(users.comment.as_deref(), Some("accounts"));
    let keys: Vec<&str> = users.columns.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["id", "email", "active", "joined_at", "created_at", "updated_at"]
    );

    let id = &users.columns["id"];
    assert_eq!(id.data_type, "bigserial");
    assert!(id.primary && id.not_null);
    assert!(users.constraints.contains_key("users_pkey"));

    assert!(users.columns["email"].not_null);
    assert!(users.constraints.contains_key("UNIQUE_email"));
    assert_eq!(users.columns["active"].default, Some(DefaultValue::Boolean(true)));
    assert_eq!(
        users.columns["joined_at"].default,
        Some(DefaultValue::text("CURRENT_TIMESTAMP"))
    );
    assert!(users.columns["created_at"].not_null);

    let index = &users.indexes["index_users_on_email_and_active"];
    assert!(index.unique);
    assert_eq!(index.columns, vec!["email", "active"]);
}

#[test]
fn references_add_column_index_and_foreign_key() {
    let schema = process(SupportedFormat::Schemarb, SCHEMA).value;
    let posts = &schema.tables["posts"];

    assert_eq!(posts.columns["user_id"].data_type, "bigint");
    assert!(posts.columns["user_id"].not_null);
    assert!(posts.indexes.contains_key("index_posts_on_user_id"));
    assert_eq!(posts.columns["score"].default, Some(DefaultValue::integer(0)));

    match &posts.constraints["fk_posts_user_id"] {
        Constraint::ForeignKey(fk) => {
            assert_eq!(fk.target_table_name, "users");
            assert_eq!(fk.target_column_names, vec!["id"]);
            assert_eq!(fk.delete_constraint, ForeignKeyAction::Cascade);
        }
        other => panic!("unexpected constraint {other:?}"),
    }

    match &posts.constraints["posts_author_fk"] {
        Constraint::ForeignKey(fk) => {
            assert_eq!(fk.column_names, vec!["user_id"]);
            assert_eq!(fk.update_constraint, ForeignKeyAction::Cascade);
            assert_eq!(fk.delete_constraint, ForeignKeyAction::NoAction);
        }
        other => panic!("unexpected constraint {other:?}"),
    }

    match &posts.constraints["score_positive"] {
        Constraint::Check(check) => assert_eq!(check.detail, "CHECK (score >= 0)"),
        other => panic!("unexpected constraint {other:?}"),
    }
}

#[test]
fn table_without_implicit_id() {
    let source = r#"
create_table "tags", id: false do |t|
  t.string "name", "slug"
end
"#;
    let result = process(SupportedFormat::Schemarb, source);
    assert!(result.is_ok());
    let tags = &result.value.tables["tags"];
    assert!(tags.columns.get("id").is_none());
    assert!(tags.constraints.is_empty());
    assert_eq!(tags.columns.len(), 2);
}

#[test]
fn computed_table_name_is_reported_and_skipped() {
    let source = r#"
create_table "users" do |t|
  t.string "name"
end

create_table log_table_name do |t|
  t.string "line"
end
"#;
    let result = process(SupportedFormat::Schemarb, source);
    assert_eq!(result.value.tables.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], ProcessError::UnsupportedToken(_)));
}
