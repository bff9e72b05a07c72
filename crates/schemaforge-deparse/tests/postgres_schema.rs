use pretty_assertions::assert_eq;
use schemaforge_core::{
    CheckConstraint, Column, Constraint, DefaultValue, EnumType, Extension, ForeignKeyAction,
    ForeignKeyConstraint, Index, PrimaryKeyConstraint, Schema, Table, UniqueConstraint,
};
use schemaforge_deparse::postgres_schema_deparser;

fn schema() -> Schema {
    let mut schema = Schema::default();
    schema.extensions.insert(
        "pgcrypto".to_string(),
        Extension {
            name: "pgcrypto".to_string(),
        },
    );
    schema.insert_enum(EnumType::new(
        "Status",
        vec!["draft".to_string(), "it's live".to_string()],
    ));

    let mut users = Table::new("users");
    users.comment = Some("people".to_string());
    let mut id = Column::new("id", "bigserial");
    id.primary = true;
    id.not_null = true;
    users.insert_column(id);
    let mut email = Column::new("email", "varchar(255)");
    email.not_null = true;
    email.unique = true;
    email.comment = Some("login".to_string());
    users.insert_column(email);
    users.insert_constraint(Constraint::PrimaryKey(PrimaryKeyConstraint {
        name: "users_pkey".to_string(),
        column_names: vec!["id".to_string()],
    }));
    users.insert_constraint(Constraint::Unique(UniqueConstraint {
        name: "users_email_key".to_string(),
        column_names: vec!["email".to_string()],
    }));

    let mut posts = Table::new("posts");
    let mut user_id = Column::new("user_id", "bigint");
    user_id.not_null = true;
    posts.insert_column(user_id);
    let mut status = Column::new("status", "Status");
    status.default = Some(DefaultValue::text("draft"));
    posts.insert_column(status);
    let mut created_at = Column::new("created_at", "timestamp with time zone");
    created_at.default = Some(DefaultValue::text("now()"));
    posts.insert_column(created_at);
    let mut score = Column::new("score", "integer");
    score.check = Some("score >= 0".to_string());
    score.default = Some(DefaultValue::integer(0));
    posts.insert_column(score);
    posts.insert_index(Index::new(
        "posts_user_id_idx",
        vec!["user_id".to_string()],
        false,
    ));
    posts.insert_constraint(Constraint::Check(CheckConstraint {
        name: "posts_score_check".to_string(),
        detail: "CHECK (score >= 0)".to_string(),
    }));
    posts.insert_constraint(Constraint::ForeignKey(ForeignKeyConstraint {
        name: "posts_user_id_fkey".to_string(),
        column_names: vec!["user_id".to_string()],
        target_table_name: "users".to_string(),
        target_column_names: vec!["id".to_string()],
        update_constraint: ForeignKeyAction::NoAction,
        delete_constraint: ForeignKeyAction::SetNull,
    }));

    schema.insert_table(users);
    schema.insert_table(posts);
    schema
}

#[test]
fn renders_full_schema_in_dependency_order() {
    let result = postgres_schema_deparser(&schema());
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let expected = [
        "CREATE EXTENSION IF NOT EXISTS \"pgcrypto\";",
        "CREATE TYPE \"Status\" AS ENUM ('draft', 'it''s live');",
        "CREATE TABLE \"users\" (\n  \"id\" bigserial NOT NULL,\n  \"email\" varchar(255) NOT NULL\n);",
        "COMMENT ON TABLE \"users\" IS 'people';",
        "COMMENT ON COLUMN \"users\".\"email\" IS 'login';",
        "CREATE TABLE \"posts\" (\n  \"user_id\" bigint NOT NULL,\n  \"status\" \"Status\" DEFAULT 'draft',\n  \"created_at\" timestamp with time zone DEFAULT now(),\n  \"score\" integer DEFAULT 0\n);",
        "CREATE INDEX \"posts_user_id_idx\" ON \"posts\" (\"user_id\");",
        "ALTER TABLE \"users\" ADD CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\");",
        "ALTER TABLE \"users\" ADD CONSTRAINT \"users_email_key\" UNIQUE (\"email\");",
        "ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_score_check\" CHECK (score >= 0);",
        "ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_user_id_fkey\" FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON UPDATE NO ACTION ON DELETE SET NULL;",
    ]
    .join("\n\n");
    assert_eq!(result.value, expected);
}

#[test]
fn columns_without_covering_constraints_keep_inline_clauses() {
    let mut schema = Schema::default();
    let mut table = Table::new("tags");
    let mut id = Column::new("id", "integer");
    id.primary = true;
    id.not_null = true;
    table.insert_column(id);
    let mut slug = Column::new("slug", "text");
    slug.unique = true;
    table.insert_column(slug);
    schema.insert_table(table);

    let result = postgres_schema_deparser(&schema);
    assert_eq!(
        result.value,
        "CREATE TABLE \"tags\" (\n  \"id\" integer PRIMARY KEY,\n  \"slug\" text UNIQUE\n);"
    );
}

#[test]
fn reports_broken_entities_and_keeps_the_rest() {
    let mut schema = Schema::default();
    let mut table = Table::new("t");
    table.insert_column(Column::new("a", "integer"));
    table.insert_column(Column::new("b", ""));
    table.insert_constraint(Constraint::Unique(UniqueConstraint {
        name: "t_empty_key".to_string(),
        column_names: Vec::new(),
    }));
    schema.insert_table(table);

    let result = postgres_schema_deparser(&schema);
    assert_eq!(result.value, "CREATE TABLE \"t\" (\n  \"a\" integer\n);");
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].message, "column t.b has no type");
}
