use pretty_assertions::assert_eq;
use schemaforge_core::{Constraint, DefaultValue, ForeignKeyAction};
use schemaforge_parse::{ProcessError, SupportedFormat, process};

const SCHEMA: &str = r#"
datasource db {
  provider = "postgresql"
  url      = env("DATABASE_URL")
}

generator client {
  provider = "prisma-client-js"
}

/// Account holder
model User {
  id        Int      @id @default(autoincrement())
  email     String   @unique @db.VarChar(255)
  role      Role     @default(USER)
  createdAt DateTime @default(now()) @map("created_at")
  posts     Post[]

  @@map("users")
}

model Post {
  id       String  @id @default(uuid()) @db.Uuid
  /// Headline shown in feeds
  title    String
  score    Float   @default(0.5)
  draft    Boolean @default(true)
  tags     String[]
  author   User?   @relation(fields: [authorId], references: [id], onDelete: Cascade)
  authorId Int?    @map("author_id")

  @@unique([title, authorId])
  @@index([authorId], type: Hash)
}

enum Role {
  USER
  ADMIN @map("admin")
}
"#;

#[test]
fn maps_models_to_tables() {
    let result = process(SupportedFormat::Prisma, SCHEMA);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let schema = result.value;

    let users = &schema.tables["users"];
    assert_eq!(users.comment.as_deref(), Some("Account holder"));
    let keys: Vec<&str> = users.columns.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "email", "role", "createdAt"]);

    assert_eq!(users.columns["id"].data_type, "serial");
    assert!(users.columns["id"].primary);
    assert!(users.constraints.contains_key("users_pkey"));

    let email = &users.columns["email"];
    assert_eq!(email.data_type, "varchar(255)");
    assert!(email.unique && email.not_null);
    assert!(users.constraints.contains_key("users_email_key"));

    assert_eq!(users.columns["role"].data_type, "Role");
    assert_eq!(users.columns["role"].default, Some(DefaultValue::text("USER")));

    let created_at = &users.columns["createdAt"];
    assert_eq!(created_at.name, "created_at");
    assert_eq!(created_at.data_type, "timestamp(3)");
    assert_eq!(created_at.default, Some(DefaultValue::text("now()")));

    assert_eq!(schema.enums["Role"].values, vec!["USER", "admin"]);
}

#[test]
fn maps_relations_and_block_attributes() {
    let schema = process(SupportedFormat::Prisma, SCHEMA).value;
    let posts = &schema.tables["Post"];

    assert!(posts.columns.get("author").is_none());
    assert_eq!(posts.columns["id"].data_type, "uuid");
    assert_eq!(posts.columns["id"].default, None);
    assert_eq!(
        posts.columns["title"].comment.as_deref(),
        Some("Headline shown in feeds")
    );
    assert_eq!(posts.columns["score"].default, DefaultValue::from_f64(0.5));
    assert_eq!(posts.columns["draft"].default, Some(DefaultValue::Boolean(true)));
    assert_eq!(posts.columns["tags"].data_type, "text[]");
    assert!(!posts.columns["authorId"].not_null);

    match &posts.constraints["Post_author_id_fkey"] {
        Constraint::ForeignKey(fk) => {
            assert_eq!(fk.column_names, vec!["author_id"]);
            assert_eq!(fk.target_table_name, "users");
            assert_eq!(fk.target_column_names, vec!["id"]);
            assert_eq!(fk.delete_constraint, ForeignKeyAction::Cascade);
            assert_eq!(fk.update_constraint, ForeignKeyAction::Cascade);
        }
        other => panic!("unexpected constraint {other:?}"),
    }

    match &posts.constraints["Post_title_author_id_key"] {
        Constraint::Unique(unique) => assert_eq!(unique.column_names, vec!["title", "author_id"]),
        other => panic!("unexpected constraint {other:?}"),
    }

    let index = &posts.indexes["Post_author_id_idx"];
    assert_eq!(index.index_type, "hash");
    assert_eq!(index.columns, vec!["author_id"]);
}

#[test]
fn optional_relation_defaults_to_set_null() {
    let source = r#"
model Team {
  id Int @id
}

model Member {
  id     Int   @id
  team   Team? @relation(fields: [teamId], references: [id])
  teamId Int?
}
"#;
    let schema = process(SupportedFormat::Prisma, source).value;
    match &schema.tables["Member"].constraints["Member_teamId_fkey"] {
        Constraint::ForeignKey(fk) => assert_eq!(fk.delete_constraint, ForeignKeyAction::SetNull),
        other => panic!("unexpected constraint {other:?}"),
    }
}

#[test]
fn unsupported_blocks_are_reported() {
    let source = r#"
view ActiveUsers {
  id Int @unique
}

model Tag {
  id Int @id
}
"#;
    let result = process(SupportedFormat::Prisma, source);
    assert!(result.value.tables.contains_key("Tag"));
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], ProcessError::UnsupportedToken(_)));
}
