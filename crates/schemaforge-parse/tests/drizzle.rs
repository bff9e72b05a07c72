use pretty_assertions::assert_eq;
use schemaforge_core::{Constraint, DefaultValue, ForeignKeyAction};
use schemaforge_parse::{ProcessError, SupportedFormat, process};

const MODULE: &str = r#"
import { sql } from "drizzle-orm";
import {
  pgEnum, pgTable, serial, varchar, text, integer, boolean, timestamp, uuid, numeric,
  index, uniqueIndex, primaryKey, foreignKey, check, unique,
} from "drizzle-orm/pg-core";

export const roleEnum = pgEnum("role", ["admin", "member"]);

export const users = pgTable("users", {
  id: serial("id").primaryKey(),
  email: varchar("email", { length: 255 }).notNull().unique(),
  role: roleEnum("role").default("member").notNull(),
  active: boolean("active").default(true),
  createdAt: timestamp("created_at", { withTimezone: true }).defaultNow().notNull(),
}, (table) => ({
  emailIdx: uniqueIndex("users_email_idx").on(table.email),
}));

export const posts = pgTable("posts", {
  id: uuid("id").defaultRandom().primaryKey(),
  authorId: integer("author_id").notNull().references(() => users.id, { onDelete: "cascade" }),
  price: numeric("price", { precision: 10, scale: 2 }).default("0"),
  tags: text("tags").array(),
  body: text("body").default(sql`''`),
}, (t) => [
  index("posts_author_idx").using("btree", t.authorId),
  check("price_positive", sql`${t.price} >= 0`),
]);

export const postTags = pgTable("post_tags", {
  postId: uuid("post_id").notNull(),
  tag: text("tag").notNull(),
}, (t) => ({
  pk: primaryKey({ columns: [t.postId, t.tag] }),
  post: foreignKey({ columns: [t.postId], foreignColumns: [posts.id], name: "post_tags_post_fk" }).onDelete("cascade"),
  uniq: unique().on(t.tag, t.postId),
}));

export type User = typeof users.$inferSelect;
"#;

#[test]
fn parses_tables_and_columns() {
    let result = process(SupportedFormat::Drizzle, MODULE);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let schema = result.value;

    assert_eq!(schema.enums["role"].values, vec!["admin", "member"]);

    let users = &schema.tables["users"];
    assert!(users.columns["id"].primary);
    assert_eq!(users.columns["id"].data_type, "serial");
    assert!(users.constraints.contains_key("users_pkey"));
    assert_eq!(users.columns["email"].data_type, "varchar(255)");
    assert!(users.columns["email"].not_null);
    assert!(users.constraints.contains_key("users_email_unique"));
    assert_eq!(users.columns["role"].data_type, "role");
    assert_eq!(users.columns["role"].default, Some(DefaultValue::text("member")));
    assert_eq!(users.columns["active"].default, Some(DefaultValue::Boolean(true)));

    let created_at = &users.columns["createdAt"];
    assert_eq!(created_at.name, "created_at");
    assert_eq!(created_at.data_type, "timestamp with time zone");
    assert_eq!(created_at.default, Some(DefaultValue::text("now()")));

    let index = &users.indexes["users_email_idx"];
    assert!(index.unique);
    assert_eq!(index.columns, vec!["email"]);
}

#[test]
fn resolves_references_and_config() {
    let schema = process(SupportedFormat::Drizzle, MODULE).value;
    let posts = &schema.tables["posts"];

    assert_eq!(
        posts.columns["id"].default,
        Some(DefaultValue::text("gen_random_uuid()"))
    );
    assert_eq!(posts.columns["price"].data_type, "numeric(10, 2)");
    assert_eq!(posts.columns["tags"].data_type, "text[]");
    assert_eq!(posts.columns["body"].default, Some(DefaultValue::text("''")));

    match &posts.constraints["posts_author_id_users_id_fk"] {
        Constraint::ForeignKey(fk) => {
            assert_eq!(fk.column_names, vec!["author_id"]);
            assert_eq!(fk.target_table_name, "users");
            assert_eq!(fk.target_column_names, vec!["id"]);
            assert_eq!(fk.delete_constraint, ForeignKeyAction::Cascade);
            assert_eq!(fk.update_constraint, ForeignKeyAction::NoAction);
        }
        other => panic!("unexpected constraint {other:?}"),
    }

    let index = &posts.indexes["posts_author_idx"];
    assert_eq!(index.index_type, "btree");
    assert_eq!(index.columns, vec!["author_id"]);

    match &posts.constraints["price_positive"] {
        Constraint::Check(check) => assert_eq!(check.detail, "CHECK (price >= 0)"),
        other => panic!("unexpected constraint {other:?}"),
    }

    let post_tags = &schema.tables["post_tags"];
    match &post_tags.constraints["post_tags_post_id_tag_pk"] {
        Constraint::PrimaryKey(pk) => assert_eq!(pk.column_names, vec!["post_id", "tag"]),
        other => panic!("unexpected constraint {other:?}"),
    }
    assert!(post_tags.columns["postId"].primary);
    assert!(post_tags.constraints.contains_key("post_tags_post_fk"));
    assert!(post_tags.constraints.contains_key("post_tags_tag_post_id_unique"));
}

#[test]
fn computed_table_names_are_reported() {
    let source = r#"
const name = "dynamic";
export const t = pgTable(name, { id: serial("id") });
export const ok = pgTable("ok", { id: serial("id") });
"#;
    let result = process(SupportedFormat::Drizzle, source);
    assert_eq!(result.value.tables.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], ProcessError::UnsupportedToken(_)));
}
