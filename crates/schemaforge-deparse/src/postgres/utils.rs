//! Identifier, type and literal formatting plus single-statement builders.

use once_cell::sync::Lazy;
use regex::Regex;
use schemaforge_core::{Column, Constraint, DefaultValue, EnumType, Index};

use crate::result::DeparseError;

static FUNCTION_CALL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*\s*\(").ok());

static CHECK_CLAUSE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^CHECK\s*\(").ok());

/// Bare keywords that PostgreSQL evaluates as functions.
const KEYWORD_FUNCTIONS: &[&str] = &[
    "current_timestamp",
    "current_date",
    "current_time",
    "localtime",
    "localtimestamp",
    "current_user",
    "session_user",
    "current_role",
    "current_catalog",
    "current_schema",
];

/// `users` -> `"users"`, doubling embedded quotes.
pub fn escape_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a type name only when it needs it: uppercase letters or a schema
/// qualifier. Parameterized and multi-word types are left alone; array
/// suffixes are kept outside the quotes.
pub fn escape_type(data_type: &str) -> String {
    if let Some(base) = data_type.strip_suffix("[]") {
        return format!("{}[]", escape_type(base));
    }
    if data_type.starts_with('"') || data_type.contains('(') || data_type.contains(' ') {
        return data_type.to_string();
    }
    if data_type.contains('.') {
        return data_type
            .split('.')
            .map(escape_identifier)
            .collect::<Vec<_>>()
            .join(".");
    }
    if data_type.chars().any(char::is_uppercase) {
        return escape_identifier(data_type);
    }
    data_type.to_string()
}

/// `it's` -> `'it''s'`.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Render a column default.
///
/// Booleans and numbers are bare. Text shaped like a function call, or one
/// of the bare keyword functions, is an expression and stays verbatim, as
/// does text that is already single-quoted. Everything else is quoted.
pub fn format_default_value(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Boolean(true) => "TRUE".to_string(),
        DefaultValue::Boolean(false) => "FALSE".to_string(),
        DefaultValue::Number(number) => number.to_string(),
        DefaultValue::Text(text) => {
            if is_expression(text) || is_quoted(text) {
                text.clone()
            } else {
                quote_literal(text)
            }
        }
    }
}

fn is_expression(text: &str) -> bool {
    let trimmed = text.trim();
    let is_call = FUNCTION_CALL
        .as_ref()
        .is_some_and(|re| re.is_match(trimmed));
    is_call
        || KEYWORD_FUNCTIONS
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(trimmed))
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'')
}

fn comment_literal(comment: Option<&str>) -> String {
    comment.map(quote_literal).unwrap_or_else(|| "NULL".to_string())
}

/// Index column: a plain name is quoted, an expression is kept as written.
fn index_column(column: &str) -> String {
    if column.contains('(') || column.contains(' ') {
        column.to_string()
    } else {
        escape_identifier(column)
    }
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| escape_identifier(column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which column-level clauses are already expressed by table constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineClauses {
    pub primary_key: bool,
    pub unique: bool,
    pub check: bool,
}

/// `"name" type [PRIMARY KEY] [UNIQUE] [NOT NULL] [DEFAULT x] [CHECK (..)]`.
pub fn column_definition(column: &Column, inline: InlineClauses) -> String {
    let mut definition = format!(
        "{} {}",
        escape_identifier(&column.name),
        escape_type(&column.data_type)
    );
    if inline.primary_key && column.primary {
        definition.push_str(" PRIMARY KEY");
    }
    if inline.unique && column.unique && !column.primary {
        definition.push_str(" UNIQUE");
    }
    if column.not_null && !(inline.primary_key && column.primary) {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        definition.push_str(" DEFAULT ");
        definition.push_str(&format_default_value(default));
    }
    if inline.check {
        if let Some(check) = &column.check {
            definition.push_str(&format!(" CHECK ({check})"));
        }
    }
    definition
}

pub fn create_table(table_name: &str, definitions: &[String]) -> String {
    if definitions.is_empty() {
        return format!("CREATE TABLE {} ();", escape_identifier(table_name));
    }
    format!(
        "CREATE TABLE {} (\n  {}\n);",
        escape_identifier(table_name),
        definitions.join(",\n  ")
    )
}

pub fn drop_table(table_name: &str) -> String {
    format!("DROP TABLE {};", escape_identifier(table_name))
}

pub fn rename_table(table_name: &str, new_name: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {};",
        escape_identifier(table_name),
        escape_identifier(new_name)
    )
}

pub fn table_comment(table_name: &str, comment: Option<&str>) -> String {
    format!(
        "COMMENT ON TABLE {} IS {};",
        escape_identifier(table_name),
        comment_literal(comment)
    )
}

pub fn column_comment(table_name: &str, column_name: &str, comment: Option<&str>) -> String {
    format!(
        "COMMENT ON COLUMN {}.{} IS {};",
        escape_identifier(table_name),
        escape_identifier(column_name),
        comment_literal(comment)
    )
}

fn alter_table(table_name: &str, action: &str) -> String {
    format!("ALTER TABLE {} {action};", escape_identifier(table_name))
}

pub fn add_column(table_name: &str, column: &Column) -> String {
    let inline = InlineClauses {
        primary_key: true,
        unique: true,
        check: true,
    };
    alter_table(
        table_name,
        &format!("ADD COLUMN {}", column_definition(column, inline)),
    )
}

pub fn drop_column(table_name: &str, column_name: &str) -> String {
    alter_table(
        table_name,
        &format!("DROP COLUMN {}", escape_identifier(column_name)),
    )
}

pub fn rename_column(table_name: &str, column_name: &str, new_name: &str) -> String {
    alter_table(
        table_name,
        &format!(
            "RENAME COLUMN {} TO {}",
            escape_identifier(column_name),
            escape_identifier(new_name)
        ),
    )
}

pub fn alter_column_type(table_name: &str, column_name: &str, data_type: &str) -> String {
    alter_table(
        table_name,
        &format!(
            "ALTER COLUMN {} TYPE {}",
            escape_identifier(column_name),
            escape_type(data_type)
        ),
    )
}

pub fn alter_column_default(
    table_name: &str,
    column_name: &str,
    default: Option<&DefaultValue>,
) -> String {
    let action = match default {
        Some(value) => format!("SET DEFAULT {}", format_default_value(value)),
        None => "DROP DEFAULT".to_string(),
    };
    alter_table(
        table_name,
        &format!("ALTER COLUMN {} {action}", escape_identifier(column_name)),
    )
}

pub fn alter_column_not_null(table_name: &str, column_name: &str, not_null: bool) -> String {
    let action = if not_null { "SET NOT NULL" } else { "DROP NOT NULL" };
    alter_table(
        table_name,
        &format!("ALTER COLUMN {} {action}", escape_identifier(column_name)),
    )
}

pub fn create_index(table_name: &str, index: &Index) -> String {
    let columns = index
        .columns
        .iter()
        .map(|column| index_column(column))
        .collect::<Vec<_>>()
        .join(", ");
    let using = if index.index_type.is_empty() {
        String::new()
    } else {
        format!("USING {} ", index.index_type)
    };
    format!(
        "CREATE {}INDEX {} ON {} {using}({columns});",
        if index.unique { "UNIQUE " } else { "" },
        escape_identifier(&index.name),
        escape_identifier(table_name)
    )
}

pub fn drop_index(index_name: &str) -> String {
    format!("DROP INDEX {};", escape_identifier(index_name))
}

/// `ALTER TABLE .. ADD CONSTRAINT ..` for any constraint kind.
pub fn add_constraint(table_name: &str, constraint: &Constraint) -> Result<String, DeparseError> {
    let body = match constraint {
        Constraint::PrimaryKey(pk) => {
            require_columns(table_name, &pk.name, &pk.column_names)?;
            format!("PRIMARY KEY ({})", column_list(&pk.column_names))
        }
        Constraint::Unique(unique) => {
            require_columns(table_name, &unique.name, &unique.column_names)?;
            format!("UNIQUE ({})", column_list(&unique.column_names))
        }
        Constraint::Check(check) => {
            let detail = check.detail.trim();
            if detail.is_empty() {
                return Err(DeparseError::new(format!(
                    "check constraint {table_name}.{} has no expression",
                    check.name
                )));
            }
            let wrapped = CHECK_CLAUSE
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(detail));
            if wrapped {
                detail.to_string()
            } else {
                format!("CHECK ({detail})")
            }
        }
        Constraint::ForeignKey(fk) => {
            require_columns(table_name, &fk.name, &fk.column_names)?;
            require_columns(table_name, &fk.name, &fk.target_column_names)?;
            format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
                column_list(&fk.column_names),
                escape_identifier(&fk.target_table_name),
                column_list(&fk.target_column_names),
                fk.update_constraint.as_sql(),
                fk.delete_constraint.as_sql()
            )
        }
    };
    Ok(alter_table(
        table_name,
        &format!(
            "ADD CONSTRAINT {} {body}",
            escape_identifier(constraint.name())
        ),
    ))
}

fn require_columns(table_name: &str, name: &str, columns: &[String]) -> Result<(), DeparseError> {
    if columns.is_empty() {
        return Err(DeparseError::new(format!(
            "constraint {table_name}.{name} has no columns"
        )));
    }
    Ok(())
}

pub fn drop_constraint(table_name: &str, constraint_name: &str) -> String {
    alter_table(
        table_name,
        &format!("DROP CONSTRAINT {}", escape_identifier(constraint_name)),
    )
}

pub fn create_enum(enum_type: &EnumType) -> String {
    let values = enum_type
        .values
        .iter()
        .map(|value| quote_literal(value))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TYPE {} AS ENUM ({values});",
        escape_identifier(&enum_type.name)
    )
}

pub fn enum_comment(enum_name: &str, comment: Option<&str>) -> String {
    format!(
        "COMMENT ON TYPE {} IS {};",
        escape_identifier(enum_name),
        comment_literal(comment)
    )
}

pub fn drop_enum(enum_name: &str) -> String {
    format!("DROP TYPE {};", escape_identifier(enum_name))
}

pub fn create_extension(name: &str) -> String {
    format!("CREATE EXTENSION IF NOT EXISTS {};", escape_identifier(name))
}

pub fn drop_extension(name: &str) -> String {
    format!("DROP EXTENSION {};", escape_identifier(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaforge_core::CheckConstraint;

    #[test]
    fn escapes_identifiers() {
        assert_eq!(escape_identifier("users"), "\"users\"");
        assert_eq!(escape_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn escapes_types_only_when_needed() {
        assert_eq!(escape_type("integer"), "integer");
        assert_eq!(escape_type("varchar(255)"), "varchar(255)");
        assert_eq!(escape_type("double precision"), "double precision");
        assert_eq!(escape_type("Role"), "\"Role\"");
        assert_eq!(escape_type("Role[]"), "\"Role\"[]");
        assert_eq!(escape_type("text[]"), "text[]");
        assert_eq!(escape_type("public.citext"), "\"public\".\"citext\"");
    }

    #[test]
    fn formats_defaults_by_kind() {
        assert_eq!(format_default_value(&DefaultValue::Boolean(true)), "TRUE");
        assert_eq!(format_default_value(&DefaultValue::Boolean(false)), "FALSE");
        assert_eq!(format_default_value(&DefaultValue::integer(0)), "0");
        assert_eq!(format_default_value(&DefaultValue::text("active")), "'active'");
        assert_eq!(
            format_default_value(&DefaultValue::text("gen_random_uuid()")),
            "gen_random_uuid()"
        );
        assert_eq!(format_default_value(&DefaultValue::integer(-3)), "-3");
        assert_eq!(format_default_value(&DefaultValue::text("now()")), "now()");
        assert_eq!(
            format_default_value(&DefaultValue::text("nextval ('seq'::regclass)")),
            "nextval ('seq'::regclass)"
        );
        assert_eq!(
            format_default_value(&DefaultValue::text("CURRENT_TIMESTAMP")),
            "CURRENT_TIMESTAMP"
        );
        assert_eq!(format_default_value(&DefaultValue::text("it's")), "'it''s'");
        assert_eq!(format_default_value(&DefaultValue::text("'draft'")), "'draft'");
    }

    #[test]
    fn wraps_check_details_unless_already_wrapped() {
        let check = |detail: &str| {
            Constraint::Check(CheckConstraint {
                name: "events_checked".to_string(),
                detail: detail.to_string(),
            })
        };
        assert_eq!(
            add_constraint("events", &check("checked_at IS NOT NULL")).unwrap(),
            "ALTER TABLE \"events\" ADD CONSTRAINT \"events_checked\" CHECK (checked_at IS NOT NULL);"
        );
        assert_eq!(
            add_constraint("events", &check("check (score >= 0)")).unwrap(),
            "ALTER TABLE \"events\" ADD CONSTRAINT \"events_checked\" check (score >= 0);"
        );
    }

    #[test]
    fn renders_index_expressions_verbatim() {
        let mut index = Index::new(
            "users_lower_email_idx",
            vec!["lower(email)".to_string(), "id".to_string()],
            true,
        );
        index.index_type = "btree".to_string();
        assert_eq!(
            create_index("users", &index),
            "CREATE UNIQUE INDEX \"users_lower_email_idx\" ON \"users\" USING btree (lower(email), \"id\");"
        );
    }
}
