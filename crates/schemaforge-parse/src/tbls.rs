//! tbls JSON documentation output (`tbls out -t json`).

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use schemaforge_core::{
    CheckConstraint, Column, Constraint, DefaultValue, EnumType, ForeignKeyAction,
    ForeignKeyConstraint, Index, PrimaryKeyConstraint, Schema, Table, UniqueConstraint,
};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ProcessError;
use crate::result::ProcessResult;

#[derive(Debug, Deserialize, JsonSchema)]
struct TblsDocument {
    tables: Vec<TblsTable>,
    #[serde(default)]
    enums: Vec<TblsEnum>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TblsTable {
    name: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    columns: Vec<TblsColumn>,
    #[serde(default)]
    indexes: Vec<TblsIndex>,
    #[serde(default)]
    constraints: Vec<TblsConstraint>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TblsColumn {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    nullable: bool,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TblsIndex {
    name: String,
    def: String,
    #[serde(default)]
    columns: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TblsConstraint {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    def: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    referenced_table: Option<String>,
    #[serde(default)]
    referenced_columns: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TblsEnum {
    name: String,
    #[serde(default)]
    values: Vec<String>,
}

static COMPILED_SCHEMA: Lazy<Result<JSONSchema, String>> = Lazy::new(|| {
    let schema = serde_json::to_value(schema_for!(TblsDocument)).map_err(|err| err.to_string())?;
    JSONSchema::compile(&schema).map_err(|err| err.to_string())
});

static ON_UPDATE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)ON UPDATE (CASCADE|RESTRICT|SET NULL|SET DEFAULT|NO ACTION)").ok()
});

static ON_DELETE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)ON DELETE (CASCADE|RESTRICT|SET NULL|SET DEFAULT|NO ACTION)").ok()
});

static USING: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)\bUSING\s+(\w+)").ok());

/// True when `content` is a JSON object whose `tables` member is an array,
/// which is how tbls output differs from the canonical model.
pub fn looks_like_tbls(content: &str) -> bool {
    serde_json::from_str::<Value>(content)
        .map(|value| value.get("tables").is_some_and(Value::is_array))
        .unwrap_or(false)
}

/// Parse a tbls JSON document.
pub fn process(source: &str) -> ProcessResult {
    let document: Value = match serde_json::from_str(source) {
        Ok(document) => document,
        Err(err) => return failed(ProcessError::InvalidJson(err.to_string())),
    };

    let compiled = match COMPILED_SCHEMA.as_ref() {
        Ok(compiled) => compiled,
        Err(message) => return failed(ProcessError::InvalidSchema(message.clone())),
    };
    if let Err(errors) = compiled.validate(&document) {
        let errors = errors
            .map(|error| {
                let pointer = error.instance_path.to_string();
                let pointer = if pointer.is_empty() { "/".to_string() } else { pointer };
                ProcessError::InvalidSchema(format!("{pointer}: {error}"))
            })
            .collect();
        return ProcessResult::new(Schema::default(), errors);
    }

    let document: TblsDocument = match serde_json::from_value(document) {
        Ok(document) => document,
        Err(err) => return failed(ProcessError::InvalidSchema(err.to_string())),
    };

    let mut schema = Schema::default();
    let mut errors = Vec::new();

    for tbls_table in document.tables {
        schema.insert_table(convert_table(tbls_table, &mut errors));
    }
    for tbls_enum in document.enums {
        schema.insert_enum(EnumType::new(tbls_enum.name, tbls_enum.values));
    }

    ProcessResult::new(schema, errors)
}

fn convert_table(source: TblsTable, errors: &mut Vec<ProcessError>) -> Table {
    let mut table = Table::new(source.name);
    table.comment = source.comment.filter(|comment| !comment.is_empty());

    for column in source.columns {
        let mut converted = Column::new(column.name, column.data_type);
        converted.not_null = !column.nullable;
        converted.default = column.default.as_deref().map(sniff_default);
        converted.comment = column.comment.filter(|comment| !comment.is_empty());
        table.insert_column(converted);
    }

    for constraint in source.constraints {
        match convert_constraint(&table.name, constraint) {
            Ok(Some(constraint)) => {
                mark_columns(&mut table, &constraint);
                table.insert_constraint(constraint);
            }
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    for index in source.indexes {
        let unique = index.def.to_ascii_uppercase().contains("UNIQUE");
        let mut converted = Index::new(index.name, index.columns, unique);
        converted.index_type = USING
            .as_ref()
            .and_then(|re| re.captures(&index.def))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        table.insert_index(converted);
    }

    table
}

fn convert_constraint(
    table_name: &str,
    constraint: TblsConstraint,
) -> Result<Option<Constraint>, ProcessError> {
    let converted = match constraint.kind.as_str() {
        "PRIMARY KEY" => Constraint::PrimaryKey(PrimaryKeyConstraint {
            name: constraint.name,
            column_names: constraint.columns,
        }),
        "UNIQUE" => Constraint::Unique(UniqueConstraint {
            name: constraint.name,
            column_names: constraint.columns,
        }),
        "CHECK" => Constraint::Check(CheckConstraint {
            name: constraint.name,
            detail: constraint.def,
        }),
        "FOREIGN KEY" => {
            let target_table_name = constraint.referenced_table.ok_or_else(|| {
                ProcessError::InvalidSchema(format!(
                    "foreign key {}.{} has no referenced_table",
                    table_name, constraint.name
                ))
            })?;
            Constraint::ForeignKey(ForeignKeyConstraint {
                update_constraint: referential_action(&ON_UPDATE, &constraint.def),
                delete_constraint: referential_action(&ON_DELETE, &constraint.def),
                name: constraint.name,
                column_names: constraint.columns,
                target_table_name,
                target_column_names: constraint.referenced_columns,
            })
        }
        other => {
            tracing::debug!(
                event = "tbls_constraint_skipped",
                table = table_name,
                constraint = %constraint.name,
                kind = other
            );
            return Ok(None);
        }
    };
    Ok(Some(converted))
}

fn mark_columns(table: &mut Table, constraint: &Constraint) {
    match constraint {
        Constraint::PrimaryKey(pk) => {
            for name in &pk.column_names {
                if let Some(column) = table.columns.get_mut(name) {
                    column.primary = true;
                }
            }
        }
        Constraint::Unique(unique) => {
            if let [single] = unique.column_names.as_slice() {
                if let Some(column) = table.columns.get_mut(single) {
                    column.unique = true;
                }
            }
        }
        _ => {}
    }
}

fn referential_action(pattern: &Lazy<Option<Regex>>, def: &str) -> ForeignKeyAction {
    pattern
        .as_ref()
        .and_then(|re| re.captures(def))
        .and_then(|caps| caps.get(1))
        .and_then(|m| ForeignKeyAction::parse(m.as_str()))
        .unwrap_or_default()
}

/// Best-effort typing of a default rendered as text: numbers and booleans
/// become JSON numbers and booleans, everything else stays a string.
fn sniff_default(raw: &str) -> DefaultValue {
    let trimmed = raw.trim();
    if let Ok(integer) = trimmed.parse::<i64>() {
        return DefaultValue::integer(integer);
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(DefaultValue::from_f64) {
        return number;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return DefaultValue::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return DefaultValue::Boolean(false);
    }
    DefaultValue::text(raw)
}

fn failed(error: ProcessError) -> ProcessResult {
    ProcessResult::new(Schema::default(), vec![error])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_default_kinds() {
        assert_eq!(sniff_default("0"), DefaultValue::integer(0));
        assert_eq!(sniff_default("2.5"), DefaultValue::from_f64(2.5).unwrap());
        assert_eq!(sniff_default("TRUE"), DefaultValue::Boolean(true));
        assert_eq!(sniff_default("False"), DefaultValue::Boolean(false));
        assert_eq!(sniff_default("now()"), DefaultValue::text("now()"));
    }

    #[test]
    fn extracts_referential_actions() {
        let def = "FOREIGN KEY (user_id) REFERENCES users(id) ON UPDATE RESTRICT ON DELETE SET NULL";
        assert_eq!(referential_action(&ON_UPDATE, def), ForeignKeyAction::Restrict);
        assert_eq!(referential_action(&ON_DELETE, def), ForeignKeyAction::SetNull);
        assert_eq!(
            referential_action(&ON_DELETE, "FOREIGN KEY (a) REFERENCES b(id)"),
            ForeignKeyAction::NoAction
        );
    }
}
