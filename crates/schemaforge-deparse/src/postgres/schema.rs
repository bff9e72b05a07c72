use schemaforge_core::{Constraint, Schema, Table};

use crate::postgres::utils::{
    InlineClauses, add_constraint, column_comment, column_definition, create_enum,
    create_extension, create_index, create_table, enum_comment, table_comment,
};
use crate::result::{DeparseError, DeparseResult};

/// Render a whole schema as a PostgreSQL script.
///
/// Order: extensions, enum types, then per table its `CREATE TABLE`,
/// comments and indexes, then primary key, unique and check constraints,
/// and foreign keys last so every referenced table already exists.
/// Statements are separated by a blank line.
pub fn postgres_schema_deparser(schema: &Schema) -> DeparseResult {
    let mut statements = Vec::new();
    let mut constraints = Vec::new();
    let mut foreign_keys = Vec::new();
    let mut errors = Vec::new();

    for extension in schema.extensions.values() {
        statements.push(create_extension(&extension.name));
    }

    for enum_type in schema.enums.values() {
        statements.push(create_enum(enum_type));
        if let Some(comment) = &enum_type.comment {
            statements.push(enum_comment(&enum_type.name, Some(comment)));
        }
    }

    for table in schema.tables.values() {
        statements.extend(table_statements(table, &mut errors));

        for constraint in table.constraints.values() {
            let target = match constraint {
                Constraint::ForeignKey(_) => &mut foreign_keys,
                _ => &mut constraints,
            };
            match add_constraint(&table.name, constraint) {
                Ok(statement) => target.push(statement),
                Err(err) => errors.push(err),
            }
        }
    }

    statements.extend(constraints);
    statements.extend(foreign_keys);

    tracing::debug!(
        event = "postgres_schema_deparsed",
        statements = statements.len(),
        errors = errors.len()
    );

    DeparseResult {
        value: statements.join("\n\n"),
        errors,
    }
}

/// `CREATE TABLE` with its comment and index statements, without constraints.
pub(crate) fn table_statements(table: &Table, errors: &mut Vec<DeparseError>) -> Vec<String> {
    let mut statements = Vec::new();
    let mut definitions = Vec::new();

    for column in table.columns.values() {
        if column.data_type.trim().is_empty() {
            errors.push(DeparseError::new(format!(
                "column {}.{} has no type",
                table.name, column.name
            )));
            continue;
        }
        definitions.push(column_definition(column, inline_clauses(table, &column.name)));
    }
    statements.push(create_table(&table.name, &definitions));

    if let Some(comment) = &table.comment {
        statements.push(table_comment(&table.name, Some(comment)));
    }
    for column in table.columns.values() {
        if let Some(comment) = &column.comment {
            statements.push(column_comment(&table.name, &column.name, Some(comment)));
        }
    }
    for index in table.indexes.values() {
        statements.push(create_index(&table.name, index));
    }

    statements
}

/// Column flags are emitted inline only when no table constraint covers them.
fn inline_clauses(table: &Table, column_name: &str) -> InlineClauses {
    let single = |columns: &[String]| columns.len() == 1 && columns[0] == column_name;
    let mut inline = InlineClauses {
        primary_key: true,
        unique: true,
        check: true,
    };
    let column_check = table
        .columns
        .values()
        .find(|column| column.name == column_name)
        .and_then(|column| column.check.as_deref());

    for constraint in table.constraints.values() {
        match constraint {
            Constraint::PrimaryKey(pk) => {
                inline.primary_key = false;
                if single(&pk.column_names) {
                    inline.unique = false;
                }
            }
            Constraint::Unique(unique) if single(&unique.column_names) => inline.unique = false,
            Constraint::Check(check) => {
                if column_check.is_some_and(|expression| check.detail.contains(expression)) {
                    inline.check = false;
                }
            }
            _ => {}
        }
    }
    inline
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaforge_core::{Column, PrimaryKeyConstraint, UniqueConstraint};

    #[test]
    fn composite_primary_key_suppresses_inline_primary_key() {
        let mut table = Table::new("t");
        let mut a = Column::new("a", "integer");
        a.primary = true;
        a.unique = true;
        table.insert_column(a);
        table.insert_constraint(Constraint::PrimaryKey(PrimaryKeyConstraint {
            name: "t_pkey".to_string(),
            column_names: vec!["a".to_string(), "b".to_string()],
        }));

        let inline = inline_clauses(&table, "a");
        assert!(!inline.primary_key);
        assert!(inline.unique);

        table.insert_constraint(Constraint::Unique(UniqueConstraint {
            name: "t_a_key".to_string(),
            column_names: vec!["a".to_string()],
        }));
        assert!(!inline_clauses(&table, "a").unique);
    }
}
