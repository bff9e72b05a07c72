use schemaforge_core::Table;
use schemaforge_operation::{Operation, SchemaOperation};

use crate::postgres::schema::table_statements;
use crate::postgres::utils::{
    add_column, add_constraint, alter_column_default, alter_column_not_null, alter_column_type,
    column_comment, create_enum, create_extension, create_index, drop_column, drop_constraint,
    drop_enum, drop_extension, drop_index, drop_table, enum_comment, rename_column, rename_table,
    table_comment,
};
use crate::result::{DeparseError, DeparseResult};

/// Render one patch operation as the equivalent PostgreSQL statement(s).
///
/// The operation is first matched against the path grammar; operations that
/// do not match, or that have no DDL counterpart here, produce an error and
/// an empty value.
pub fn postgres_operation_deparser(operation: &Operation) -> DeparseResult {
    let typed = match SchemaOperation::try_from(operation) {
        Ok(typed) => typed,
        Err(err) => {
            return DeparseResult::failed(DeparseError::new(format!(
                "cannot deparse {} {}: {err}",
                operation.op.as_str(),
                operation.path
            )));
        }
    };

    match statement(&typed, operation) {
        Ok(value) => DeparseResult::ok(value),
        Err(err) => DeparseResult::failed(err),
    }
}

/// Deparse a list of operations, one statement group per operation.
pub fn postgres_operations_deparser(operations: &[Operation]) -> DeparseResult {
    let mut statements = Vec::new();
    let mut errors = Vec::new();
    for operation in operations {
        let result = postgres_operation_deparser(operation);
        if !result.value.is_empty() {
            statements.push(result.value);
        }
        errors.extend(result.errors);
    }
    DeparseResult {
        value: statements.join("\n\n"),
        errors,
    }
}

fn statement(typed: &SchemaOperation, raw: &Operation) -> Result<String, DeparseError> {
    use SchemaOperation::*;

    let statement = match typed {
        AddTable { table, .. } => create_table_with_constraints(table)?,
        RemoveTable { table_name } => drop_table(table_name),
        ReplaceTableName { table_name, name } => rename_table(table_name, name),
        ReplaceTableComment {
            table_name,
            comment,
        } => table_comment(table_name, comment.as_deref()),

        AddColumn {
            table_name, column, ..
        } => add_column(table_name, column),
        RemoveColumn {
            table_name,
            column_name,
        } => drop_column(table_name, column_name),
        ReplaceColumnName {
            table_name,
            column_name,
            name,
        } => rename_column(table_name, column_name, name),
        ReplaceColumnType {
            table_name,
            column_name,
            data_type,
        } => alter_column_type(table_name, column_name, data_type),
        ReplaceColumnDefault {
            table_name,
            column_name,
            default,
        } => alter_column_default(table_name, column_name, default.as_ref()),
        ReplaceColumnNotNull {
            table_name,
            column_name,
            not_null,
        } => alter_column_not_null(table_name, column_name, *not_null),
        ReplaceColumnComment {
            table_name,
            column_name,
            comment,
        } => column_comment(table_name, column_name, comment.as_deref()),

        AddIndex {
            table_name, index, ..
        } => create_index(table_name, index),
        RemoveIndex { index_name, .. } => drop_index(index_name),

        AddConstraint {
            table_name,
            constraint,
            ..
        } => add_constraint(table_name, constraint)?,
        RemoveConstraint {
            table_name,
            constraint_name,
        } => drop_constraint(table_name, constraint_name),

        AddEnum { enum_type, .. } => match &enum_type.comment {
            Some(comment) => format!(
                "{}\n\n{}",
                create_enum(enum_type),
                enum_comment(&enum_type.name, Some(comment))
            ),
            None => create_enum(enum_type),
        },
        RemoveEnum { enum_name } => drop_enum(enum_name),
        ReplaceEnumComment { enum_name, comment } => enum_comment(enum_name, comment.as_deref()),

        AddExtension { extension_name, .. } => create_extension(extension_name),
        RemoveExtension { extension_name } => drop_extension(extension_name),

        ReplaceTable { .. }
        | ReplaceColumn { .. }
        | ReplaceColumnCheck { .. }
        | ReplaceColumnPrimary { .. }
        | ReplaceColumnUnique { .. }
        | ReplaceIndex { .. }
        | ReplaceIndexName { .. }
        | ReplaceIndexUnique { .. }
        | ReplaceIndexColumns { .. }
        | ReplaceIndexType { .. }
        | ReplaceConstraint { .. }
        | ReplaceEnum { .. }
        | ReplaceEnumName { .. }
        | ReplaceEnumValues { .. } => {
            return Err(DeparseError::new(format!(
                "unsupported operation: {} {}",
                raw.op.as_str(),
                raw.path
            )));
        }
    };
    Ok(statement)
}

fn create_table_with_constraints(table: &Table) -> Result<String, DeparseError> {
    let mut errors = Vec::new();
    let mut statements = table_statements(table, &mut errors);
    if let Some(err) = errors.into_iter().next() {
        return Err(err);
    }
    for constraint in table.constraints.values() {
        statements.push(add_constraint(&table.name, constraint)?);
    }
    Ok(statements.join("\n\n"))
}
