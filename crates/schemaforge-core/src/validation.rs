use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::schema::{Schema, Table};

/// Validate internal consistency of a schema.
///
/// This checks:
/// - every table, index, constraint and enum is stored under its own name
/// - primary key, unique and foreign key columns exist
/// - foreign key target tables and columns exist
/// - index columns exist
///
/// Columns may be keyed by an ORM property name that differs from the SQL
/// column name, so column references resolve against either.
pub fn validate_schema(schema: &Schema) -> Result<()> {
    for (key, table) in &schema.tables {
        ensure_key("table", key, &table.name)?;
        validate_table_keys(table)?;
    }

    for (key, enum_type) in &schema.enums {
        ensure_key("enum", key, &enum_type.name)?;
    }

    for (key, extension) in &schema.extensions {
        ensure_key("extension", key, &extension.name)?;
    }

    for table in schema.tables.values() {
        for index in table.indexes.values() {
            for column in &index.columns {
                if !has_column(table, column) {
                    return Err(Error::InvalidSchema(format!(
                        "index column not found: {}.{} ({})",
                        table.name, column, index.name
                    )));
                }
            }
        }

        for constraint in table.constraints.values() {
            match constraint {
                Constraint::PrimaryKey(pk) => {
                    ensure_columns(table, "primary key", &pk.column_names)?;
                }
                Constraint::Unique(unique) => {
                    ensure_columns(table, "unique", &unique.column_names)?;
                }
                Constraint::ForeignKey(fk) => {
                    ensure_columns(table, "foreign key", &fk.column_names)?;

                    let target = schema.tables.get(&fk.target_table_name).ok_or_else(|| {
                        Error::InvalidSchema(format!(
                            "referenced table not found: {} ({})",
                            fk.target_table_name, fk.name
                        ))
                    })?;

                    for column in &fk.target_column_names {
                        if !has_column(target, column) {
                            return Err(Error::InvalidSchema(format!(
                                "referenced column not found: {}.{} ({})",
                                target.name, column, fk.name
                            )));
                        }
                    }

                    if fk.column_names.len() != fk.target_column_names.len() {
                        return Err(Error::InvalidSchema(format!(
                            "foreign key column count mismatch: {}.{}",
                            table.name, fk.name
                        )));
                    }
                }
                Constraint::Check(_) => {}
            }
        }
    }

    Ok(())
}

fn validate_table_keys(table: &Table) -> Result<()> {
    for (key, index) in &table.indexes {
        ensure_key("index", key, &index.name)?;
    }
    for (key, constraint) in &table.constraints {
        ensure_key("constraint", key, constraint.name())?;
    }
    Ok(())
}

fn ensure_key(kind: &str, key: &str, name: &str) -> Result<()> {
    if key != name {
        return Err(Error::InvalidSchema(format!(
            "{kind} stored under key '{key}' is named '{name}'"
        )));
    }
    Ok(())
}

fn has_column(table: &Table, column: &str) -> bool {
    table.columns.contains_key(column) || table.columns.values().any(|c| c.name == column)
}

fn ensure_columns(table: &Table, kind: &str, columns: &[String]) -> Result<()> {
    for column in columns {
        if !has_column(table, column) {
            return Err(Error::InvalidSchema(format!(
                "{kind} column not found: {}.{}",
                table.name, column
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ForeignKeyAction, ForeignKeyConstraint};
    use crate::schema::Column;

    fn users() -> Table {
        let mut table = Table::new("users");
        table.insert_column(Column::new("id", "bigint"));
        table
    }

    #[test]
    fn accepts_consistent_schema() {
        let mut schema = Schema::default();
        schema.insert_table(users());
        assert!(validate_schema(&schema).is_ok());
    }

    #[test]
    fn rejects_mismatched_table_key() {
        let mut schema = Schema::default();
        schema.tables.insert("people".to_string(), users());
        let err = validate_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("'people'"));
    }

    #[test]
    fn resolves_columns_by_sql_name() {
        let mut accounts = Table::new("accounts");
        accounts
            .columns
            .insert("createdAt".to_string(), Column::new("created_at", "timestamp"));
        accounts.insert_constraint(Constraint::Unique(crate::constraints::UniqueConstraint {
            name: "accounts_created_at_key".to_string(),
            column_names: vec!["created_at".to_string()],
        }));

        let mut schema = Schema::default();
        schema.insert_table(accounts);
        assert!(validate_schema(&schema).is_ok());
    }

    #[test]
    fn rejects_missing_fk_target() {
        let mut posts = Table::new("posts");
        posts.insert_column(Column::new("user_id", "bigint"));
        posts.insert_constraint(Constraint::ForeignKey(ForeignKeyConstraint {
            name: "fk_posts_user".to_string(),
            column_names: vec!["user_id".to_string()],
            target_table_name: "accounts".to_string(),
            target_column_names: vec!["id".to_string()],
            update_constraint: ForeignKeyAction::NoAction,
            delete_constraint: ForeignKeyAction::NoAction,
        }));

        let mut schema = Schema::default();
        schema.insert_table(users());
        schema.insert_table(posts);

        let err = validate_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("referenced table not found: accounts"));
    }
}
