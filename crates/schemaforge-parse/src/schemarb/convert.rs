//! Interpretation of `schema.rb` calls as schema changes.

use schemaforge_core::{
    CheckConstraint, Column, Constraint, DefaultValue, EnumType, Extension, ForeignKeyAction,
    ForeignKeyConstraint, Index, PrimaryKeyConstraint, Schema, Table, UniqueConstraint,
};

use crate::error::ProcessError;
use crate::schemarb::parser::{Call, Value};

const IMPLICIT_ID_TYPE: &str = "bigserial";

#[derive(Default)]
pub struct Converter {
    pub schema: Schema,
    pub errors: Vec<ProcessError>,
}

impl Converter {
    pub fn statements(&mut self, calls: &[Call]) {
        for call in calls {
            self.statement(call);
        }
    }

    fn statement(&mut self, call: &Call) {
        let outcome = match call.method.as_str() {
            "define" => {
                if let Some(block) = &call.block {
                    self.statements(&block.body);
                }
                Ok(())
            }
            "create_table" => self.create_table(call),
            "add_index" => self.add_index(call),
            "add_foreign_key" => self.add_foreign_key(call),
            "add_check_constraint" => self.add_check_constraint(call),
            "create_enum" => self.create_enum(call),
            "enable_extension" => self.enable_extension(call),
            other => Err(ProcessError::UnsupportedToken(format!(
                "unsupported schema.rb statement: {other}"
            ))),
        };
        if let Err(err) = outcome {
            self.errors.push(err);
        }
    }

    fn create_table(&mut self, call: &Call) -> Result<(), ProcessError> {
        let table_name = literal_name(call, 0, "table name")?;
        let mut table = Table::new(table_name.as_str());
        table.comment = call.option("comment").and_then(Value::as_name).map(str::to_string);

        let composite_key = match call.option("primary_key") {
            Some(Value::Array(columns)) => Some(
                columns
                    .iter()
                    .filter_map(Value::as_name)
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        };
        let key_name = call
            .option("primary_key")
            .and_then(Value::as_name)
            .unwrap_or("id")
            .to_string();
        let implicit_id = composite_key.is_none() && call.option("id") != Some(&Value::Bool(false));

        if implicit_id {
            let mut id = Column::new(key_name.as_str(), implicit_id_type(call.option("id")));
            id.primary = true;
            id.not_null = true;
            table.insert_column(id);
        }

        if let Some(block) = &call.block {
            for statement in &block.body {
                if let Err(err) = self.table_statement(&mut table, statement) {
                    self.errors.push(err);
                }
            }
        }

        let key_columns = match composite_key {
            Some(columns) => Some(columns),
            None if implicit_id => Some(vec![key_name]),
            None => None,
        };
        if let Some(columns) = key_columns {
            for name in &columns {
                if let Some(column) = table.columns.get_mut(name) {
                    column.primary = true;
                    column.not_null = true;
                }
            }
            table.insert_constraint(Constraint::PrimaryKey(PrimaryKeyConstraint {
                name: format!("{table_name}_pkey"),
                column_names: columns,
            }));
        }

        self.schema.insert_table(table);
        Ok(())
    }

    fn table_statement(&mut self, table: &mut Table, call: &Call) -> Result<(), ProcessError> {
        match call.method.as_str() {
            "index" => {
                let index = index_definition(&table.name, call.args.first(), call)?;
                table.insert_index(index);
                Ok(())
            }
            "timestamps" => {
                let not_null = call.option("null") != Some(&Value::Bool(true));
                for name in ["created_at", "updated_at"] {
                    let mut column = Column::new(name, "datetime");
                    column.not_null = not_null;
                    apply_default(&mut column, call.option("default"))?;
                    table.insert_column(column);
                }
                Ok(())
            }
            "references" | "belongs_to" => self.references(table, call),
            "check_constraint" => {
                let expression = call.args.first().and_then(Value::as_name).ok_or_else(|| {
                    ProcessError::UnexpectedToken(
                        "check_constraint needs an expression".to_string(),
                    )
                })?;
                insert_check(table, expression, call.option("name"));
                Ok(())
            }
            "column" => {
                let column_type = call.args.get(1).and_then(Value::as_name).ok_or_else(|| {
                    ProcessError::UnexpectedToken("t.column needs a type".to_string())
                })?;
                let name = literal_name(call, 0, "column name")?;
                add_column(table, &name, column_type, call)
            }
            column_type => {
                if call.args.is_empty() {
                    return Err(ProcessError::UnexpectedToken(format!(
                        "t.{column_type} needs a column name"
                    )));
                }
                for position in 0..call.args.len() {
                    let name = literal_name(call, position, "column name")?;
                    add_column(table, &name, column_type, call)?;
                }
                Ok(())
            }
        }
    }

    fn references(&mut self, table: &mut Table, call: &Call) -> Result<(), ProcessError> {
        let reference = literal_name(call, 0, "reference name")?;
        let column_name = format!("{reference}_id");
        let column_type = call.option("type").and_then(Value::as_name).unwrap_or("bigint");

        let mut column = Column::new(column_name.as_str(), column_type);
        column.not_null = call.option("null") == Some(&Value::Bool(false));
        table.insert_column(column);

        let polymorphic = call.option("polymorphic") == Some(&Value::Bool(true));
        let mut index_columns = vec![column_name.clone()];
        if polymorphic {
            let type_column = format!("{reference}_type");
            let mut column = Column::new(type_column.as_str(), "string");
            column.not_null = call.option("null") == Some(&Value::Bool(false));
            table.insert_column(column);
            index_columns.insert(0, type_column);
        }

        match call.option("index") {
            Some(Value::Bool(false)) => {}
            Some(Value::Hash(options)) => {
                let unique = options.get("unique") == Some(&Value::Bool(true));
                let name = options
                    .get("name")
                    .and_then(Value::as_name)
                    .map(str::to_string)
                    .unwrap_or_else(|| default_index_name(&table.name, &index_columns));
                table.insert_index(Index::new(name, index_columns, unique));
            }
            _ => {
                let name = default_index_name(&table.name, &index_columns);
                table.insert_index(Index::new(name, index_columns, false));
            }
        }

        let target = match call.option("foreign_key") {
            Some(Value::Bool(true)) => Some((pluralize(&reference), None, None)),
            Some(Value::Hash(options)) => Some((
                options
                    .get("to_table")
                    .and_then(Value::as_name)
                    .map(str::to_string)
                    .unwrap_or_else(|| pluralize(&reference)),
                options.get("on_update").and_then(Value::as_name).and_then(ForeignKeyAction::parse),
                options.get("on_delete").and_then(Value::as_name).and_then(ForeignKeyAction::parse),
            )),
            _ => None,
        };
        if let Some((target_table, on_update, on_delete)) = target {
            table.insert_constraint(Constraint::ForeignKey(ForeignKeyConstraint {
                name: format!("fk_{}_{column_name}", table.name),
                column_names: vec![column_name],
                target_table_name: target_table,
                target_column_names: vec!["id".to_string()],
                update_constraint: on_update.unwrap_or_default(),
                delete_constraint: on_delete.unwrap_or_default(),
            }));
        }
        Ok(())
    }

    fn add_index(&mut self, call: &Call) -> Result<(), ProcessError> {
        let table_name = literal_name(call, 0, "table name")?;
        let table = self.table_mut(&table_name)?;
        let index = index_definition(&table_name, call.args.get(1), call)?;
        table.insert_index(index);
        Ok(())
    }

    fn add_foreign_key(&mut self, call: &Call) -> Result<(), ProcessError> {
        let from_table = literal_name(call, 0, "table name")?;
        let to_table = literal_name(call, 1, "referenced table name")?;

        let column = call
            .option("column")
            .and_then(Value::as_name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_id", singularize(&to_table)));
        let primary_key = call
            .option("primary_key")
            .and_then(Value::as_name)
            .unwrap_or("id")
            .to_string();
        let name = call
            .option("name")
            .and_then(Value::as_name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("fk_{from_table}_{column}"));

        let constraint = Constraint::ForeignKey(ForeignKeyConstraint {
            name,
            column_names: vec![column],
            target_table_name: to_table,
            target_column_names: vec![primary_key],
            update_constraint: action_option(call, "on_update")?,
            delete_constraint: action_option(call, "on_delete")?,
        });
        self.table_mut(&from_table)?.insert_constraint(constraint);
        Ok(())
    }

    fn add_check_constraint(&mut self, call: &Call) -> Result<(), ProcessError> {
        let table_name = literal_name(call, 0, "table name")?;
        let expression = call.args.get(1).and_then(Value::as_name).ok_or_else(|| {
            ProcessError::UnexpectedToken("add_check_constraint needs an expression".to_string())
        })?;
        let table = self.table_mut(&table_name)?;
        insert_check(table, expression, call.option("name"));
        Ok(())
    }

    fn create_enum(&mut self, call: &Call) -> Result<(), ProcessError> {
        let name = literal_name(call, 0, "enum name")?;
        let values = match call.args.get(1) {
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value.as_name().map(str::to_string).ok_or_else(|| {
                        ProcessError::UnsupportedToken(format!(
                            "enum value must be a literal, found {}",
                            value.describe()
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(ProcessError::UnexpectedToken(format!(
                    "create_enum {name} needs a list of values"
                )))
            }
        };
        self.schema.insert_enum(EnumType::new(name, values));
        Ok(())
    }

    fn enable_extension(&mut self, call: &Call) -> Result<(), ProcessError> {
        let name = literal_name(call, 0, "extension name")?;
        self.schema.extensions.insert(name.clone(), Extension { name });
        Ok(())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table, ProcessError> {
        self.schema
            .tables
            .get_mut(name)
            .ok_or_else(|| ProcessError::InvalidSchema(format!("table not found: {name}")))
    }
}

/// A positional argument that must be a string or symbol literal.
fn literal_name(call: &Call, position: usize, what: &str) -> Result<String, ProcessError> {
    match call.args.get(position) {
        Some(value) => value.as_name().map(str::to_string).ok_or_else(|| {
            ProcessError::UnsupportedToken(format!(
                "{what} in {} must be a literal, found {}",
                call.method,
                value.describe()
            ))
        }),
        None => Err(ProcessError::UnexpectedToken(format!(
            "{} is missing its {what}",
            call.method
        ))),
    }
}

fn implicit_id_type(option: Option<&Value>) -> String {
    match option.and_then(Value::as_name) {
        None => IMPLICIT_ID_TYPE.to_string(),
        Some("integer" | "serial") => "serial".to_string(),
        Some("bigint" | "bigserial") => IMPLICIT_ID_TYPE.to_string(),
        Some(other) => other.to_string(),
    }
}

fn add_column(
    table: &mut Table,
    name: &str,
    column_type: &str,
    call: &Call,
) -> Result<(), ProcessError> {
    let mut data_type = column_type.to_string();
    if call.option("array") == Some(&Value::Bool(true)) {
        data_type.push_str("[]");
    }

    let mut column = Column::new(name, data_type);
    column.not_null = call.option("null") == Some(&Value::Bool(false));
    column.comment = call.option("comment").and_then(Value::as_name).map(str::to_string);
    apply_default(&mut column, call.option("default"))?;

    if call.option("primary_key") == Some(&Value::Bool(true)) {
        column.primary = true;
        column.not_null = true;
    }
    if let Some(existing) = table.columns.get(name) {
        column.primary |= existing.primary;
        column.not_null |= existing.primary;
    }

    if call.option("unique") == Some(&Value::Bool(true)) {
        column.unique = true;
        table.insert_constraint(Constraint::Unique(UniqueConstraint {
            name: format!("UNIQUE_{name}"),
            column_names: vec![name.to_string()],
        }));
    }

    match call.option("index") {
        Some(Value::Bool(true)) => {
            let columns = vec![name.to_string()];
            table.insert_index(Index::new(
                default_index_name(&table.name, &columns),
                columns,
                false,
            ));
        }
        Some(Value::Hash(options)) => {
            let columns = vec![name.to_string()];
            let unique = options.get("unique") == Some(&Value::Bool(true));
            let index_name = options
                .get("name")
                .and_then(Value::as_name)
                .map(str::to_string)
                .unwrap_or_else(|| default_index_name(&table.name, &columns));
            table.insert_index(Index::new(index_name, columns, unique));
        }
        _ => {}
    }

    table.insert_column(column);
    Ok(())
}

fn apply_default(column: &mut Column, value: Option<&Value>) -> Result<(), ProcessError> {
    let Some(value) = value else {
        return Ok(());
    };
    column.default = match value {
        Value::Lambda(body) => match body.as_ref() {
            Value::Str(expression) => Some(DefaultValue::text(expression.as_str())),
            other => Some(literal_default(other)?),
        },
        Value::Nil => None,
        other => Some(literal_default(other)?),
    };
    Ok(())
}

fn literal_default(value: &Value) -> Result<DefaultValue, ProcessError> {
    match value {
        Value::Str(text) | Value::Symbol(text) => Ok(DefaultValue::text(text.as_str())),
        Value::Bool(flag) => Ok(DefaultValue::Boolean(*flag)),
        Value::Num(number) => Ok(number
            .parse::<i64>()
            .map(DefaultValue::integer)
            .ok()
            .or_else(|| number.parse::<f64>().ok().and_then(DefaultValue::from_f64))
            .unwrap_or_else(|| DefaultValue::text(number.as_str()))),
        other => Err(ProcessError::UnsupportedToken(format!(
            "default must be a literal, found {}",
            other.describe()
        ))),
    }
}

fn index_definition(
    table_name: &str,
    columns: Option<&Value>,
    call: &Call,
) -> Result<Index, ProcessError> {
    let columns: Vec<String> = match columns {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_name)
            .map(str::to_string)
            .collect(),
        Some(value) => match value.as_name() {
            Some(column) => vec![column.to_string()],
            None => {
                return Err(ProcessError::UnsupportedToken(format!(
                    "index columns must be literals, found {}",
                    value.describe()
                )))
            }
        },
        None => {
            return Err(ProcessError::UnexpectedToken(format!(
                "index on {table_name} has no columns"
            )))
        }
    };

    let name = call
        .option("name")
        .and_then(Value::as_name)
        .map(str::to_string)
        .unwrap_or_else(|| default_index_name(table_name, &columns));
    let unique = call.option("unique") == Some(&Value::Bool(true));

    let mut index = Index::new(name, columns, unique);
    index.index_type = call
        .option("using")
        .and_then(Value::as_name)
        .map(str::to_string)
        .unwrap_or_default();
    Ok(index)
}

/// Rails' naming: `index_<table>_on_<col>_and_<col>`.
fn default_index_name(table_name: &str, columns: &[String]) -> String {
    format!("index_{table_name}_on_{}", columns.join("_and_"))
}

fn insert_check(table: &mut Table, expression: &str, name: Option<&Value>) {
    let name = name
        .and_then(Value::as_name)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let base = format!("{}_check", table.name);
            let mut candidate = base.clone();
            let mut suffix = 1;
            while table.constraints.contains_key(&candidate) {
                candidate = format!("{base}{suffix}");
                suffix += 1;
            }
            candidate
        });
    table.insert_constraint(Constraint::Check(CheckConstraint {
        name,
        detail: format!("CHECK ({expression})"),
    }));
}

fn action_option(call: &Call, key: &str) -> Result<ForeignKeyAction, ProcessError> {
    match call.option(key) {
        None => Ok(ForeignKeyAction::NoAction),
        Some(value) => value
            .as_name()
            .and_then(ForeignKeyAction::parse)
            .ok_or_else(|| ProcessError::UnsupportedToken(format!("{key}: {}", value.describe()))),
    }
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }
    format!("{word}s")
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["ses", "xes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflects_table_names() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
    }

    #[test]
    fn names_indexes_like_rails() {
        let columns = vec!["user_id".to_string(), "created_at".to_string()];
        assert_eq!(
            default_index_name("posts", &columns),
            "index_posts_on_user_id_and_created_at"
        );
    }
}
