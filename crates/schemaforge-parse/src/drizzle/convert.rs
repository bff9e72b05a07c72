//! Mapping of `pgTable`/`pgEnum` bindings onto the canonical schema.

use std::collections::HashMap;

use indexmap::IndexMap;
use schemaforge_core::{
    CheckConstraint, Column, Constraint, DefaultValue, EnumType, ForeignKeyAction,
    ForeignKeyConstraint, Index, PrimaryKeyConstraint, Schema, Table, UniqueConstraint,
};

use crate::drizzle::parser::{Binding, Expr};
use crate::error::ProcessError;

/// SQL names of a table declared in the module, by variable name.
struct TableNames {
    table: String,
    /// property key -> column name
    columns: IndexMap<String, String>,
}

impl TableNames {
    fn column(&self, key: &str) -> String {
        self.columns.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

/// A reference whose target table may be declared later in the module.
struct PendingForeignKey {
    table: String,
    name: Option<String>,
    columns: Vec<String>,
    target: String,
    target_keys: Vec<String>,
    update: ForeignKeyAction,
    delete: ForeignKeyAction,
}

#[derive(Default)]
pub struct Converter {
    pub schema: Schema,
    pub errors: Vec<ProcessError>,
    enums: HashMap<String, String>,
    tables: HashMap<String, TableNames>,
    pending: Vec<PendingForeignKey>,
}

impl Converter {
    pub fn convert(mut self, bindings: &[Binding]) -> (Schema, Vec<ProcessError>) {
        for binding in bindings {
            if let Some(("pgEnum" | "enum", args, _)) = binding.value.chain() {
                self.enumeration(&binding.name, args);
            }
        }
        for binding in bindings {
            if let Some(args) = table_arguments(&binding.value) {
                if let Err(err) = self.table(&binding.name, args) {
                    self.errors.push(err);
                }
            }
        }
        for pending in std::mem::take(&mut self.pending) {
            if let Err(err) = self.foreign_key(pending) {
                self.errors.push(err);
            }
        }
        (self.schema, self.errors)
    }

    fn enumeration(&mut self, variable: &str, args: &[Expr]) {
        let Some(name) = args.first().and_then(Expr::as_str) else {
            self.errors.push(ProcessError::UnsupportedToken(format!(
                "enum {variable} needs a literal name"
            )));
            return;
        };
        let values = match args.get(1) {
            Some(Expr::Array(items)) => items
                .iter()
                .filter_map(Expr::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        self.enums.insert(variable.to_string(), name.to_string());
        self.schema.insert_enum(EnumType::new(name, values));
    }

    fn table(&mut self, variable: &str, args: &[Expr]) -> Result<(), ProcessError> {
        let table_name = args.first().and_then(Expr::as_str).ok_or_else(|| {
            ProcessError::UnsupportedToken(format!("table {variable} needs a literal name"))
        })?;
        let columns = match args.get(1) {
            Some(Expr::Arrow(_, body)) => body.as_ref(),
            Some(other) => other,
            None => {
                return Err(ProcessError::UnexpectedToken(format!(
                    "table {table_name} has no columns"
                )));
            }
        };
        let Expr::Object(entries) = columns else {
            return Err(ProcessError::UnexpectedToken(format!(
                "columns of {table_name} must be an object literal"
            )));
        };

        let mut table = Table::new(table_name);
        let mut names = TableNames {
            table: table_name.to_string(),
            columns: IndexMap::new(),
        };
        for (key, _) in entries {
            names.columns.insert(key.clone(), key.clone());
        }
        for (key, expr) in entries {
            match self.column(&mut table, key, expr) {
                Ok(column_name) => {
                    names.columns.insert(key.clone(), column_name);
                }
                Err(err) => self.errors.push(err),
            }
        }

        if let Some(Expr::Arrow(_, body)) = args.get(2) {
            let items: Vec<&Expr> = match body.as_ref() {
                Expr::Object(entries) => entries.iter().map(|(_, value)| value).collect(),
                Expr::Array(items) => items.iter().collect(),
                _ => Vec::new(),
            };
            for item in items {
                if let Err(err) = self.table_config(&mut table, &names, item) {
                    self.errors.push(err);
                }
            }
        }

        tracing::debug!(
            event = "drizzle_table_parsed",
            table = %table_name,
            columns = table.columns.len()
        );
        self.tables.insert(variable.to_string(), names);
        self.schema.insert_table(table);
        Ok(())
    }

    /// Adds one column and returns its SQL name.
    fn column(
        &mut self,
        table: &mut Table,
        key: &str,
        expr: &Expr,
    ) -> Result<String, ProcessError> {
        let (builder, args, methods) = expr.chain().ok_or_else(|| {
            ProcessError::UnsupportedToken(format!("column {key} is not a builder call"))
        })?;
        let column_name = args.first().and_then(Expr::as_str).unwrap_or(key).to_string();
        let options = args.iter().find(|arg| matches!(arg, Expr::Object(_)));

        let data_type = match self.enums.get(builder) {
            Some(enum_name) => enum_name.clone(),
            None => column_type(builder, options).ok_or_else(|| {
                ProcessError::UnsupportedToken(format!("unknown column builder {builder}"))
            })?,
        };

        let table_name = table.name.clone();
        let mut column = Column::new(column_name.as_str(), data_type);
        for (method, method_args) in methods {
            match method {
                "notNull" => column.not_null = true,
                "primaryKey" => {
                    column.primary = true;
                    column.not_null = true;
                    table.insert_constraint(Constraint::PrimaryKey(PrimaryKeyConstraint {
                        name: format!("{table_name}_pkey"),
                        column_names: vec![column_name.clone()],
                    }));
                }
                "unique" => {
                    column.unique = true;
                    let name = method_args
                        .first()
                        .and_then(Expr::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{table_name}_{column_name}_unique"));
                    table.insert_constraint(Constraint::Unique(UniqueConstraint {
                        name,
                        column_names: vec![column_name.clone()],
                    }));
                }
                "default" => column.default = method_args.first().and_then(default_value),
                "defaultNow" => column.default = Some(DefaultValue::text("now()")),
                "defaultRandom" => column.default = Some(DefaultValue::text("gen_random_uuid()")),
                "references" => {
                    let (target, target_key) = method_args
                        .first()
                        .and_then(reference_target)
                        .ok_or_else(|| {
                            ProcessError::UnsupportedToken(format!(
                                "reference of {table_name}.{column_name} must be `() => table.column`"
                            ))
                        })?;
                    let options = method_args.get(1);
                    self.pending.push(PendingForeignKey {
                        table: table_name.clone(),
                        name: None,
                        columns: vec![column_name.clone()],
                        target,
                        target_keys: vec![target_key],
                        update: action(options.and_then(|o| o.field("onUpdate")))?,
                        delete: action(options.and_then(|o| o.field("onDelete")))?,
                    });
                }
                "comment" => {
                    column.comment = method_args.first().and_then(Expr::as_str).map(str::to_string);
                }
                "array" => column.data_type.push_str("[]"),
                "generatedAlwaysAsIdentity" | "generatedByDefaultAsIdentity" => {
                    column.not_null = true;
                }
                other => tracing::debug!(
                    event = "drizzle_method_skipped",
                    table = %table_name,
                    column = %column_name,
                    method = %other
                ),
            }
        }

        table.columns.insert(key.to_string(), column);
        Ok(column_name)
    }

    fn table_config(
        &mut self,
        table: &mut Table,
        names: &TableNames,
        item: &Expr,
    ) -> Result<(), ProcessError> {
        let (builder, args, methods) = item.chain().ok_or_else(|| {
            ProcessError::UnsupportedToken(format!("unsupported config entry on {}", names.table))
        })?;
        let explicit_name = args.first().and_then(Expr::as_str).map(str::to_string);
        let table_name = names.table.as_str();

        match builder {
            "index" | "uniqueIndex" => {
                let mut columns = Vec::new();
                let mut index_type = String::new();
                for (method, method_args) in &methods {
                    match *method {
                        "on" => columns = column_refs(method_args, names),
                        "using" => {
                            index_type = method_args
                                .first()
                                .and_then(Expr::as_str)
                                .unwrap_or_default()
                                .to_string();
                            columns = column_refs(method_args.get(1..).unwrap_or_default(), names);
                        }
                        _ => {}
                    }
                }
                let name = explicit_name
                    .unwrap_or_else(|| format!("{table_name}_{}_index", columns.join("_")));
                let mut index = Index::new(name, columns, builder == "uniqueIndex");
                index.index_type = index_type;
                table.insert_index(index);
            }
            "primaryKey" => {
                let (columns, name) = match args.first() {
                    Some(options @ Expr::Object(_)) => (
                        options
                            .field("columns")
                            .map(|columns| column_refs(std::slice::from_ref(columns), names))
                            .unwrap_or_default(),
                        options.field("name").and_then(Expr::as_str).map(str::to_string),
                    ),
                    _ => (column_refs(args, names), None),
                };
                for column in table.columns.values_mut() {
                    if columns.contains(&column.name) {
                        column.primary = true;
                        column.not_null = true;
                    }
                }
                let name = name.unwrap_or_else(|| format!("{table_name}_{}_pk", columns.join("_")));
                table.insert_constraint(Constraint::PrimaryKey(PrimaryKeyConstraint {
                    name,
                    column_names: columns,
                }));
            }
            "unique" => {
                let columns = methods
                    .iter()
                    .find(|(method, _)| *method == "on")
                    .map(|(_, method_args)| column_refs(method_args, names))
                    .unwrap_or_default();
                let name = explicit_name
                    .unwrap_or_else(|| format!("{table_name}_{}_unique", columns.join("_")));
                table.insert_constraint(Constraint::Unique(UniqueConstraint {
                    name,
                    column_names: columns,
                }));
            }
            "foreignKey" => {
                let options = args.first().ok_or_else(|| {
                    ProcessError::UnexpectedToken(format!(
                        "foreignKey on {table_name} needs options"
                    ))
                })?;
                let columns = options
                    .field("columns")
                    .map(|columns| column_refs(std::slice::from_ref(columns), names))
                    .unwrap_or_default();
                let targets: Vec<(String, String)> = match options.field("foreignColumns") {
                    Some(Expr::Array(items)) => items.iter().filter_map(member_parts).collect(),
                    _ => Vec::new(),
                };
                let Some((target, _)) = targets.first().cloned() else {
                    return Err(ProcessError::UnexpectedToken(format!(
                        "foreignKey on {table_name} needs foreignColumns"
                    )));
                };
                let mut update = ForeignKeyAction::NoAction;
                let mut delete = ForeignKeyAction::NoAction;
                for (method, method_args) in &methods {
                    match *method {
                        "onUpdate" => update = action(method_args.first())?,
                        "onDelete" => delete = action(method_args.first())?,
                        _ => {}
                    }
                }
                self.pending.push(PendingForeignKey {
                    table: table_name.to_string(),
                    name: options.field("name").and_then(Expr::as_str).map(str::to_string),
                    columns,
                    target,
                    target_keys: targets.into_iter().map(|(_, key)| key).collect(),
                    update,
                    delete,
                });
            }
            "check" => {
                let name = explicit_name.ok_or_else(|| {
                    ProcessError::UnexpectedToken(format!("check on {table_name} needs a name"))
                })?;
                let expression = match args.get(1) {
                    Some(Expr::Template(_, text)) => render_sql(text, names),
                    _ => {
                        return Err(ProcessError::UnsupportedToken(format!(
                            "check {name} needs a sql`` expression"
                        )));
                    }
                };
                table.insert_constraint(Constraint::Check(CheckConstraint {
                    name,
                    detail: format!("CHECK ({expression})"),
                }));
            }
            other => {
                return Err(ProcessError::UnsupportedToken(format!(
                    "unsupported table config {other} on {table_name}"
                )));
            }
        }
        Ok(())
    }

    fn foreign_key(&mut self, pending: PendingForeignKey) -> Result<(), ProcessError> {
        let target = self.tables.get(&pending.target).ok_or_else(|| {
            ProcessError::UnexpectedToken(format!("unknown referenced table {}", pending.target))
        })?;
        let target_columns: Vec<String> = pending
            .target_keys
            .iter()
            .map(|key| target.column(key))
            .collect();
        let name = pending.name.unwrap_or_else(|| {
            format!(
                "{}_{}_{}_{}_fk",
                pending.table,
                pending.columns.join("_"),
                target.table,
                target_columns.join("_")
            )
        });
        let constraint = Constraint::ForeignKey(ForeignKeyConstraint {
            name,
            column_names: pending.columns,
            target_table_name: target.table.clone(),
            target_column_names: target_columns,
            update_constraint: pending.update,
            delete_constraint: pending.delete,
        });
        if let Some(table) = self.schema.tables.get_mut(&pending.table) {
            table.insert_constraint(constraint);
        }
        Ok(())
    }
}

/// Arguments of `pgTable(...)`, `schema.table(...)` or `pgSchema('s').table(...)`.
fn table_arguments(expr: &Expr) -> Option<&[Expr]> {
    let (base, args, methods) = expr.chain()?;
    match base {
        "pgTable" | "table" => Some(args),
        "pgSchema" => methods
            .into_iter()
            .find(|(method, _)| *method == "table")
            .map(|(_, args)| args),
        _ => None,
    }
}

fn column_type(builder: &str, options: Option<&Expr>) -> Option<String> {
    let option = |key: &str| -> Option<String> {
        match options?.field(key)? {
            Expr::Num(num) => Some(num.clone()),
            Expr::Str(text) => Some(text.clone()),
            Expr::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    };
    let sized = |base: &str| match option("length") {
        Some(length) => format!("{base}({length})"),
        None => base.to_string(),
    };

    let data_type = match builder {
        "serial" | "bigserial" | "smallserial" | "integer" | "smallint" | "bigint" | "text"
        | "boolean" | "date" | "json" | "jsonb" | "uuid" | "real" | "interval" | "inet"
        | "cidr" | "macaddr" | "point" | "line" => builder.to_string(),
        "int" => "integer".to_string(),
        "varchar" => sized("varchar"),
        "char" => sized("char"),
        "doublePrecision" => "double precision".to_string(),
        "numeric" | "decimal" => match (option("precision"), option("scale")) {
            (Some(precision), Some(scale)) => format!("numeric({precision}, {scale})"),
            (Some(precision), None) => format!("numeric({precision})"),
            _ => "numeric".to_string(),
        },
        "timestamp" | "time" => {
            let mut data_type = match option("precision") {
                Some(precision) => format!("{builder}({precision})"),
                None => builder.to_string(),
            };
            if option("withTimezone").as_deref() == Some("true") {
                data_type.push_str(" with time zone");
            }
            data_type
        }
        _ => return None,
    };
    Some(data_type)
}

fn default_value(expr: &Expr) -> Option<DefaultValue> {
    match expr {
        Expr::Str(text) => Some(DefaultValue::text(text.as_str())),
        Expr::Num(num) => num
            .parse::<i64>()
            .map(DefaultValue::integer)
            .ok()
            .or_else(|| num.parse::<f64>().ok().and_then(DefaultValue::from_f64)),
        Expr::Bool(value) => Some(DefaultValue::Boolean(*value)),
        Expr::Template(_, text) => Some(DefaultValue::text(text.as_str())),
        _ => None,
    }
}

/// `() => users.id` -> (`users`, `id`).
fn reference_target(expr: &Expr) -> Option<(String, String)> {
    match expr {
        Expr::Arrow(_, body) => member_parts(body),
        other => member_parts(other),
    }
}

fn member_parts(expr: &Expr) -> Option<(String, String)> {
    match expr {
        Expr::Member(receiver, key) => match receiver.as_ref() {
            Expr::Ident(object) => Some((object.clone(), key.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Column names referenced as `table.key` (or inside arrays of them).
fn column_refs(args: &[Expr], names: &TableNames) -> Vec<String> {
    args.iter()
        .flat_map(|arg| match arg {
            Expr::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .filter_map(|arg| match arg {
            Expr::Member(_, key) => Some(names.column(key)),
            Expr::Str(name) => Some(name.clone()),
            Expr::Template(_, text) => Some(render_sql(text, names)),
            // `t.name.asc()`
            Expr::Call(callee, _) => match callee.as_ref() {
                Expr::Member(inner, _) => match inner.as_ref() {
                    Expr::Member(_, key) => Some(names.column(key)),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn action(expr: Option<&Expr>) -> Result<ForeignKeyAction, ProcessError> {
    let Some(raw) = expr.and_then(Expr::as_str) else {
        return Ok(ForeignKeyAction::NoAction);
    };
    ForeignKeyAction::parse(raw)
        .ok_or_else(|| ProcessError::UnexpectedToken(format!("unknown referential action {raw}")))
}

/// Replace `${table.key}` substitutions with column names.
fn render_sql(text: &str, names: &TableNames) -> String {
    let mut rendered = String::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };
        let inner = after[..end].trim();
        let key = inner.rsplit('.').next().unwrap_or(inner);
        rendered.push_str(&names.column(key));
        rest = &after[end + 1..];
    }
    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_builders_to_sql_types() {
        let options = Expr::Object(vec![
            ("precision".to_string(), Expr::Num("10".to_string())),
            ("scale".to_string(), Expr::Num("2".to_string())),
        ]);
        assert_eq!(column_type("numeric", Some(&options)).as_deref(), Some("numeric(10, 2)"));

        let tz = Expr::Object(vec![("withTimezone".to_string(), Expr::Bool(true))]);
        assert_eq!(
            column_type("timestamp", Some(&tz)).as_deref(),
            Some("timestamp with time zone")
        );
        assert_eq!(column_type("doublePrecision", None).as_deref(), Some("double precision"));
        assert_eq!(column_type("geometry", None), None);
    }

    #[test]
    fn renders_template_substitutions() {
        let mut columns = IndexMap::new();
        columns.insert("createdAt".to_string(), "created_at".to_string());
        let names = TableNames {
            table: "t".to_string(),
            columns,
        };
        assert_eq!(
            render_sql("${table.createdAt} < now() and ${x} > 0", &names),
            "created_at < now() and x > 0"
        );
    }
}
