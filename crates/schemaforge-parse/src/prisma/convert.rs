//! Mapping of Prisma models and enums onto the canonical schema.

use std::collections::HashMap;

use schemaforge_core::{
    Column, Constraint, DefaultValue, EnumType, ForeignKeyAction, ForeignKeyConstraint, Index,
    PrimaryKeyConstraint, Schema, Table, UniqueConstraint,
};

use crate::error::ProcessError;
use crate::prisma::parser::{Attribute, Document, EnumBlock, Expr, Field, Model};

/// Database names of one model: its table and each scalar field's column.
struct ModelNames {
    table: String,
    columns: HashMap<String, String>,
    id_fields: Vec<String>,
}

impl ModelNames {
    fn column<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns.get(field).map(String::as_str).unwrap_or(field)
    }

    fn columns(&self, fields: &[String]) -> Vec<String> {
        fields.iter().map(|field| self.column(field).to_string()).collect()
    }
}

pub struct Converter<'a> {
    document: &'a Document,
    models: HashMap<&'a str, ModelNames>,
    enums: HashMap<&'a str, String>,
    pub schema: Schema,
    pub errors: Vec<ProcessError>,
}

impl<'a> Converter<'a> {
    pub fn new(document: &'a Document) -> Self {
        let enums = document
            .enums
            .iter()
            .map(|block| (block.name.as_str(), mapped_name(&block.attributes, &block.name)))
            .collect();

        let mut converter = Self {
            document,
            models: HashMap::new(),
            enums,
            schema: Schema::default(),
            errors: Vec::new(),
        };
        for model in &document.models {
            let names = converter.model_names(model);
            converter.models.insert(model.name.as_str(), names);
        }
        converter
    }

    fn model_names(&self, model: &Model) -> ModelNames {
        let columns = model
            .fields
            .iter()
            .filter(|field| !self.is_relation(field))
            .map(|field| (field.name.clone(), field_column_name(field)))
            .collect();
        let id_fields = model
            .fields
            .iter()
            .filter(|field| field.attribute("id").is_some())
            .map(|field| field.name.clone())
            .collect::<Vec<_>>();
        let id_fields = if id_fields.is_empty() {
            model
                .attributes
                .iter()
                .find(|attribute| attribute.name == "id")
                .and_then(|attribute| attribute.arg("fields").or_else(|| attribute.positional(0)))
                .map(Expr::names)
                .unwrap_or_default()
        } else {
            id_fields
        };
        ModelNames {
            table: mapped_name(&model.attributes, &model.name),
            columns,
            id_fields,
        }
    }

    fn is_relation(&self, field: &Field) -> bool {
        self.document
            .models
            .iter()
            .any(|model| model.name == field.field_type)
    }

    pub fn convert(mut self) -> (Schema, Vec<ProcessError>) {
        let document = self.document;
        for block in &document.enums {
            self.enumeration(block);
        }
        for model in &document.models {
            self.model(model);
        }
        (self.schema, self.errors)
    }

    fn enumeration(&mut self, block: &EnumBlock) {
        let values = block
            .values
            .iter()
            .map(|(value, mapped)| mapped.clone().unwrap_or_else(|| value.clone()))
            .collect();
        let mut enum_type = EnumType::new(mapped_name(&block.attributes, &block.name), values);
        enum_type.comment = block.doc.clone();
        self.schema.insert_enum(enum_type);
    }

    fn model(&mut self, model: &Model) {
        let Some(names) = self.models.get(model.name.as_str()) else {
            return;
        };
        let table_name = names.table.clone();
        let mut table = Table::new(table_name.as_str());
        table.comment = model.doc.clone();
        let mut errors = Vec::new();

        let mut relations = Vec::new();
        for field in &model.fields {
            if self.is_relation(field) {
                if let Some(relation) = field.attribute("relation") {
                    relations.push((field, relation));
                }
                continue;
            }
            match self.column(&table_name, field) {
                Ok(column) => {
                    table.columns.insert(field.name.clone(), column);
                }
                Err(err) => errors.push(err),
            }
        }

        let id_columns = names.columns(&names.id_fields);
        if !id_columns.is_empty() {
            for field in &names.id_fields {
                if let Some(column) = table.columns.get_mut(field) {
                    column.primary = true;
                    column.not_null = true;
                }
            }
            let name = model
                .attributes
                .iter()
                .find(|attribute| attribute.name == "id")
                .and_then(attribute_map)
                .unwrap_or_else(|| format!("{table_name}_pkey"));
            table.insert_constraint(Constraint::PrimaryKey(PrimaryKeyConstraint {
                name,
                column_names: id_columns,
            }));
        }

        for field in &model.fields {
            let Some(attribute) = field.attribute("unique") else {
                continue;
            };
            let column_name = names.column(&field.name).to_string();
            if let Some(column) = table.columns.get_mut(&field.name) {
                column.unique = true;
            }
            let name = attribute_map(attribute)
                .unwrap_or_else(|| format!("{table_name}_{column_name}_key"));
            table.insert_constraint(Constraint::Unique(UniqueConstraint {
                name,
                column_names: vec![column_name],
            }));
        }

        for attribute in &model.attributes {
            match attribute.name.as_str() {
                "unique" => {
                    let columns = names.columns(&attribute_fields(attribute));
                    let name = explicit_name(attribute)
                        .unwrap_or_else(|| format!("{table_name}_{}_key", columns.join("_")));
                    table.insert_constraint(Constraint::Unique(UniqueConstraint {
                        name,
                        column_names: columns,
                    }));
                }
                "index" => {
                    let columns = names.columns(&attribute_fields(attribute));
                    let name = explicit_name(attribute)
                        .unwrap_or_else(|| format!("{table_name}_{}_idx", columns.join("_")));
                    let mut index = Index::new(name, columns, false);
                    if let Some(kind) = attribute.arg("type").and_then(Expr::as_text) {
                        index.index_type = kind.to_ascii_lowercase();
                    }
                    table.insert_index(index);
                }
                "id" | "map" => {}
                other => tracing::debug!(
                    event = "prisma_attribute_skipped",
                    table = %table_name,
                    attribute = %other
                ),
            }
        }

        for (field, relation) in relations {
            match self.relation(&table_name, names, model, field, relation) {
                Ok(Some(constraint)) => table.insert_constraint(constraint),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }

        self.errors.extend(errors);
        self.schema.insert_table(table);
    }

    fn column(&self, table_name: &str, field: &Field) -> Result<Column, ProcessError> {
        let mut data_type = self.column_type(field)?;
        let mut column = Column::new(field_column_name(field), "");
        column.not_null = !field.optional && !field.list;
        column.comment = field.doc.clone();

        if let Some(default) = field.attribute("default") {
            match default.positional(0).or_else(|| default.arg("value")) {
                Some(Expr::Call(function, _)) if function == "autoincrement" => {
                    data_type = match data_type.as_str() {
                        "bigint" => "bigserial".to_string(),
                        "smallint" => "smallserial".to_string(),
                        _ => "serial".to_string(),
                    };
                }
                Some(Expr::Call(function, args)) if function == "dbgenerated" => {
                    column.default = args
                        .first()
                        .and_then(|arg| arg.value.as_text())
                        .map(DefaultValue::text);
                }
                Some(Expr::Call(function, _)) if function == "now" => {
                    column.default = Some(DefaultValue::text("now()"));
                }
                // generated client side
                Some(Expr::Call(function, _)) => {
                    tracing::debug!(
                        event = "prisma_default_skipped",
                        table = %table_name,
                        column = %field.name,
                        function = %function
                    );
                }
                Some(Expr::Str(text)) | Some(Expr::Ident(text)) => {
                    column.default = Some(DefaultValue::text(text.as_str()));
                }
                Some(Expr::Bool(value)) => column.default = Some(DefaultValue::Boolean(*value)),
                Some(Expr::Num(num)) => column.default = number_default(num),
                Some(Expr::Array(_)) | None => {}
            }
        }

        if field.list {
            data_type.push_str("[]");
        }
        column.data_type = data_type;
        Ok(column)
    }

    fn column_type(&self, field: &Field) -> Result<String, ProcessError> {
        let native = field
            .attributes
            .iter()
            .find_map(|attribute| attribute.name.strip_prefix("db.").map(|name| (name, attribute)));
        if let Some((name, attribute)) = native {
            return Ok(native_type(name, attribute));
        }

        if let Some(enum_name) = self.enums.get(field.field_type.as_str()) {
            return Ok(enum_name.clone());
        }

        let data_type = match field.field_type.as_str() {
            "String" => "text",
            "Int" => "integer",
            "BigInt" => "bigint",
            "Float" => "double precision",
            "Decimal" => "decimal(65,30)",
            "Boolean" => "boolean",
            "DateTime" => "timestamp(3)",
            "Json" => "jsonb",
            "Bytes" => "bytea",
            other => {
                return Err(ProcessError::UnsupportedToken(format!(
                    "unknown Prisma field type {other} on {}",
                    field.name
                )));
            }
        };
        Ok(data_type.to_string())
    }

    fn relation(
        &self,
        table_name: &str,
        names: &ModelNames,
        model: &Model,
        field: &Field,
        relation: &Attribute,
    ) -> Result<Option<Constraint>, ProcessError> {
        let Some(fields) = relation.arg("fields").map(Expr::names) else {
            // back-relation side, the foreign key lives on the other model
            return Ok(None);
        };
        let references = relation.arg("references").map(Expr::names).unwrap_or_default();
        let target = self.models.get(field.field_type.as_str()).ok_or_else(|| {
            ProcessError::UnexpectedToken(format!("unknown relation target {}", field.field_type))
        })?;

        let column_names = names.columns(&fields);
        let name = attribute_map(relation)
            .unwrap_or_else(|| format!("{table_name}_{}_fkey", column_names.join("_")));

        let required = fields.iter().all(|field_name| {
            model
                .fields
                .iter()
                .any(|candidate| &candidate.name == field_name && !candidate.optional)
        });

        Ok(Some(Constraint::ForeignKey(ForeignKeyConstraint {
            name,
            column_names,
            target_table_name: target.table.clone(),
            target_column_names: target.columns(&references),
            update_constraint: referential_action(relation, "onUpdate")?
                .unwrap_or(ForeignKeyAction::Cascade),
            delete_constraint: referential_action(relation, "onDelete")?.unwrap_or(if required {
                ForeignKeyAction::Restrict
            } else {
                ForeignKeyAction::SetNull
            }),
        })))
    }
}

fn mapped_name(attributes: &[Attribute], fallback: &str) -> String {
    attributes
        .iter()
        .find(|attribute| attribute.name == "map")
        .and_then(|attribute| attribute.positional(0).or_else(|| attribute.arg("name")))
        .and_then(Expr::as_text)
        .unwrap_or(fallback)
        .to_string()
}

fn field_column_name(field: &Field) -> String {
    mapped_name(&field.attributes, &field.name)
}

fn attribute_map(attribute: &Attribute) -> Option<String> {
    attribute.arg("map").and_then(Expr::as_text).map(str::to_string)
}

/// `map:` or `name:` argument of a block attribute.
fn explicit_name(attribute: &Attribute) -> Option<String> {
    attribute_map(attribute)
        .or_else(|| attribute.arg("name").and_then(Expr::as_text).map(str::to_string))
}

fn attribute_fields(attribute: &Attribute) -> Vec<String> {
    attribute
        .arg("fields")
        .or_else(|| attribute.positional(0))
        .map(Expr::names)
        .unwrap_or_default()
}

fn referential_action(
    relation: &Attribute,
    key: &str,
) -> Result<Option<ForeignKeyAction>, ProcessError> {
    let Some(raw) = relation.arg(key).and_then(Expr::as_text) else {
        return Ok(None);
    };
    let action = match raw {
        "Cascade" => ForeignKeyAction::Cascade,
        "Restrict" => ForeignKeyAction::Restrict,
        "NoAction" => ForeignKeyAction::NoAction,
        "SetNull" => ForeignKeyAction::SetNull,
        "SetDefault" => ForeignKeyAction::SetDefault,
        other => {
            return Err(ProcessError::UnexpectedToken(format!(
                "unknown referential action {other}"
            )));
        }
    };
    Ok(Some(action))
}

/// `@db.VarChar(255)` -> `varchar(255)`.
fn native_type(name: &str, attribute: &Attribute) -> String {
    let base = match name {
        "DoublePrecision" => "double precision".to_string(),
        "Timestamptz" => "timestamptz".to_string(),
        "Timetz" => "timetz".to_string(),
        "JsonB" => "jsonb".to_string(),
        other => other.to_ascii_lowercase(),
    };
    let args = attribute
        .args
        .iter()
        .filter_map(|arg| match &arg.value {
            Expr::Num(num) => Some(num.clone()),
            Expr::Str(text) | Expr::Ident(text) => Some(text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();
    if args.is_empty() {
        base
    } else {
        format!("{base}({})", args.join(","))
    }
}

fn number_default(raw: &str) -> Option<DefaultValue> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(DefaultValue::integer(value));
    }
    raw.parse::<f64>().ok().and_then(DefaultValue::from_f64)
}
