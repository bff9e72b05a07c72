use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::Constraint;

/// Canonical schema snapshot shared by every parser, diff and deparser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    /// Tables keyed by table name.
    #[serde(default)]
    pub tables: IndexMap<String, Table>,
    /// Enum types keyed by enum name.
    #[serde(default)]
    pub enums: IndexMap<String, EnumType>,
    /// Database extensions keyed by extension name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Extension>,
}

impl Schema {
    /// Look up a table by its map key.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Insert a table under its own name, replacing any previous entry.
    pub fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Insert an enum under its own name, replacing any previous entry.
    pub fn insert_enum(&mut self, enum_type: EnumType) {
        self.enums.insert(enum_type.name.clone(), enum_type);
    }
}

/// A table and everything addressed beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: IndexMap<String, Column>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub indexes: IndexMap<String, Index>,
    #[serde(default)]
    pub constraints: IndexMap<String, Constraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            comment: None,
            indexes: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Insert a column keyed by its own name.
    pub fn insert_column(&mut self, column: Column) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Insert an index keyed by its own name.
    pub fn insert_index(&mut self, index: Index) {
        self.indexes.insert(index.name.clone(), index);
    }

    /// Insert a constraint keyed by its own name.
    pub fn insert_constraint(&mut self, constraint: Constraint) {
        self.constraints
            .insert(constraint.name().to_string(), constraint);
    }

    /// Column names of the primary key, if one is declared.
    pub fn primary_key_columns(&self) -> Option<&[String]> {
        self.constraints.values().find_map(|constraint| match constraint {
            Constraint::PrimaryKey(pk) => Some(pk.column_names.as_slice()),
            _ => None,
        })
    }
}

/// Column metadata.
///
/// `data_type` is the raw, format-specific type string as written in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub check: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            default: None,
            check: None,
            primary: false,
            unique: false,
            not_null: false,
            comment: None,
        }
    }
}

/// A column default as written in the source.
///
/// Strings shaped like function calls (`now()`) or known bare keywords
/// (`CURRENT_TIMESTAMP`) are SQL expressions; everything else is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DefaultValue {
    Boolean(bool),
    Number(serde_json::Number),
    Text(String),
}

impl DefaultValue {
    pub fn text(value: impl Into<String>) -> Self {
        DefaultValue::Text(value.into())
    }

    /// Integer default; floats go through [`DefaultValue::from_f64`].
    pub fn integer(value: i64) -> Self {
        DefaultValue::Number(value.into())
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(DefaultValue::Number)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DefaultValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Boolean(value) => write!(f, "{value}"),
            DefaultValue::Number(value) => write!(f, "{value}"),
            DefaultValue::Text(value) => f.write_str(value),
        }
    }
}

/// Index definition. An empty `index_type` means the engine default (btree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(rename = "type", default)]
    pub index_type: String,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
            index_type: String::new(),
        }
    }
}

/// Enum type with ordered labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnumType {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            comment: None,
        }
    }
}

/// Database extension (e.g. `pgcrypto`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Extension {
    pub name: String,
}
