use schemaforge_core::{Column, Constraint, DefaultValue, EnumType, ForeignKeyAction, Index, Table};
use serde::Serialize;

/// How a diffed entity or property changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Which entity, or which property of an entity, a diff item describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffItemKind {
    Table,
    TableName,
    TableComment,
    Column,
    ColumnName,
    ColumnType,
    ColumnDefault,
    ColumnCheck,
    ColumnPrimary,
    ColumnUnique,
    ColumnNotNull,
    ColumnComment,
    Index,
    IndexName,
    IndexUnique,
    IndexColumns,
    IndexType,
    Constraint,
    ConstraintType,
    ConstraintName,
    ConstraintColumnNames,
    ConstraintTargetTableName,
    ConstraintTargetColumnNames,
    ConstraintUpdateConstraint,
    ConstraintDeleteConstraint,
    ConstraintDetail,
    Enum,
    EnumName,
    EnumValues,
    EnumComment,
}

/// The new value of the changed entity or property, or the old one when it was removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiffData {
    Table(Box<Table>),
    Column(Column),
    Index(Index),
    Constraint(Constraint),
    Enum(EnumType),
    Text(String),
    OptionalText(Option<String>),
    Flag(bool),
    Default(Option<DefaultValue>),
    Names(Vec<String>),
    Action(ForeignKeyAction),
}

/// Identifiers of the entity a diff item belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_id: Option<String>,
}

impl DiffTarget {
    pub fn table(table_id: &str) -> Self {
        Self {
            table_id: Some(table_id.to_string()),
            ..Self::default()
        }
    }

    pub fn column(table_id: &str, column_id: &str) -> Self {
        Self {
            column_id: Some(column_id.to_string()),
            ..Self::table(table_id)
        }
    }

    pub fn index(table_id: &str, index_id: &str) -> Self {
        Self {
            index_id: Some(index_id.to_string()),
            ..Self::table(table_id)
        }
    }

    pub fn constraint(table_id: &str, constraint_id: &str) -> Self {
        Self {
            constraint_id: Some(constraint_id.to_string()),
            ..Self::table(table_id)
        }
    }

    pub fn enumeration(enum_id: &str) -> Self {
        Self {
            enum_id: Some(enum_id.to_string()),
            ..Self::default()
        }
    }
}

/// A classified unit of change between two schemas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDiffItem {
    pub kind: DiffItemKind,
    pub status: DiffStatus,
    #[serde(flatten)]
    pub target: DiffTarget,
    pub data: DiffData,
}

impl SchemaDiffItem {
    pub fn table_id(&self) -> Option<&str> {
        self.target.table_id.as_deref()
    }

    pub fn column_id(&self) -> Option<&str> {
        self.target.column_id.as_deref()
    }

    pub fn index_id(&self) -> Option<&str> {
        self.target.index_id.as_deref()
    }

    pub fn constraint_id(&self) -> Option<&str> {
        self.target.constraint_id.as_deref()
    }

    pub fn enum_id(&self) -> Option<&str> {
        self.target.enum_id.as_deref()
    }
}
