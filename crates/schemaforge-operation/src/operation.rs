use schemaforge_core::{Column, Constraint, DefaultValue, EnumType, Extension, Index, Table};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::OperationError;
use crate::path::{PathKind, SchemaPath};

/// JSON-Patch verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Remove,
    Replace,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Remove => "remove",
            OperationKind::Replace => "replace",
        }
    }
}

/// Raw, path-addressed patch operation as exchanged with consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Operation {
    pub op: OperationKind,
    pub path: String,
    /// Present for `add`/`replace`; an explicit `null` is kept as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Operation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: OperationKind::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: OperationKind::Remove,
            path: path.into(),
            value: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: OperationKind::Replace,
            path: path.into(),
            value: Some(value),
        }
    }
}

/// Typed schema mutation. Every variant corresponds to one grammar row and
/// the verbs allowed on it.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOperation {
    AddTable { table_name: String, table: Table },
    RemoveTable { table_name: String },
    ReplaceTable { table_name: String, table: Table },
    ReplaceTableName { table_name: String, name: String },
    ReplaceTableComment {
        table_name: String,
        comment: Option<String>,
    },

    AddColumn {
        table_name: String,
        column_name: String,
        column: Column,
    },
    RemoveColumn {
        table_name: String,
        column_name: String,
    },
    ReplaceColumn {
        table_name: String,
        column_name: String,
        column: Column,
    },
    ReplaceColumnName {
        table_name: String,
        column_name: String,
        name: String,
    },
    ReplaceColumnType {
        table_name: String,
        column_name: String,
        data_type: String,
    },
    ReplaceColumnDefault {
        table_name: String,
        column_name: String,
        default: Option<DefaultValue>,
    },
    ReplaceColumnCheck {
        table_name: String,
        column_name: String,
        check: Option<String>,
    },
    ReplaceColumnPrimary {
        table_name: String,
        column_name: String,
        primary: bool,
    },
    ReplaceColumnUnique {
        table_name: String,
        column_name: String,
        unique: bool,
    },
    ReplaceColumnNotNull {
        table_name: String,
        column_name: String,
        not_null: bool,
    },
    ReplaceColumnComment {
        table_name: String,
        column_name: String,
        comment: Option<String>,
    },

    AddIndex {
        table_name: String,
        index_name: String,
        index: Index,
    },
    RemoveIndex {
        table_name: String,
        index_name: String,
    },
    ReplaceIndex {
        table_name: String,
        index_name: String,
        index: Index,
    },
    ReplaceIndexName {
        table_name: String,
        index_name: String,
        name: String,
    },
    ReplaceIndexUnique {
        table_name: String,
        index_name: String,
        unique: bool,
    },
    ReplaceIndexColumns {
        table_name: String,
        index_name: String,
        columns: Vec<String>,
    },
    ReplaceIndexType {
        table_name: String,
        index_name: String,
        index_type: String,
    },

    AddConstraint {
        table_name: String,
        constraint_name: String,
        constraint: Constraint,
    },
    RemoveConstraint {
        table_name: String,
        constraint_name: String,
    },
    ReplaceConstraint {
        table_name: String,
        constraint_name: String,
        constraint: Constraint,
    },

    AddEnum {
        enum_name: String,
        enum_type: EnumType,
    },
    RemoveEnum { enum_name: String },
    ReplaceEnum {
        enum_name: String,
        enum_type: EnumType,
    },
    ReplaceEnumName { enum_name: String, name: String },
    ReplaceEnumValues {
        enum_name: String,
        values: Vec<String>,
    },
    ReplaceEnumComment {
        enum_name: String,
        comment: Option<String>,
    },

    AddExtension {
        extension_name: String,
        extension: Extension,
    },
    RemoveExtension { extension_name: String },
}

impl SchemaOperation {
    /// Table the operation addresses, when it is table-rooted.
    pub fn table_name(&self) -> Option<&str> {
        use SchemaOperation::*;
        match self {
            AddTable { table_name, .. }
            | RemoveTable { table_name }
            | ReplaceTable { table_name, .. }
            | ReplaceTableName { table_name, .. }
            | ReplaceTableComment { table_name, .. }
            | AddColumn { table_name, .. }
            | RemoveColumn { table_name, .. }
            | ReplaceColumn { table_name, .. }
            | ReplaceColumnName { table_name, .. }
            | ReplaceColumnType { table_name, .. }
            | ReplaceColumnDefault { table_name, .. }
            | ReplaceColumnCheck { table_name, .. }
            | ReplaceColumnPrimary { table_name, .. }
            | ReplaceColumnUnique { table_name, .. }
            | ReplaceColumnNotNull { table_name, .. }
            | ReplaceColumnComment { table_name, .. }
            | AddIndex { table_name, .. }
            | RemoveIndex { table_name, .. }
            | ReplaceIndex { table_name, .. }
            | ReplaceIndexName { table_name, .. }
            | ReplaceIndexUnique { table_name, .. }
            | ReplaceIndexColumns { table_name, .. }
            | ReplaceIndexType { table_name, .. }
            | AddConstraint { table_name, .. }
            | RemoveConstraint { table_name, .. }
            | ReplaceConstraint { table_name, .. } => Some(table_name.as_str()),
            AddEnum { .. }
            | RemoveEnum { .. }
            | ReplaceEnum { .. }
            | ReplaceEnumName { .. }
            | ReplaceEnumValues { .. }
            | ReplaceEnumComment { .. }
            | AddExtension { .. }
            | RemoveExtension { .. } => None,
        }
    }
}

impl TryFrom<&Operation> for SchemaOperation {
    type Error = OperationError;

    fn try_from(operation: &Operation) -> Result<Self, Self::Error> {
        let path = SchemaPath::parse(&operation.path)?;
        let matched = path
            .matched()
            .ok_or_else(|| OperationError::UnmatchedPath(operation.path.clone()))?;

        let raw = Raw { operation };
        let table = || matched.table().unwrap_or_default().to_string();
        let child = || matched.child().unwrap_or_default().to_string();
        let root = || matched.root_name().unwrap_or_default().to_string();

        use OperationKind::{Add, Remove, Replace};
        use SchemaOperation::*;

        let typed = match (matched.kind, operation.op) {
            (PathKind::Table, Add) => AddTable {
                table_name: table(),
                table: raw.named(&table(), |t: &Table| t.name.as_str())?,
            },
            (PathKind::Table, Remove) => RemoveTable { table_name: table() },
            (PathKind::Table, Replace) => ReplaceTable {
                table_name: table(),
                table: raw.named(&table(), |t: &Table| t.name.as_str())?,
            },
            (PathKind::TableName, Add | Replace) => ReplaceTableName {
                table_name: table(),
                name: raw.decode()?,
            },
            (PathKind::TableComment, Add | Replace) => ReplaceTableComment {
                table_name: table(),
                comment: raw.decode()?,
            },

            // Column keys may be ORM property names, so the SQL name is free.
            (PathKind::Column, Add) => AddColumn {
                table_name: table(),
                column_name: child(),
                column: raw.decode()?,
            },
            (PathKind::Column, Remove) => RemoveColumn {
                table_name: table(),
                column_name: child(),
            },
            (PathKind::Column, Replace) => ReplaceColumn {
                table_name: table(),
                column_name: child(),
                column: raw.decode()?,
            },
            (PathKind::ColumnName, Add | Replace) => ReplaceColumnName {
                table_name: table(),
                column_name: child(),
                name: raw.decode()?,
            },
            (PathKind::ColumnType, Add | Replace) => ReplaceColumnType {
                table_name: table(),
                column_name: child(),
                data_type: raw.decode()?,
            },
            (PathKind::ColumnDefault, Add | Replace) => ReplaceColumnDefault {
                table_name: table(),
                column_name: child(),
                default: raw.decode()?,
            },
            (PathKind::ColumnCheck, Add | Replace) => ReplaceColumnCheck {
                table_name: table(),
                column_name: child(),
                check: raw.decode()?,
            },
            (PathKind::ColumnPrimary, Add | Replace) => ReplaceColumnPrimary {
                table_name: table(),
                column_name: child(),
                primary: raw.decode()?,
            },
            (PathKind::ColumnUnique, Add | Replace) => ReplaceColumnUnique {
                table_name: table(),
                column_name: child(),
                unique: raw.decode()?,
            },
            (PathKind::ColumnNotNull, Add | Replace) => ReplaceColumnNotNull {
                table_name: table(),
                column_name: child(),
                not_null: raw.decode()?,
            },
            (PathKind::ColumnComment, Add | Replace) => ReplaceColumnComment {
                table_name: table(),
                column_name: child(),
                comment: raw.decode()?,
            },

            (PathKind::Index, Add) => AddIndex {
                table_name: table(),
                index_name: child(),
                index: raw.named(&child(), |i: &Index| i.name.as_str())?,
            },
            (PathKind::Index, Remove) => RemoveIndex {
                table_name: table(),
                index_name: child(),
            },
            (PathKind::Index, Replace) => ReplaceIndex {
                table_name: table(),
                index_name: child(),
                index: raw.named(&child(), |i: &Index| i.name.as_str())?,
            },
            (PathKind::IndexName, Add | Replace) => ReplaceIndexName {
                table_name: table(),
                index_name: child(),
                name: raw.decode()?,
            },
            (PathKind::IndexUnique, Add | Replace) => ReplaceIndexUnique {
                table_name: table(),
                index_name: child(),
                unique: raw.decode()?,
            },
            (PathKind::IndexColumns, Add | Replace) => ReplaceIndexColumns {
                table_name: table(),
                index_name: child(),
                columns: raw.decode()?,
            },
            (PathKind::IndexType, Add | Replace) => ReplaceIndexType {
                table_name: table(),
                index_name: child(),
                index_type: raw.decode()?,
            },

            (PathKind::Constraint, Add) => AddConstraint {
                table_name: table(),
                constraint_name: child(),
                constraint: raw.named(&child(), |c: &Constraint| c.name())?,
            },
            (PathKind::Constraint, Remove) => RemoveConstraint {
                table_name: table(),
                constraint_name: child(),
            },
            (PathKind::Constraint, Replace) => ReplaceConstraint {
                table_name: table(),
                constraint_name: child(),
                constraint: raw.named(&child(), |c: &Constraint| c.name())?,
            },

            (PathKind::Enum, Add) => AddEnum {
                enum_name: root(),
                enum_type: raw.named(&root(), |e: &EnumType| e.name.as_str())?,
            },
            (PathKind::Enum, Remove) => RemoveEnum { enum_name: root() },
            (PathKind::Enum, Replace) => ReplaceEnum {
                enum_name: root(),
                enum_type: raw.named(&root(), |e: &EnumType| e.name.as_str())?,
            },
            (PathKind::EnumName, Add | Replace) => ReplaceEnumName {
                enum_name: root(),
                name: raw.decode()?,
            },
            (PathKind::EnumValues, Add | Replace) => ReplaceEnumValues {
                enum_name: root(),
                values: raw.decode()?,
            },
            (PathKind::EnumComment, Add | Replace) => ReplaceEnumComment {
                enum_name: root(),
                comment: raw.decode()?,
            },

            (PathKind::Extension, Add) => AddExtension {
                extension_name: root(),
                extension: raw.named(&root(), |e: &Extension| e.name.as_str())?,
            },
            (PathKind::Extension, Remove) => RemoveExtension {
                extension_name: root(),
            },

            (_, op) => {
                return Err(OperationError::UnsupportedOp {
                    op: op.as_str().to_string(),
                    path: operation.path.clone(),
                });
            }
        };

        Ok(typed)
    }
}

struct Raw<'a> {
    operation: &'a Operation,
}

impl Raw<'_> {
    fn value(&self) -> Result<&Value, OperationError> {
        self.operation
            .value
            .as_ref()
            .ok_or_else(|| OperationError::MissingValue(self.operation.path.clone()))
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, OperationError> {
        serde_json::from_value(self.value()?.clone()).map_err(|err| OperationError::InvalidValue {
            path: self.operation.path.clone(),
            message: err.to_string(),
        })
    }

    /// Decode an entity and check that its own name equals the map key in the path.
    fn named<T, F>(&self, expected: &str, name_of: F) -> Result<T, OperationError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> &str,
    {
        let entity: T = self.decode()?;
        let found = name_of(&entity);
        if found != expected {
            return Err(OperationError::NameMismatch {
                path: self.operation.path.clone(),
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(entity)
    }
}

macro_rules! operation_guards {
    ($($guard:ident => $variant:ident),* $(,)?) => {
        $(
            #[doc = concat!("True when the operation validates as `SchemaOperation::", stringify!($variant), "`.")]
            pub fn $guard(operation: &Operation) -> bool {
                matches!(
                    SchemaOperation::try_from(operation),
                    Ok(SchemaOperation::$variant { .. })
                )
            }
        )*
    };
}

operation_guards! {
    is_add_table_operation => AddTable,
    is_remove_table_operation => RemoveTable,
    is_replace_table_operation => ReplaceTable,
    is_replace_table_name_operation => ReplaceTableName,
    is_replace_table_comment_operation => ReplaceTableComment,
    is_add_column_operation => AddColumn,
    is_remove_column_operation => RemoveColumn,
    is_replace_column_operation => ReplaceColumn,
    is_replace_column_name_operation => ReplaceColumnName,
    is_replace_column_type_operation => ReplaceColumnType,
    is_replace_column_default_operation => ReplaceColumnDefault,
    is_replace_column_check_operation => ReplaceColumnCheck,
    is_replace_column_primary_operation => ReplaceColumnPrimary,
    is_replace_column_unique_operation => ReplaceColumnUnique,
    is_replace_column_not_null_operation => ReplaceColumnNotNull,
    is_replace_column_comment_operation => ReplaceColumnComment,
    is_add_index_operation => AddIndex,
    is_remove_index_operation => RemoveIndex,
    is_replace_index_operation => ReplaceIndex,
    is_replace_index_name_operation => ReplaceIndexName,
    is_replace_index_unique_operation => ReplaceIndexUnique,
    is_replace_index_columns_operation => ReplaceIndexColumns,
    is_replace_index_type_operation => ReplaceIndexType,
    is_add_constraint_operation => AddConstraint,
    is_remove_constraint_operation => RemoveConstraint,
    is_replace_constraint_operation => ReplaceConstraint,
    is_add_enum_operation => AddEnum,
    is_remove_enum_operation => RemoveEnum,
    is_replace_enum_operation => ReplaceEnum,
    is_replace_enum_name_operation => ReplaceEnumName,
    is_replace_enum_values_operation => ReplaceEnumValues,
    is_replace_enum_comment_operation => ReplaceEnumComment,
    is_add_extension_operation => AddExtension,
    is_remove_extension_operation => RemoveExtension,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column_json(name: &str) -> Value {
        json!({ "name": name, "type": "text", "notNull": false })
    }

    #[test]
    fn add_column_validates_and_extracts_names() {
        let op = Operation::add("/tables/users/columns/email", column_json("email"));
        match SchemaOperation::try_from(&op).unwrap() {
            SchemaOperation::AddColumn {
                table_name,
                column_name,
                column,
            } => {
                assert_eq!(table_name, "users");
                assert_eq!(column_name, "email");
                assert_eq!(column.data_type, "text");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(is_add_column_operation(&op));
        assert!(!is_add_table_operation(&op));
    }

    #[test]
    fn rejects_wrong_value_type() {
        let op = Operation::replace("/tables/users/columns/id/notNull", json!("yes"));
        assert!(matches!(
            SchemaOperation::try_from(&op),
            Err(OperationError::InvalidValue { .. })
        ));
        assert!(!is_replace_column_not_null_operation(&op));
    }

    #[test]
    fn rejects_wrong_verb_for_property() {
        let op = Operation::remove("/tables/users/name");
        assert!(matches!(
            SchemaOperation::try_from(&op),
            Err(OperationError::UnsupportedOp { .. })
        ));
    }

    #[test]
    fn rejects_unmatched_path() {
        let op = Operation::add("/tables/users/triggers/t1", json!({}));
        assert_eq!(
            SchemaOperation::try_from(&op),
            Err(OperationError::UnmatchedPath("/tables/users/triggers/t1".to_string()))
        );
    }

    #[test]
    fn rejects_entity_named_differently_from_path() {
        let op = Operation::add(
            "/tables/users/indexes/users_email_idx",
            json!({ "name": "users_mail_idx", "columns": ["email"], "unique": false }),
        );
        assert!(matches!(
            SchemaOperation::try_from(&op),
            Err(OperationError::NameMismatch { .. })
        ));
    }

    #[test]
    fn columns_keyed_by_property_name_keep_their_sql_name() {
        let op = Operation::add("/tables/users/columns/createdAt", column_json("created_at"));
        match SchemaOperation::try_from(&op) {
            Ok(SchemaOperation::AddColumn {
                column_name,
                column,
                ..
            }) => {
                assert_eq!(column_name, "createdAt");
                assert_eq!(column.name, "created_at");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(is_add_column_operation(&op));
    }

    #[test]
    fn table_comment_guard_ignores_column_comment() {
        let table = Operation::replace("/tables/users/comment", json!("people"));
        let column = Operation::replace("/tables/users/columns/id/comment", json!("pk"));
        assert!(is_replace_table_comment_operation(&table));
        assert!(!is_replace_table_comment_operation(&column));
        assert!(is_replace_column_comment_operation(&column));
    }

    #[test]
    fn explicit_null_value_is_kept() {
        let op: Operation = serde_json::from_value(json!({
            "op": "replace",
            "path": "/tables/users/comment",
            "value": null
        }))
        .unwrap();
        assert_eq!(op.value, Some(Value::Null));
        assert_eq!(
            SchemaOperation::try_from(&op).unwrap(),
            SchemaOperation::ReplaceTableComment {
                table_name: "users".to_string(),
                comment: None
            }
        );
    }

    #[test]
    fn missing_value_is_reported() {
        let op: Operation =
            serde_json::from_value(json!({ "op": "add", "path": "/enums/status" })).unwrap();
        assert_eq!(
            SchemaOperation::try_from(&op),
            Err(OperationError::MissingValue("/enums/status".to_string()))
        );
    }
}
