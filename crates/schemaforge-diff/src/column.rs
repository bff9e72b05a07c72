use schemaforge_core::Column;
use schemaforge_operation::SchemaPath;

use crate::builder::{PatchIndex, Property, entity_item, property_items};
use crate::items::{DiffData, DiffItemKind, DiffTarget, SchemaDiffItem};

const COLUMN_PROPERTIES: &[Property<Column>] = &[
    Property {
        kind: DiffItemKind::ColumnName,
        field: "name",
        read: read_name,
    },
    Property {
        kind: DiffItemKind::ColumnType,
        field: "type",
        read: read_type,
    },
    Property {
        kind: DiffItemKind::ColumnDefault,
        field: "default",
        read: read_default,
    },
    Property {
        kind: DiffItemKind::ColumnCheck,
        field: "check",
        read: read_check,
    },
    Property {
        kind: DiffItemKind::ColumnPrimary,
        field: "primary",
        read: read_primary,
    },
    Property {
        kind: DiffItemKind::ColumnUnique,
        field: "unique",
        read: read_unique,
    },
    Property {
        kind: DiffItemKind::ColumnNotNull,
        field: "notNull",
        read: read_not_null,
    },
    Property {
        kind: DiffItemKind::ColumnComment,
        field: "comment",
        read: read_comment,
    },
];

fn read_name(column: &Column) -> Option<DiffData> {
    Some(DiffData::Text(column.name.clone()))
}

fn read_type(column: &Column) -> Option<DiffData> {
    Some(DiffData::Text(column.data_type.clone()))
}

fn read_default(column: &Column) -> Option<DiffData> {
    Some(DiffData::Default(column.default.clone()))
}

fn read_check(column: &Column) -> Option<DiffData> {
    Some(DiffData::OptionalText(column.check.clone()))
}

fn read_primary(column: &Column) -> Option<DiffData> {
    Some(DiffData::Flag(column.primary))
}

fn read_unique(column: &Column) -> Option<DiffData> {
    Some(DiffData::Flag(column.unique))
}

fn read_not_null(column: &Column) -> Option<DiffData> {
    Some(DiffData::Flag(column.not_null))
}

fn read_comment(column: &Column) -> Option<DiffData> {
    Some(DiffData::OptionalText(column.comment.clone()))
}

fn wrap(column: &Column) -> DiffData {
    DiffData::Column(column.clone())
}

pub(crate) fn build_column_diff_items(
    table_id: &str,
    column_id: &str,
    before: Option<&Column>,
    after: Option<&Column>,
    patch: &PatchIndex,
) -> Vec<SchemaDiffItem> {
    let target = DiffTarget::column(table_id, column_id);
    let path = SchemaPath::from_segments(["tables", table_id, "columns", column_id]);

    if let Some(item) = entity_item(
        DiffItemKind::Column,
        &target,
        &path,
        before,
        after,
        patch,
        wrap,
    ) {
        return vec![item];
    }

    match (before, after) {
        (Some(before), Some(after)) => {
            property_items(COLUMN_PROPERTIES, &target, &path, before, after, patch)
        }
        _ => Vec::new(),
    }
}
