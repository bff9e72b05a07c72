use schemaforge_core::Table;
use schemaforge_operation::SchemaPath;

use crate::builder::{PatchIndex, Property, entity_item, property_items};
use crate::items::{DiffData, DiffItemKind, DiffTarget, SchemaDiffItem};

const TABLE_PROPERTIES: &[Property<Table>] = &[
    Property {
        kind: DiffItemKind::TableName,
        field: "name",
        read: read_name,
    },
    Property {
        kind: DiffItemKind::TableComment,
        field: "comment",
        read: read_comment,
    },
];

fn read_name(table: &Table) -> Option<DiffData> {
    Some(DiffData::Text(table.name.clone()))
}

fn read_comment(table: &Table) -> Option<DiffData> {
    Some(DiffData::OptionalText(table.comment.clone()))
}

fn wrap(table: &Table) -> DiffData {
    DiffData::Table(Box::new(table.clone()))
}

/// Table-level items: the table itself when added or removed, otherwise its
/// name and comment changes.
pub(crate) fn build_table_diff_items(
    table_id: &str,
    before: Option<&Table>,
    after: Option<&Table>,
    patch: &PatchIndex,
) -> Vec<SchemaDiffItem> {
    let target = DiffTarget::table(table_id);
    let path = SchemaPath::from_segments(["tables", table_id]);

    if let Some(item) = entity_item(
        DiffItemKind::Table,
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
            property_items(TABLE_PROPERTIES, &target, &path, before, after, patch)
        }
        _ => Vec::new(),
    }
}
