use schemaforge_core::Index;
use schemaforge_operation::SchemaPath;

use crate::builder::{PatchIndex, Property, entity_item, property_items};
use crate::items::{DiffData, DiffItemKind, DiffTarget, SchemaDiffItem};

const INDEX_PROPERTIES: &[Property<Index>] = &[
    Property {
        kind: DiffItemKind::IndexName,
        field: "name",
        read: read_name,
    },
    Property {
        kind: DiffItemKind::IndexUnique,
        field: "unique",
        read: read_unique,
    },
    Property {
        kind: DiffItemKind::IndexColumns,
        field: "columns",
        read: read_columns,
    },
    Property {
        kind: DiffItemKind::IndexType,
        field: "type",
        read: read_type,
    },
];

fn read_name(index: &Index) -> Option<DiffData> {
    Some(DiffData::Text(index.name.clone()))
}

fn read_unique(index: &Index) -> Option<DiffData> {
    Some(DiffData::Flag(index.unique))
}

fn read_columns(index: &Index) -> Option<DiffData> {
    Some(DiffData::Names(index.columns.clone()))
}

fn read_type(index: &Index) -> Option<DiffData> {
    Some(DiffData::Text(index.index_type.clone()))
}

fn wrap(index: &Index) -> DiffData {
    DiffData::Index(index.clone())
}

pub(crate) fn build_index_diff_items(
    table_id: &str,
    index_id: &str,
    before: Option<&Index>,
    after: Option<&Index>,
    patch: &PatchIndex,
) -> Vec<SchemaDiffItem> {
    let target = DiffTarget::index(table_id, index_id);
    let path = SchemaPath::from_segments(["tables", table_id, "indexes", index_id]);

    if let Some(item) = entity_item(
        DiffItemKind::Index,
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
            property_items(INDEX_PROPERTIES, &target, &path, before, after, patch)
        }
        _ => Vec::new(),
    }
}
