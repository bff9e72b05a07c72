use schemaforge_core::EnumType;
use schemaforge_operation::SchemaPath;

use crate::builder::{PatchIndex, Property, entity_item, property_items};
use crate::items::{DiffData, DiffItemKind, DiffTarget, SchemaDiffItem};

const ENUM_PROPERTIES: &[Property<EnumType>] = &[
    Property {
        kind: DiffItemKind::EnumName,
        field: "name",
        read: read_name,
    },
    Property {
        kind: DiffItemKind::EnumValues,
        field: "values",
        read: read_values,
    },
    Property {
        kind: DiffItemKind::EnumComment,
        field: "comment",
        read: read_comment,
    },
];

fn read_name(enum_type: &EnumType) -> Option<DiffData> {
    Some(DiffData::Text(enum_type.name.clone()))
}

fn read_values(enum_type: &EnumType) -> Option<DiffData> {
    Some(DiffData::Names(enum_type.values.clone()))
}

fn read_comment(enum_type: &EnumType) -> Option<DiffData> {
    Some(DiffData::OptionalText(enum_type.comment.clone()))
}

fn wrap(enum_type: &EnumType) -> DiffData {
    DiffData::Enum(enum_type.clone())
}

pub(crate) fn build_enum_diff_items(
    enum_id: &str,
    before: Option<&EnumType>,
    after: Option<&EnumType>,
    patch: &PatchIndex,
) -> Vec<SchemaDiffItem> {
    let target = DiffTarget::enumeration(enum_id);
    let path = SchemaPath::from_segments(["enums", enum_id]);

    if let Some(item) = entity_item(
        DiffItemKind::Enum,
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
            property_items(ENUM_PROPERTIES, &target, &path, before, after, patch)
        }
        _ => Vec::new(),
    }
}
