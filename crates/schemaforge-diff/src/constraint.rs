use schemaforge_core::Constraint;
use schemaforge_operation::SchemaPath;

use crate::builder::{PatchIndex, Property, entity_item, property_items};
use crate::items::{DiffData, DiffItemKind, DiffTarget, SchemaDiffItem};

/// Constraint properties across all variants. A property the variant lacks
/// reads as `None`, so switching kinds surfaces as added/removed fields.
const CONSTRAINT_PROPERTIES: &[Property<Constraint>] = &[
    Property {
        kind: DiffItemKind::ConstraintType,
        field: "type",
        read: read_type,
    },
    Property {
        kind: DiffItemKind::ConstraintName,
        field: "name",
        read: read_name,
    },
    Property {
        kind: DiffItemKind::ConstraintColumnNames,
        field: "columnNames",
        read: read_column_names,
    },
    Property {
        kind: DiffItemKind::ConstraintTargetTableName,
        field: "targetTableName",
        read: read_target_table,
    },
    Property {
        kind: DiffItemKind::ConstraintTargetColumnNames,
        field: "targetColumnNames",
        read: read_target_columns,
    },
    Property {
        kind: DiffItemKind::ConstraintUpdateConstraint,
        field: "updateConstraint",
        read: read_update_action,
    },
    Property {
        kind: DiffItemKind::ConstraintDeleteConstraint,
        field: "deleteConstraint",
        read: read_delete_action,
    },
    Property {
        kind: DiffItemKind::ConstraintDetail,
        field: "detail",
        read: read_detail,
    },
];

fn read_type(constraint: &Constraint) -> Option<DiffData> {
    Some(DiffData::Text(constraint.kind().to_string()))
}

fn read_name(constraint: &Constraint) -> Option<DiffData> {
    Some(DiffData::Text(constraint.name().to_string()))
}

fn read_column_names(constraint: &Constraint) -> Option<DiffData> {
    match constraint {
        Constraint::Check(_) => None,
        other => Some(DiffData::Names(other.column_names().to_vec())),
    }
}

fn read_target_table(constraint: &Constraint) -> Option<DiffData> {
    match constraint {
        Constraint::ForeignKey(fk) => Some(DiffData::Text(fk.target_table_name.clone())),
        _ => None,
    }
}

fn read_target_columns(constraint: &Constraint) -> Option<DiffData> {
    match constraint {
        Constraint::ForeignKey(fk) => Some(DiffData::Names(fk.target_column_names.clone())),
        _ => None,
    }
}

fn read_update_action(constraint: &Constraint) -> Option<DiffData> {
    match constraint {
        Constraint::ForeignKey(fk) => Some(DiffData::Action(fk.update_constraint)),
        _ => None,
    }
}

fn read_delete_action(constraint: &Constraint) -> Option<DiffData> {
    match constraint {
        Constraint::ForeignKey(fk) => Some(DiffData::Action(fk.delete_constraint)),
        _ => None,
    }
}

fn read_detail(constraint: &Constraint) -> Option<DiffData> {
    match constraint {
        Constraint::Check(check) => Some(DiffData::Text(check.detail.clone())),
        _ => None,
    }
}

fn wrap(constraint: &Constraint) -> DiffData {
    DiffData::Constraint(constraint.clone())
}

pub(crate) fn build_constraint_diff_items(
    table_id: &str,
    constraint_id: &str,
    before: Option<&Constraint>,
    after: Option<&Constraint>,
    patch: &PatchIndex,
) -> Vec<SchemaDiffItem> {
    let target = DiffTarget::constraint(table_id, constraint_id);
    let path = SchemaPath::from_segments(["tables", table_id, "constraints", constraint_id]);

    if let Some(item) = entity_item(
        DiffItemKind::Constraint,
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
            property_items(CONSTRAINT_PROPERTIES, &target, &path, before, after, patch)
        }
        _ => Vec::new(),
    }
}
