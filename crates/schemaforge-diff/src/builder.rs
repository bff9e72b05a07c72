use indexmap::IndexMap;
use schemaforge_core::Schema;
use schemaforge_operation::{Operation, OperationKind, SchemaPath};
use serde_json::Value;

use crate::compare::compare;
use crate::items::{DiffData, DiffItemKind, DiffStatus, DiffTarget, SchemaDiffItem};
use crate::{column, constraint, enums, index, table};

/// Compare two schema snapshots and classify every change.
///
/// Items come out table by table (tables of `before` first, then tables only
/// present in `after`), each table followed by its columns, indexes and
/// constraints, and finally enums. Unchanged properties are omitted.
pub fn build_schema_diff(before: &Schema, after: &Schema) -> Vec<SchemaDiffItem> {
    let operations = compare(&to_plain(before), &to_plain(after));
    let patch = PatchIndex::new(&operations);
    let mut items = Vec::new();

    for table_id in union_keys(Some(&before.tables), Some(&after.tables)) {
        let old = before.tables.get(table_id);
        let new = after.tables.get(table_id);

        items.extend(table::build_table_diff_items(table_id, old, new, &patch));

        for column_id in union_keys(old.map(|t| &t.columns), new.map(|t| &t.columns)) {
            items.extend(column::build_column_diff_items(
                table_id,
                column_id,
                old.and_then(|t| t.columns.get(column_id)),
                new.and_then(|t| t.columns.get(column_id)),
                &patch,
            ));
        }

        for index_id in union_keys(old.map(|t| &t.indexes), new.map(|t| &t.indexes)) {
            items.extend(index::build_index_diff_items(
                table_id,
                index_id,
                old.and_then(|t| t.indexes.get(index_id)),
                new.and_then(|t| t.indexes.get(index_id)),
                &patch,
            ));
        }

        for constraint_id in union_keys(old.map(|t| &t.constraints), new.map(|t| &t.constraints)) {
            items.extend(constraint::build_constraint_diff_items(
                table_id,
                constraint_id,
                old.and_then(|t| t.constraints.get(constraint_id)),
                new.and_then(|t| t.constraints.get(constraint_id)),
                &patch,
            ));
        }
    }

    for enum_id in union_keys(Some(&before.enums), Some(&after.enums)) {
        items.extend(enums::build_enum_diff_items(
            enum_id,
            before.enums.get(enum_id),
            after.enums.get(enum_id),
            &patch,
        ));
    }

    tracing::debug!(
        event = "schema_diff_built",
        raw_operations = operations.len(),
        items = items.len()
    );

    items
}

fn to_plain(schema: &Schema) -> Value {
    serde_json::to_value(schema).unwrap_or_else(|err| {
        tracing::warn!(event = "schema_serialization_failed", error = %err);
        Value::Null
    })
}

fn union_keys<'a, V>(
    before: Option<&'a IndexMap<String, V>>,
    after: Option<&'a IndexMap<String, V>>,
) -> Vec<&'a str> {
    let mut keys: Vec<&str> = before
        .into_iter()
        .flat_map(|map| map.keys().map(String::as_str))
        .collect();
    if let Some(after) = after {
        for key in after.keys() {
            let present = before.is_some_and(|map| map.contains_key(key));
            if !present {
                keys.push(key.as_str());
            }
        }
    }
    keys
}

/// Raw patch operations with their paths parsed once.
pub(crate) struct PatchIndex {
    entries: Vec<(SchemaPath, OperationKind)>,
}

impl PatchIndex {
    pub(crate) fn new(operations: &[Operation]) -> Self {
        let entries = operations
            .iter()
            .filter_map(|op| SchemaPath::parse(&op.path).ok().map(|path| (path, op.op)))
            .collect();
        Self { entries }
    }

    /// Status from an operation addressing exactly `path`.
    pub(crate) fn exact_status(&self, path: &SchemaPath) -> Option<DiffStatus> {
        self.entries
            .iter()
            .find(|(op_path, _)| op_path == path)
            .map(|(_, kind)| match kind {
                OperationKind::Add => DiffStatus::Added,
                OperationKind::Remove => DiffStatus::Removed,
                OperationKind::Replace => DiffStatus::Modified,
            })
    }

    /// Like [`exact_status`](Self::exact_status), but a change anywhere
    /// beneath `path` (an element of a list property) counts as modified.
    pub(crate) fn property_status(&self, path: &SchemaPath) -> Option<DiffStatus> {
        self.exact_status(path).or_else(|| {
            self.entries
                .iter()
                .any(|(op_path, _)| op_path != path && op_path.starts_with(path))
                .then_some(DiffStatus::Modified)
        })
    }
}

/// One diffable property of an entity: its item kind, its serialized field
/// name and how to read it. `read` returns `None` when the entity variant has
/// no such field.
pub(crate) struct Property<E> {
    pub kind: DiffItemKind,
    pub field: &'static str,
    pub read: fn(&E) -> Option<DiffData>,
}

/// Whole-entity item driven by an operation on the entity path itself.
pub(crate) fn entity_item<E>(
    kind: DiffItemKind,
    target: &DiffTarget,
    path: &SchemaPath,
    before: Option<&E>,
    after: Option<&E>,
    patch: &PatchIndex,
    wrap: fn(&E) -> DiffData,
) -> Option<SchemaDiffItem> {
    let status = patch.exact_status(path)?;
    let data = match status {
        DiffStatus::Removed => before.map(wrap)?,
        _ => after.map(wrap)?,
    };
    Some(SchemaDiffItem {
        kind,
        status,
        target: target.clone(),
        data,
    })
}

/// Per-property items for an entity present in both snapshots.
pub(crate) fn property_items<E>(
    properties: &[Property<E>],
    target: &DiffTarget,
    base: &SchemaPath,
    before: &E,
    after: &E,
    patch: &PatchIndex,
) -> Vec<SchemaDiffItem> {
    properties
        .iter()
        .filter_map(|property| {
            let status = patch.property_status(&base.child(property.field))?;
            let old = (property.read)(before);
            let new = (property.read)(after);
            if old == new {
                return None;
            }
            let data = match status {
                DiffStatus::Removed => old?,
                _ => new.or(old)?,
            };
            Some(SchemaDiffItem {
                kind: property.kind,
                status,
                target: target.clone(),
                data,
            })
        })
        .collect()
}
