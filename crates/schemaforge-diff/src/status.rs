use crate::items::{DiffItemKind, DiffStatus, SchemaDiffItem};

/// Selects the diff items a consumer wants a single status for: one table or
/// enum, optionally narrowed to a child entity and a set of item kinds.
#[derive(Debug, Clone, Default)]
pub struct ChangeQuery {
    table_id: Option<String>,
    enum_id: Option<String>,
    column_id: Option<String>,
    index_id: Option<String>,
    constraint_id: Option<String>,
    kinds: Vec<DiffItemKind>,
}

impl ChangeQuery {
    pub fn table(table_id: impl Into<String>) -> Self {
        Self {
            table_id: Some(table_id.into()),
            ..Self::default()
        }
    }

    pub fn enumeration(enum_id: impl Into<String>) -> Self {
        Self {
            enum_id: Some(enum_id.into()),
            ..Self::default()
        }
    }

    pub fn column(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = Some(column_id.into());
        self
    }

    pub fn index(mut self, index_id: impl Into<String>) -> Self {
        self.index_id = Some(index_id.into());
        self
    }

    pub fn constraint(mut self, constraint_id: impl Into<String>) -> Self {
        self.constraint_id = Some(constraint_id.into());
        self
    }

    /// Restrict to these kinds. An empty list matches every kind.
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = DiffItemKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    fn is_scope_item(&self, item: &SchemaDiffItem) -> bool {
        match (&self.table_id, &self.enum_id) {
            (Some(table_id), _) => {
                item.kind == DiffItemKind::Table && item.table_id() == Some(table_id.as_str())
            }
            (None, Some(enum_id)) => {
                item.kind == DiffItemKind::Enum && item.enum_id() == Some(enum_id.as_str())
            }
            (None, None) => false,
        }
    }

    fn matches(&self, item: &SchemaDiffItem) -> bool {
        fn same(wanted: &Option<String>, actual: Option<&str>) -> bool {
            wanted.as_deref().is_none_or(|wanted| actual == Some(wanted))
        }

        (self.kinds.is_empty() || self.kinds.contains(&item.kind))
            && same(&self.table_id, item.table_id())
            && same(&self.enum_id, item.enum_id())
            && same(&self.column_id, item.column_id())
            && same(&self.index_id, item.index_id())
            && same(&self.constraint_id, item.constraint_id())
    }
}

/// Resolve one status for the items selected by `query`.
///
/// A table (or enum) that was added or removed as a whole decides the answer
/// for everything beneath it. Otherwise the first matching item wins, and no
/// match means unchanged.
pub fn get_change_status(items: &[SchemaDiffItem], query: &ChangeQuery) -> DiffStatus {
    let whole = items.iter().find(|item| {
        query.is_scope_item(item)
            && matches!(item.status, DiffStatus::Added | DiffStatus::Removed)
    });
    if let Some(item) = whole {
        return item.status;
    }

    items
        .iter()
        .find(|item| query.matches(item))
        .map(|item| item.status)
        .unwrap_or(DiffStatus::Unchanged)
}
