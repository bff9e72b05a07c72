//! Slash-delimited schema paths.
//!
//! Every addressable location in a [`Schema`](schemaforge_core::Schema) is
//! described once, in [`GRAMMAR`]. Operation validation, the diff builder and
//! the operation deparser all resolve paths through this table.

use crate::errors::OperationError;

/// The closed set of addressable schema locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
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
    Enum,
    EnumName,
    EnumValues,
    EnumComment,
    Extension,
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Literal(&'static str),
    Name,
}

use Segment::{Literal as L, Name as N};

const TABLE: &[Segment] = &[L("tables"), N];
const COLUMN: &[Segment] = &[L("tables"), N, L("columns"), N];
const INDEX: &[Segment] = &[L("tables"), N, L("indexes"), N];
const CONSTRAINT: &[Segment] = &[L("tables"), N, L("constraints"), N];
const ENUM: &[Segment] = &[L("enums"), N];

/// Anchored grammar: a path matches a row only when every segment matches
/// and the segment counts are equal.
const GRAMMAR: &[(PathKind, &[Segment])] = &[
    (PathKind::Table, TABLE),
    (PathKind::TableName, &[L("tables"), N, L("name")]),
    (PathKind::TableComment, &[L("tables"), N, L("comment")]),
    (PathKind::Column, COLUMN),
    (PathKind::ColumnName, &[L("tables"), N, L("columns"), N, L("name")]),
    (PathKind::ColumnType, &[L("tables"), N, L("columns"), N, L("type")]),
    (PathKind::ColumnDefault, &[L("tables"), N, L("columns"), N, L("default")]),
    (PathKind::ColumnCheck, &[L("tables"), N, L("columns"), N, L("check")]),
    (PathKind::ColumnPrimary, &[L("tables"), N, L("columns"), N, L("primary")]),
    (PathKind::ColumnUnique, &[L("tables"), N, L("columns"), N, L("unique")]),
    (PathKind::ColumnNotNull, &[L("tables"), N, L("columns"), N, L("notNull")]),
    (PathKind::ColumnComment, &[L("tables"), N, L("columns"), N, L("comment")]),
    (PathKind::Index, INDEX),
    (PathKind::IndexName, &[L("tables"), N, L("indexes"), N, L("name")]),
    (PathKind::IndexUnique, &[L("tables"), N, L("indexes"), N, L("unique")]),
    (PathKind::IndexColumns, &[L("tables"), N, L("indexes"), N, L("columns")]),
    (PathKind::IndexType, &[L("tables"), N, L("indexes"), N, L("type")]),
    (PathKind::Constraint, CONSTRAINT),
    (PathKind::Enum, ENUM),
    (PathKind::EnumName, &[L("enums"), N, L("name")]),
    (PathKind::EnumValues, &[L("enums"), N, L("values")]),
    (PathKind::EnumComment, &[L("enums"), N, L("comment")]),
    (PathKind::Extension, &[L("extensions"), N]),
];

/// A path split into unescaped JSON-pointer segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPath {
    segments: Vec<String>,
}

impl SchemaPath {
    /// Parse a JSON pointer (`/tables/users/columns/id`). The empty string is
    /// the document root.
    pub fn parse(path: &str) -> Result<Self, OperationError> {
        if path.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }
        let Some(rest) = path.strip_prefix('/') else {
            return Err(OperationError::InvalidPath(path.to_string()));
        };
        let segments = rest.split('/').map(unescape_segment).collect();
        Ok(Self { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of the containing node; `None` for the root.
    pub fn parent(&self) -> Option<SchemaPath> {
        let (_, head) = self.segments.split_last()?;
        Some(SchemaPath {
            segments: head.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a segment, returning the extended path.
    pub fn child(&self, segment: impl Into<String>) -> SchemaPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        SchemaPath { segments }
    }

    /// True when `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &SchemaPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Match against the grammar table.
    pub fn matched(&self) -> Option<MatchedPath> {
        GRAMMAR.iter().find_map(|(kind, pattern)| {
            if pattern.len() != self.segments.len() {
                return None;
            }
            let mut names = Vec::new();
            for (segment, actual) in pattern.iter().zip(&self.segments) {
                match segment {
                    Segment::Literal(literal) if *literal == actual.as_str() => {}
                    Segment::Literal(_) => return None,
                    Segment::Name if actual.is_empty() => return None,
                    Segment::Name => names.push(actual.clone()),
                }
            }
            Some(MatchedPath { kind: *kind, names })
        })
    }

    /// Render back to a JSON pointer with `~` and `/` escaped.
    pub fn to_pointer(&self) -> String {
        self.segments
            .iter()
            .map(|segment| format!("/{}", escape_segment(segment)))
            .collect()
    }
}

impl std::fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

/// A path that matched a grammar row, with its name segments extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPath {
    pub kind: PathKind,
    names: Vec<String>,
}

impl MatchedPath {
    /// Table name for paths rooted at `/tables/{table}`.
    pub fn table(&self) -> Option<&str> {
        self.is_table_rooted().then(|| self.names[0].as_str())
    }

    /// Column, index or constraint name for nested table paths.
    pub fn child(&self) -> Option<&str> {
        if self.is_table_rooted() {
            self.names.get(1).map(String::as_str)
        } else {
            None
        }
    }

    /// Enum or extension name for paths rooted at `/enums` or `/extensions`.
    pub fn root_name(&self) -> Option<&str> {
        if self.is_table_rooted() {
            None
        } else {
            self.names.first().map(String::as_str)
        }
    }

    fn is_table_rooted(&self) -> bool {
        !matches!(
            self.kind,
            PathKind::Enum
                | PathKind::EnumName
                | PathKind::EnumValues
                | PathKind::EnumComment
                | PathKind::Extension
        )
    }
}

/// Match a raw path string against the grammar.
pub fn match_path(path: &str) -> Option<MatchedPath> {
    SchemaPath::parse(path).ok()?.matched()
}

/// Coarse scope of a path, used to decide which kind of entity a change touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathScope {
    Table,
    Column,
    Index,
    Constraint,
    Enum,
    Extension,
    Other,
}

/// Classify any path by the entity it lives under, including paths deeper
/// than the grammar addresses (`/tables/t/indexes/i/columns/0`).
pub fn classify_path(path: &str) -> PathScope {
    let Ok(parsed) = SchemaPath::parse(path) else {
        return PathScope::Other;
    };
    let segments: Vec<&str> = parsed.segments().iter().map(String::as_str).collect();

    match segments.as_slice() {
        ["tables", _, "columns", _, ..] => PathScope::Column,
        ["tables", _, "indexes", _, ..] => PathScope::Index,
        ["tables", _, "constraints", _, ..] => PathScope::Constraint,
        ["tables", _, ..] => PathScope::Table,
        ["enums", _, ..] => PathScope::Enum,
        ["extensions", _, ..] => PathScope::Extension,
        _ => PathScope::Other,
    }
}

/// Build a pointer from raw segments, escaping each one.
pub fn pointer<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| format!("/{}", escape_segment(segment.as_ref())))
        .collect()
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
