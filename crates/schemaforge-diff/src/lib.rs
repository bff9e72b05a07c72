//! Schema snapshot diffing.
//!
//! [`compare`] produces the raw JSON-Patch between two plain JSON trees;
//! [`build_schema_diff`] classifies that patch into [`SchemaDiffItem`]s, one
//! per changed entity or property. [`get_change_status`] folds items into a
//! single status, letting a table added or removed as a whole take precedence.

mod builder;
mod column;
pub mod compare;
mod constraint;
mod enums;
mod index;
pub mod items;
pub mod status;
mod table;

pub use builder::build_schema_diff;
pub use compare::compare;
pub use items::{DiffData, DiffItemKind, DiffStatus, DiffTarget, SchemaDiffItem};
pub use status::{ChangeQuery, get_change_status};
