//! Canonical schema model for schemaforge.
//!
//! Every format parser produces a [`Schema`], the diff builder compares two of
//! them, and the deparsers render one back to text. This crate also carries
//! the invariant checks and the views derived from foreign keys.

pub mod constraints;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod json_schema;
pub mod relationships;
pub mod schema;
pub mod validation;

pub use constraints::{
    CheckConstraint, Constraint, ForeignKeyAction, ForeignKeyConstraint, PrimaryKeyConstraint,
    UniqueConstraint,
};
pub use error::{Error, Result};
pub use fingerprint::schema_fingerprint;
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report};
pub use json_schema::schema_json_schema;
pub use relationships::{Cardinality, Relationship, constraints_to_relationships};
pub use schema::{Column, DefaultValue, EnumType, Extension, Index, Schema, Table};
pub use validation::validate_schema;
