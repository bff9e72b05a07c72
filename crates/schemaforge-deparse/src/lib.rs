//! Renderers from the canonical schema back to text.
//!
//! [`postgres_schema_deparser`] emits a full DDL script,
//! [`postgres_operation_deparser`] turns one patch operation into the
//! equivalent statement and [`yaml_schema_deparser`] serializes the schema.
//! All of them return a [`DeparseResult`] instead of failing outright.

pub mod postgres;
pub mod result;
pub mod yaml;

pub use postgres::{
    postgres_operation_deparser, postgres_operations_deparser, postgres_schema_deparser,
};
pub use result::{DeparseError, DeparseResult};
pub use yaml::yaml_schema_deparser;
