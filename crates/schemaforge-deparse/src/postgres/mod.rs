//! PostgreSQL DDL target.

mod operation;
mod schema;
pub mod utils;

pub use operation::{postgres_operation_deparser, postgres_operations_deparser};
pub use schema::postgres_schema_deparser;
