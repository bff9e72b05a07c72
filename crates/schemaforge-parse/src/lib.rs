//! Source format front ends for schemaforge.
//!
//! Each parser turns one kind of schema source (Rails `schema.rb`, PostgreSQL
//! DDL, Prisma, Drizzle, tbls JSON or the canonical JSON/YAML form) into a
//! [`ProcessResult`]: the schema it could build plus the problems it met on
//! the way. Parsers never stop at the first problem.

pub mod canonical;
pub mod drizzle;
pub mod error;
pub mod format;
pub mod postgres;
pub mod prisma;
pub mod result;
pub mod schemarb;
pub mod tbls;

pub use error::ProcessError;
pub use format::{SupportedFormat, detect_format, process};
pub use result::ProcessResult;
