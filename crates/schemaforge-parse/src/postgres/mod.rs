//! PostgreSQL DDL front end.

mod cursor;
pub mod lexer;
mod parser;

pub use parser::process;
