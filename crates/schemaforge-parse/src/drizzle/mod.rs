//! Drizzle ORM (`drizzle-orm/pg-core`) schema module front end.

mod convert;
pub mod lexer;
pub mod parser;

use crate::result::ProcessResult;

/// Parse a TypeScript module declaring Drizzle tables and enums.
pub fn process(source: &str) -> ProcessResult {
    let tokens = lexer::Lexer::new(source).tokenize();
    let (bindings, mut errors) = parser::Parser::new(tokens).parse_module();

    let (schema, convert_errors) = convert::Converter::default().convert(&bindings);
    errors.extend(convert_errors);

    ProcessResult::new(schema, errors)
}
