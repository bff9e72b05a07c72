//! Prisma schema front end.

mod convert;
pub mod lexer;
pub mod parser;

use crate::result::ProcessResult;

/// Parse a `schema.prisma` file. Relation fields produce foreign keys, not columns.
pub fn process(source: &str) -> ProcessResult {
    let tokens = lexer::Lexer::new(source).tokenize();
    let (document, mut errors) = parser::Parser::new(tokens).parse_document();

    let (schema, convert_errors) = convert::Converter::new(&document).convert();
    errors.extend(convert_errors);

    ProcessResult::new(schema, errors)
}
