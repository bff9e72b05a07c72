//! Rails `db/schema.rb` front end.

mod convert;
pub mod lexer;
pub mod parser;

use crate::result::ProcessResult;

/// Parse a Rails schema file.
pub fn process(source: &str) -> ProcessResult {
    let tokens = lexer::Lexer::new(source).tokenize();
    let (calls, mut errors) = parser::Parser::new(tokens).parse_program();

    let mut converter = convert::Converter::default();
    converter.statements(&calls);
    errors.extend(converter.errors);

    ProcessResult::new(converter.schema, errors)
}
