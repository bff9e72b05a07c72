//! Call-level AST for `schema.rb`.
//!
//! A schema file is a tree of method calls: `create_table` with a block of
//! `t.<type>` calls, followed by `add_index`/`add_foreign_key` calls. Only
//! literal arguments are kept as values; anything computed at runtime is
//! preserved as [`Value::Expr`] so later stages can reject it.

use indexmap::IndexMap;

use crate::error::{ProcessError, Result};
use crate::schemarb::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Symbol(String),
    Num(String),
    Bool(bool),
    Nil,
    Array(Vec<Value>),
    Hash(IndexMap<String, Value>),
    /// `-> { body }`
    Lambda(Box<Value>),
    /// Source text of a non-literal expression.
    Expr(String),
}

impl Value {
    /// Text of a string or symbol literal.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Str(text) | Value::Symbol(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Value::Str(text) => format!("\"{text}\""),
            Value::Symbol(text) => format!(":{text}"),
            Value::Num(num) => num.clone(),
            Value::Bool(flag) => flag.to_string(),
            Value::Nil => "nil".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Hash(_) => "hash".to_string(),
            Value::Lambda(_) => "lambda".to_string(),
            Value::Expr(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub receiver: Option<String>,
    pub method: String,
    pub args: Vec<Value>,
    pub options: IndexMap<String, Value>,
    pub block: Option<Block>,
}

impl Call {
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub params: Vec<String>,
    pub body: Vec<Call>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{token:?}")))
        }
    }

    fn skip_newlines(&mut self) {
        while self.current() == &Token::Newline {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !matches!(self.current(), Token::Newline | Token::Eof) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ProcessError {
        ProcessError::UnexpectedToken(format!("expected {expected}, found {:?}", self.current()))
    }

    /// Parse the whole file. Statements that fail to parse are skipped and
    /// reported.
    pub fn parse_program(&mut self) -> (Vec<Call>, Vec<ProcessError>) {
        let mut errors = Vec::new();
        let calls = self.statements(&mut errors, false);
        (calls, errors)
    }

    fn statements(&mut self, errors: &mut Vec<ProcessError>, in_block: bool) -> Vec<Call> {
        let mut calls = Vec::new();
        loop {
            self.skip_newlines();
            match self.current() {
                Token::Eof => break,
                Token::End if in_block => break,
                Token::End | Token::RBrace => {
                    errors.push(self.unexpected("statement"));
                    self.advance();
                }
                _ => match self.call(errors) {
                    Ok(call) => calls.push(call),
                    Err(err) => {
                        errors.push(err);
                        self.skip_line();
                    }
                },
            }
        }
        calls
    }

    fn call(&mut self, errors: &mut Vec<ProcessError>) -> Result<Call> {
        let mut path = match self.current() {
            Token::Ident(name) => name.clone(),
            _ => return Err(self.unexpected("method call")),
        };
        self.advance();

        let mut receiver = None;
        loop {
            match self.current() {
                Token::ColonColon => {
                    self.advance();
                    path.push_str("::");
                    path.push_str(&self.identifier()?);
                }
                Token::LBracket if is_constant(&path) => {
                    let value = self.array()?;
                    path.push_str(&format!("[{}]", describe_list(&value)));
                }
                Token::Dot => {
                    self.advance();
                    let method = self.identifier()?;
                    let previous = std::mem::replace(&mut path, method);
                    receiver = Some(match receiver {
                        Some(outer) => format!("{outer}.{previous}"),
                        None => previous,
                    });
                }
                _ => break,
            }
        }

        let (args, options) = if self.current() == &Token::LParen {
            self.advance();
            let list = self.arguments(&Token::RParen)?;
            self.expect(&Token::RParen)?;
            list
        } else if self.starts_value() {
            self.arguments(&Token::Newline)?
        } else {
            (Vec::new(), IndexMap::new())
        };

        let block = if self.eat(&Token::Do) {
            let params = self.block_params()?;
            let body = self.statements(errors, true);
            self.expect(&Token::End)?;
            Some(Block { params, body })
        } else {
            None
        };

        Ok(Call {
            receiver,
            method: path,
            args,
            options,
            block,
        })
    }

    fn identifier(&mut self) -> Result<String> {
        match self.current() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn block_params(&mut self) -> Result<Vec<String>> {
        let mut params = Vec::new();
        if self.eat(&Token::Pipe) {
            while !self.eat(&Token::Pipe) {
                match self.current() {
                    Token::Ident(name) => {
                        params.push(name.clone());
                        self.advance();
                    }
                    Token::Comma => self.advance(),
                    _ => return Err(self.unexpected("block parameter")),
                }
            }
        }
        Ok(params)
    }

    fn starts_value(&self) -> bool {
        matches!(
            self.current(),
            Token::Str(_)
                | Token::Interpolated(_)
                | Token::Symbol(_)
                | Token::Num(_)
                | Token::Label(_)
                | Token::Words(_)
                | Token::LBracket
                | Token::Ident(_)
                | Token::Lambda
                | Token::True
                | Token::False
                | Token::Nil
        )
    }

    /// Comma-separated positional and keyword arguments. Newlines are
    /// allowed after a comma.
    fn arguments(&mut self, close: &Token) -> Result<(Vec<Value>, IndexMap<String, Value>)> {
        let mut args = Vec::new();
        let mut options = IndexMap::new();

        loop {
            if close == &Token::RParen {
                self.skip_newlines();
            }
            if self.current() == close || matches!(self.current(), Token::Do | Token::Eof) {
                break;
            }

            if let Token::Label(key) = self.current() {
                let key = key.clone();
                self.advance();
                self.skip_newlines();
                options.insert(key, self.value()?);
            } else {
                let value = self.value()?;
                if self.eat(&Token::Rocket) {
                    let key = value
                        .as_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.describe());
                    options.insert(key, self.value()?);
                } else {
                    args.push(value);
                }
            }

            if !self.eat(&Token::Comma) {
                break;
            }
            self.skip_newlines();
        }

        Ok((args, options))
    }

    fn value(&mut self) -> Result<Value> {
        let token = self.current().clone();
        match token {
            Token::Str(text) => {
                self.advance();
                Ok(Value::Str(text))
            }
            Token::Symbol(text) => {
                self.advance();
                Ok(Value::Symbol(text))
            }
            Token::Num(num) => {
                self.advance();
                Ok(Value::Num(num))
            }
            Token::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            Token::Nil => {
                self.advance();
                Ok(Value::Nil)
            }
            Token::Interpolated(text) => {
                self.advance();
                Ok(Value::Expr(format!("\"{text}\"")))
            }
            Token::Words(words) => {
                self.advance();
                Ok(Value::Array(words.into_iter().map(Value::Str).collect()))
            }
            Token::LBracket => self.array().map(Value::Array),
            Token::LBrace => self.hash(),
            Token::Lambda => self.lambda(),
            Token::Ident(_) => self.expression(),
            _ => Err(self.unexpected("value")),
        }
    }

    fn array(&mut self) -> Result<Vec<Value>> {
        self.expect(&Token::LBracket)?;
        let mut values = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&Token::RBracket) {
                break;
            }
            values.push(self.value()?);
            self.skip_newlines();
            if !self.eat(&Token::Comma) {
                self.skip_newlines();
                self.expect(&Token::RBracket)?;
                break;
            }
        }
        Ok(values)
    }

    fn hash(&mut self) -> Result<Value> {
        self.expect(&Token::LBrace)?;
        let mut entries = IndexMap::new();
        loop {
            self.skip_newlines();
            if self.eat(&Token::RBrace) {
                break;
            }
            let key = if let Token::Label(key) = self.current() {
                let key = key.clone();
                self.advance();
                key
            } else {
                let key = self.value()?;
                self.expect(&Token::Rocket)?;
                key.as_name().map(str::to_string).unwrap_or_else(|| key.describe())
            };
            self.skip_newlines();
            entries.insert(key, self.value()?);
            self.skip_newlines();
            if !self.eat(&Token::Comma) {
                self.skip_newlines();
                self.expect(&Token::RBrace)?;
                break;
            }
        }
        Ok(Value::Hash(entries))
    }

    /// `-> { value }`, `->(x) { value }` or `-> do value end`.
    fn lambda(&mut self) -> Result<Value> {
        self.expect(&Token::Lambda)?;
        if self.current() == &Token::LParen {
            while !self.eat(&Token::RParen) {
                if self.current() == &Token::Eof {
                    return Err(self.unexpected("')'"));
                }
                self.advance();
            }
        }
        let close = if self.eat(&Token::LBrace) {
            Token::RBrace
        } else {
            self.expect(&Token::Do)?;
            Token::End
        };
        self.skip_newlines();
        let body = self.value()?;
        self.skip_newlines();
        self.expect(&close)?;
        Ok(Value::Lambda(Box::new(body)))
    }

    /// A method chain or variable reference, kept as text.
    fn expression(&mut self) -> Result<Value> {
        let mut text = self.identifier()?;
        loop {
            match self.current() {
                Token::Dot => {
                    self.advance();
                    text.push('.');
                    text.push_str(&self.identifier()?);
                }
                Token::ColonColon => {
                    self.advance();
                    text.push_str("::");
                    text.push_str(&self.identifier()?);
                }
                Token::LParen => {
                    self.advance();
                    let (args, _) = self.arguments(&Token::RParen)?;
                    self.expect(&Token::RParen)?;
                    text.push_str(&format!("({})", describe_list(&args)));
                }
                _ => break,
            }
        }
        Ok(Value::Expr(text))
    }
}

/// `Foo::Bar` style constant, which may be followed by an index like `[7.1]`.
fn is_constant(path: &str) -> bool {
    path.rsplit("::")
        .next()
        .is_some_and(|segment| segment.starts_with(char::is_uppercase))
}

fn describe_list(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemarb::lexer::Lexer;

    fn parse(source: &str) -> (Vec<Call>, Vec<ProcessError>) {
        Parser::new(Lexer::new(source).tokenize()).parse_program()
    }

    #[test]
    fn parses_nested_blocks() {
        let source = r#"
ActiveRecord::Schema[7.1].define(version: 2024_01_01_000000) do
  create_table "users", id: false, force: :cascade do |t|
    t.string "email", null: false, default: ""
    t.datetime "created_at", default: -> { "CURRENT_TIMESTAMP" }
  end
end
"#;
        let (calls, errors) = parse(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "define");
        assert_eq!(calls[0].receiver.as_deref(), Some("ActiveRecord::Schema[7.1]"));

        let body = &calls[0].block.as_ref().unwrap().body;
        let create = &body[0];
        assert_eq!(create.method, "create_table");
        assert_eq!(create.args, vec![Value::Str("users".to_string())]);
        assert_eq!(create.option("id"), Some(&Value::Bool(false)));

        let columns = &create.block.as_ref().unwrap().body;
        assert_eq!(columns[0].receiver.as_deref(), Some("t"));
        assert_eq!(columns[0].method, "string");
        assert_eq!(columns[0].option("default"), Some(&Value::Str(String::new())));
        assert_eq!(
            columns[1].option("default"),
            Some(&Value::Lambda(Box::new(Value::Str("CURRENT_TIMESTAMP".to_string()))))
        );
    }

    #[test]
    fn keeps_arguments_across_lines_and_hashes() {
        let source = "add_index \"users\", [\"a\", \"b\"],\n  unique: true, where: \"x\", using: :gin\nt.references :author, foreign_key: { to_table: :users, on_delete: :cascade }";
        let (calls, errors) = parse(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(calls[0].options.len(), 3);
        let Some(Value::Hash(fk)) = calls[1].option("foreign_key") else {
            panic!("expected hash");
        };
        assert_eq!(fk.get("to_table"), Some(&Value::Symbol("users".to_string())));
    }

    #[test]
    fn index_call_takes_array_argument() {
        let (calls, errors) = parse("t.index [\"email\"], unique: true");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(calls[0].method, "index");
        assert_eq!(
            calls[0].args,
            vec![Value::Array(vec![Value::Str("email".to_string())])]
        );
    }

    #[test]
    fn keeps_runtime_values_as_expressions() {
        let (calls, _) = parse("create_table table_name do |t|\nend");
        assert_eq!(calls[0].args, vec![Value::Expr("table_name".to_string())]);
    }
}
