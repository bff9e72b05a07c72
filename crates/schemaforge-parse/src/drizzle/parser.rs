//! Expression parser for Drizzle schema modules.
//!
//! Only top-level `const`/`let` bindings are kept; imports, type
//! declarations and other statements are skipped.

use crate::drizzle::lexer::Token;
use crate::error::{ProcessError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Str(String),
    Num(String),
    Bool(bool),
    Null,
    /// Tagged or plain template literal, e.g. `` sql`now()` ``.
    Template(Option<String>, String),
    Member(Box<Expr>, String),
    Call(Box<Expr>, Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    Arrow(Vec<String>, Box<Expr>),
    /// Something the schema reader has no use for, such as a block body.
    Opaque,
}

impl Expr {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::Str(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Expr> {
        match self {
            Expr::Object(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Split `base(args).a(x).b(y)` into the base call and its method chain.
    pub fn chain(&self) -> Option<(&str, &[Expr], Vec<(&str, &[Expr])>)> {
        let mut methods = Vec::new();
        let mut node = self;
        loop {
            match node {
                Expr::Call(callee, args) => match callee.as_ref() {
                    Expr::Ident(name) => {
                        methods.reverse();
                        return Some((name.as_str(), args.as_slice(), methods));
                    }
                    Expr::Member(receiver, method) => {
                        if matches!(receiver.as_ref(), Expr::Ident(_)) {
                            // namespaced builder such as `t.varchar(...)` or `p.index(...)`
                            methods.reverse();
                            return Some((method.as_str(), args.as_slice(), methods));
                        }
                        methods.push((method.as_str(), args.as_slice()));
                        node = receiver;
                    }
                    _ => return None,
                },
                _ => return None,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Expr,
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

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
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

    fn is_ident(&self, word: &str) -> bool {
        matches!(self.current(), Token::Ident(ident) if ident == word)
    }

    fn unexpected(&self, expected: &str) -> ProcessError {
        ProcessError::UnexpectedToken(format!("expected {expected}, found {:?}", self.current()))
    }

    /// Skip one balanced group starting at an opening token.
    fn skip_group(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Eof => return,
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the end of a statement: a `;` or the start of the next
    /// top-level declaration.
    fn skip_statement(&mut self) {
        loop {
            match self.current() {
                Token::Eof => return,
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::LParen | Token::LBrace | Token::LBracket => self.skip_group(),
                Token::Ident(word)
                    if matches!(word.as_str(), "export" | "const" | "let" | "var" | "import") =>
                {
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    pub fn parse_module(&mut self) -> (Vec<Binding>, Vec<ProcessError>) {
        let mut bindings = Vec::new();
        let mut errors = Vec::new();

        loop {
            match self.current() {
                Token::Eof => break,
                Token::Semicolon => self.advance(),
                Token::Ident(word) => match word.as_str() {
                    "import" => {
                        self.advance();
                        self.skip_import();
                    }
                    "export" => {
                        self.advance();
                        if self.is_ident("default") {
                            self.advance();
                            self.skip_statement();
                        }
                    }
                    "const" | "let" | "var" => {
                        self.advance();
                        match self.binding() {
                            Ok(binding) => bindings.push(binding),
                            Err(err) => {
                                errors.push(err);
                                self.skip_statement();
                            }
                        }
                    }
                    _ => {
                        self.advance();
                        self.skip_statement();
                    }
                },
                _ => {
                    self.advance();
                    self.skip_statement();
                }
            }
        }

        (bindings, errors)
    }

    fn skip_import(&mut self) {
        // import ... from 'module'; or import 'module';
        loop {
            match self.current() {
                Token::Eof => return,
                Token::Str(_) => {
                    self.advance();
                    self.eat(&Token::Semicolon);
                    return;
                }
                Token::LBrace => self.skip_group(),
                _ => self.advance(),
            }
        }
    }

    fn binding(&mut self) -> Result<Binding> {
        let name = match self.current() {
            Token::Ident(name) => name.clone(),
            _ => return Err(self.unexpected("binding name")),
        };
        self.advance();
        if self.eat(&Token::Colon) {
            // type annotation
            while !matches!(self.current(), Token::Equals | Token::Semicolon | Token::Eof) {
                self.advance();
            }
        }
        self.expect(&Token::Equals)?;
        let value = self.expr()?;
        self.eat(&Token::Semicolon);
        Ok(Binding { name, value })
    }

    pub fn expr(&mut self) -> Result<Expr> {
        if self.arrow_ahead() {
            return self.arrow();
        }
        let mut expr = self.primary()?;
        loop {
            match self.current().clone() {
                Token::Dot | Token::Question
                    if self.current() == &Token::Dot || self.peek_at(1) == &Token::Dot =>
                {
                    if self.current() == &Token::Question {
                        self.advance();
                    }
                    self.advance();
                    let name = match self.current() {
                        Token::Ident(name) => name.clone(),
                        _ => return Err(self.unexpected("property name")),
                    };
                    self.advance();
                    expr = Expr::Member(Box::new(expr), name);
                    if self.current() == &Token::Lt {
                        self.skip_type_arguments();
                    }
                }
                Token::LParen => {
                    let args = self.arguments()?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                Token::Template(text) => {
                    self.advance();
                    let tag = match &expr {
                        Expr::Ident(name) => Some(name.clone()),
                        Expr::Member(_, name) => Some(name.clone()),
                        _ => None,
                    };
                    expr = Expr::Template(tag, text);
                }
                Token::Ident(word) if word == "as" || word == "satisfies" => {
                    self.advance();
                    self.skip_type();
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn skip_type_arguments(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Eof => return,
                Token::Lt => depth += 1,
                Token::Gt => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_type(&mut self) {
        match self.current() {
            Token::LBrace | Token::LParen | Token::LBracket => self.skip_group(),
            _ => {
                self.advance();
                while self.current() == &Token::Dot {
                    self.advance();
                    self.advance();
                }
                if self.current() == &Token::Lt {
                    self.skip_type_arguments();
                }
            }
        }
    }

    /// `x => ...` or `(a, b) => ...`.
    fn arrow_ahead(&self) -> bool {
        match self.current() {
            Token::Ident(_) => self.peek_at(1) == &Token::Arrow,
            Token::LParen => {
                let mut depth = 0usize;
                let mut offset = 0;
                loop {
                    match self.peek_at(offset) {
                        Token::Eof => return false,
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.peek_at(offset + 1) == &Token::Arrow;
                            }
                        }
                        _ => {}
                    }
                    offset += 1;
                }
            }
            _ => false,
        }
    }

    fn arrow(&mut self) -> Result<Expr> {
        let mut params = Vec::new();
        if let Token::Ident(name) = self.current() {
            params.push(name.clone());
            self.advance();
        } else {
            self.expect(&Token::LParen)?;
            let mut depth = 1usize;
            let mut expecting_name = true;
            while depth > 0 {
                match self.current() {
                    Token::Eof => return Err(self.unexpected(")")),
                    Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                    Token::RParen | Token::RBrace | Token::RBracket => depth -= 1,
                    Token::Comma if depth == 1 => expecting_name = true,
                    Token::Ident(name) if depth == 1 && expecting_name => {
                        params.push(name.clone());
                        expecting_name = false;
                    }
                    _ => {}
                }
                self.advance();
            }
        }
        self.expect(&Token::Arrow)?;

        let body = if self.current() == &Token::LBrace {
            self.block_body()?
        } else {
            self.expr()?
        };
        Ok(Expr::Arrow(params, Box::new(body)))
    }

    /// `{ ... return expr; }`: keep the returned expression.
    fn block_body(&mut self) -> Result<Expr> {
        self.expect(&Token::LBrace)?;
        let mut result = Expr::Opaque;
        loop {
            match self.current() {
                Token::Eof => return Err(self.unexpected("}")),
                Token::RBrace => {
                    self.advance();
                    return Ok(result);
                }
                Token::Ident(word) if word == "return" => {
                    self.advance();
                    result = self.expr()?;
                    self.eat(&Token::Semicolon);
                }
                Token::LParen | Token::LBrace | Token::LBracket => self.skip_group(),
                _ => self.advance(),
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        self.expect(&Token::LParen)?;
        self.list(&Token::RParen)
    }

    fn list(&mut self, close: &Token) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            if self.eat(&Token::Spread) {
                self.expr()?;
            } else {
                items.push(self.expr()?);
            }
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn object(&mut self) -> Result<Expr> {
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            if self.eat(&Token::Spread) {
                self.expr()?;
            } else {
                let key = match self.current() {
                    Token::Ident(key) | Token::Str(key) | Token::Num(key) => key.clone(),
                    _ => return Err(self.unexpected("property key")),
                };
                self.advance();
                let value = if self.eat(&Token::Colon) {
                    self.expr()?
                } else if self.current() == &Token::LParen {
                    // method shorthand
                    self.skip_group();
                    if self.current() == &Token::LBrace {
                        self.skip_group();
                    }
                    Expr::Opaque
                } else {
                    Expr::Ident(key.clone())
                };
                entries.push((key, value));
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace)?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        match token {
            Token::Str(text) => {
                self.advance();
                Ok(Expr::Str(text))
            }
            Token::Num(num) => {
                self.advance();
                Ok(Expr::Num(num))
            }
            Token::Template(text) => {
                self.advance();
                Ok(Expr::Template(None, text))
            }
            Token::LBrace => self.object(),
            Token::LBracket => {
                self.advance();
                Ok(Expr::Array(self.list(&Token::RBracket)?))
            }
            Token::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(word) => {
                self.advance();
                match word.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" | "undefined" => Ok(Expr::Null),
                    "new" => self.expr(),
                    _ => Ok(Expr::Ident(word)),
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drizzle::lexer::Lexer;

    fn parse(source: &str) -> Vec<Binding> {
        let (bindings, errors) = Parser::new(Lexer::new(source).tokenize()).parse_module();
        assert!(errors.is_empty(), "{errors:?}");
        bindings
    }

    #[test]
    fn keeps_bindings_and_skips_imports() {
        let bindings = parse(
            r#"
import { pgTable, serial } from "drizzle-orm/pg-core";
import type { InferSelectModel } from 'drizzle-orm';

export const users = pgTable("users", {
  id: serial("id").primaryKey(),
});

export type User = InferSelectModel<typeof users>;
"#,
        );
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name, "users");
    }

    #[test]
    fn splits_builder_chains() {
        let bindings = parse(
            "const c = varchar('email', { length: 255 }).notNull().references(() => users.id, { onDelete: 'cascade' });",
        );
        let (base, args, methods) = bindings[0].value.chain().unwrap();
        assert_eq!(base, "varchar");
        assert_eq!(args[0], Expr::Str("email".to_string()));
        assert_eq!(
            args[1].field("length"),
            Some(&Expr::Num("255".to_string()))
        );
        let names: Vec<&str> = methods.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["notNull", "references"]);

        let target = &methods[1].1[0];
        assert_eq!(
            target,
            &Expr::Arrow(
                Vec::new(),
                Box::new(Expr::Member(
                    Box::new(Expr::Ident("users".to_string())),
                    "id".to_string()
                ))
            )
        );
    }

    #[test]
    fn parses_config_callbacks() {
        let bindings = parse(
            "const t = pgTable('t', { a: text('a').$type<'x' | 'y'>() }, (table) => ({ idx: index('t_a_idx').on(table.a), chk: check('positive', sql`${table.a} > 0`) }));",
        );
        let Expr::Call(_, args) = &bindings[0].value else {
            panic!("expected call");
        };
        let Expr::Arrow(params, body) = &args[2] else {
            panic!("expected arrow");
        };
        assert_eq!(params, &vec!["table".to_string()]);
        let check = body.field("chk").unwrap();
        let (base, args, _) = check.chain().unwrap();
        assert_eq!(base, "check");
        assert_eq!(
            args[1],
            Expr::Template(Some("sql".to_string()), "${table.a} > 0".to_string())
        );
    }
}
