use crate::error::{ProcessError, Result};
use crate::postgres::lexer::Token;

/// Position within the tokens of one statement.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn current(&self) -> &'a Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    pub fn peek(&self, offset: usize) -> &'a Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub fn at_end(&self) -> bool {
        matches!(self.current(), Token::Eof | Token::Semicolon)
    }

    pub fn rest(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a keyword sequence only if all of it is present.
    pub fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(offset, keyword)| self.peek(offset).is_keyword(keyword));
        if matched {
            self.pos += keywords.len();
        }
        matched
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    pub fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn identifier(&mut self) -> Result<String> {
        match self.current().identifier() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(self.unexpected("identifier")),
        }
    }

    /// `name` or `schema.name`; the schema qualifier is dropped.
    pub fn qualified_name(&mut self) -> Result<String> {
        let mut name = self.identifier()?;
        while self.eat(&Token::Dot) {
            name = self.identifier()?;
        }
        Ok(name)
    }

    /// All parts of a dotted name.
    pub fn dotted_name(&mut self) -> Result<Vec<String>> {
        let mut parts = vec![self.identifier()?];
        while self.eat(&Token::Dot) {
            parts.push(self.identifier()?);
        }
        Ok(parts)
    }

    /// Consume a parenthesised group and return the tokens inside it.
    pub fn group(&mut self) -> Result<&'a [Token]> {
        if self.current() != &Token::LParen {
            return Err(self.unexpected("'('"));
        }
        let start = self.pos + 1;
        let mut depth = 0usize;
        while self.pos < self.tokens.len() {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.tokens[start..self.pos];
                        self.advance();
                        return Ok(inner);
                    }
                }
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }
        Err(ProcessError::UnexpectedToken("unbalanced parentheses".to_string()))
    }

    /// Consume tokens up to (not including) a depth-0 token accepted by `stop`.
    pub fn take_until(&mut self, stop: impl Fn(&Token) -> bool) -> &'a [Token] {
        let start = self.pos;
        let mut depth = 0usize;
        while self.pos < self.tokens.len() {
            let token = self.current();
            match token {
                Token::Eof | Token::Semicolon => break,
                Token::LParen | Token::LBracket => depth += 1,
                Token::RParen | Token::RBracket if depth > 0 => depth -= 1,
                Token::RParen | Token::RBracket => break,
                _ if depth == 0 && stop(token) => break,
                _ => {}
            }
            self.advance();
        }
        &self.tokens[start..self.pos]
    }

    pub fn unexpected(&self, expected: &str) -> ProcessError {
        ProcessError::UnexpectedToken(format!("expected {expected}, found {:?}", self.current()))
    }
}

/// Split tokens at commas outside of parentheses.
pub fn split_commas(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(&tokens[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// Split a token stream into statements at top-level semicolons.
pub fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    tokens
        .split(|token| matches!(token, Token::Semicolon | Token::Eof))
        .filter(|statement| !statement.is_empty())
        .collect()
}
