//! Tokenizer for the TypeScript subset found in Drizzle schema modules.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    /// Backtick literal; `${..}` substitutions are kept verbatim.
    Template(String),
    Num(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Spread,
    Colon,
    Semicolon,
    Equals,
    Arrow,
    Question,
    Lt,
    Gt,
    Other(char),
    Eof,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self { chars, current_char }
    }

    fn advance(&mut self) {
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();
        while let Some(c) = self.current_char {
            if c == '*' && self.peek() == Some(&'/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_string(&mut self, quote: char) -> String {
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.current_char {
            if c == quote {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char {
                    match escaped {
                        'n' => text.push('\n'),
                        't' => text.push('\t'),
                        other => text.push(other),
                    }
                    self.advance();
                }
                continue;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    fn read_template(&mut self) -> String {
        self.advance();
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.current_char {
            match c {
                '`' if depth == 0 => {
                    self.advance();
                    break;
                }
                '\\' if depth == 0 => {
                    self.advance();
                    if let Some(escaped) = self.current_char {
                        text.push(escaped);
                    }
                }
                '$' if self.peek() == Some(&'{') => {
                    text.push(c);
                    self.advance();
                    text.push('{');
                    depth += 1;
                }
                '}' if depth > 0 => {
                    text.push(c);
                    depth -= 1;
                }
                _ => text.push(c),
            }
            self.advance();
        }
        text
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }
        while let Some(c) = self.current_char {
            if c.is_ascii_digit() || c == '.' {
                num.push(c);
            } else if c != '_' {
                break;
            }
            self.advance();
        }
        num
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let current = self.current_char;
            match current {
                None => return Token::Eof,
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.peek() == Some(&'/') => self.skip_line_comment(),
                Some('/') if self.peek() == Some(&'*') => self.skip_block_comment(),
                Some(quote @ ('\'' | '"')) => return Token::Str(self.read_string(quote)),
                Some('`') => return Token::Template(self.read_template()),
                Some('(') => return self.single(Token::LParen),
                Some(')') => return self.single(Token::RParen),
                Some('{') => return self.single(Token::LBrace),
                Some('}') => return self.single(Token::RBrace),
                Some('[') => return self.single(Token::LBracket),
                Some(']') => return self.single(Token::RBracket),
                Some(',') => return self.single(Token::Comma),
                Some(':') => return self.single(Token::Colon),
                Some(';') => return self.single(Token::Semicolon),
                Some('?') => return self.single(Token::Question),
                Some('<') => return self.single(Token::Lt),
                Some('>') => return self.single(Token::Gt),
                Some('.') => {
                    self.advance();
                    if self.current_char == Some('.') && self.peek() == Some(&'.') {
                        self.advance();
                        self.advance();
                        return Token::Spread;
                    }
                    return Token::Dot;
                }
                Some('=') => {
                    self.advance();
                    if self.current_char == Some('>') {
                        self.advance();
                        return Token::Arrow;
                    }
                    return Token::Equals;
                }
                Some(c) if c.is_ascii_digit() => return Token::Num(self.read_number()),
                Some('-') if self.peek().is_some_and(|n| n.is_ascii_digit()) => {
                    return Token::Num(self.read_number());
                }
                Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                    return Token::Ident(self.read_identifier());
                }
                Some(c) => return self.single(Token::Other(c)),
            }
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_table_definition() {
        let tokens =
            Lexer::new("export const users = pgTable('users', { id: serial('id') }); // done")
                .tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("export".to_string()),
                Token::Ident("const".to_string()),
                Token::Ident("users".to_string()),
                Token::Equals,
                Token::Ident("pgTable".to_string()),
                Token::LParen,
                Token::Str("users".to_string()),
                Token::Comma,
                Token::LBrace,
                Token::Ident("id".to_string()),
                Token::Colon,
                Token::Ident("serial".to_string()),
                Token::LParen,
                Token::Str("id".to_string()),
                Token::RParen,
                Token::RBrace,
                Token::RParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn keeps_template_substitutions() {
        let tokens = Lexer::new("sql`${t.age} > 0` => ...rest").tokenize();
        assert_eq!(tokens[1], Token::Template("${t.age} > 0".to_string()));
        assert_eq!(tokens[2], Token::Arrow);
        assert_eq!(tokens[3], Token::Spread);
    }
}
