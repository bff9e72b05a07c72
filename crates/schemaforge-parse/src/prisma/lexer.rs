//! Tokenizer for Prisma schema files.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Num(String),
    /// `/// text`, kept because it documents the next model, field or enum.
    DocComment(String),
    At,
    AtAt,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Question,
    Dot,
    Equals,
    Newline,
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

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        while let Some(c) = self.current_char {
            if c == '\n' {
                break;
            }
            line.push(c);
            self.advance();
        }
        line
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_string(&mut self) -> String {
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.current_char {
            self.advance();
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.current_char {
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                        self.advance();
                    }
                }
                other => text.push(other),
            }
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
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let current = self.current_char;
            match current {
                None => return Token::Eof,
                Some('\n') => {
                    self.advance();
                    return Token::Newline;
                }
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.peek() == Some(&'/') => {
                    let line = self.read_line();
                    if let Some(doc) = line.strip_prefix("///") {
                        return Token::DocComment(doc.trim().to_string());
                    }
                }
                Some('@') => {
                    self.advance();
                    if self.current_char == Some('@') {
                        self.advance();
                        return Token::AtAt;
                    }
                    return Token::At;
                }
                Some('{') => {
                    self.advance();
                    return Token::LBrace;
                }
                Some('}') => {
                    self.advance();
                    return Token::RBrace;
                }
                Some('(') => {
                    self.advance();
                    return Token::LParen;
                }
                Some(')') => {
                    self.advance();
                    return Token::RParen;
                }
                Some('[') => {
                    self.advance();
                    return Token::LBracket;
                }
                Some(']') => {
                    self.advance();
                    return Token::RBracket;
                }
                Some(',') => {
                    self.advance();
                    return Token::Comma;
                }
                Some(':') => {
                    self.advance();
                    return Token::Colon;
                }
                Some('?') => {
                    self.advance();
                    return Token::Question;
                }
                Some('.') => {
                    self.advance();
                    return Token::Dot;
                }
                Some('=') => {
                    self.advance();
                    return Token::Equals;
                }
                Some('"') => return Token::Str(self.read_string()),
                Some(c) if c.is_ascii_digit() => return Token::Num(self.read_number()),
                Some('-') if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    return Token::Num(self.read_number());
                }
                Some(c) if c.is_alphabetic() || c == '_' => {
                    return Token::Ident(self.read_identifier());
                }
                Some(c) => {
                    self.advance();
                    return Token::Other(c);
                }
            }
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_field_with_attributes() {
        let tokens = Lexer::new("  email String? @unique @db.VarChar(255) // note").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("email".to_string()),
                Token::Ident("String".to_string()),
                Token::Question,
                Token::At,
                Token::Ident("unique".to_string()),
                Token::At,
                Token::Ident("db".to_string()),
                Token::Dot,
                Token::Ident("VarChar".to_string()),
                Token::LParen,
                Token::Num("255".to_string()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn keeps_doc_comments() {
        let tokens = Lexer::new("/// Registered users\nmodel").tokenize();
        assert_eq!(tokens[0], Token::DocComment("Registered users".to_string()));
        assert_eq!(tokens[1], Token::Newline);
    }
}
