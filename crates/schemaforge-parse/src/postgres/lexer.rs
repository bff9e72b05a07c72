//! Tokenizer for PostgreSQL DDL dumps.

use std::iter::Peekable;
use std::str::Chars;

/// SQL token.
///
/// Keywords are not distinguished from identifiers here: the parser matches
/// bare words case-insensitively, while quoted identifiers never act as
/// keywords.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(String),
    Quoted(String),
    Str(String),
    Num(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Cast,
    Op(String),
    Eof,
}

impl Token {
    /// True when the token is the bare word `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(word) if word.eq_ignore_ascii_case(keyword))
    }

    /// Identifier text for bare or quoted names.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Word(word) | Token::Quoted(word) => Some(word.as_str()),
            _ => None,
        }
    }
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

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        // positioned on the opening '/'
        self.advance();
        self.advance();
        while let Some(c) = self.current_char {
            self.advance();
            if c == '*' && self.current_char == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    /// Read text delimited by `quote`, where a doubled quote stands for itself.
    fn read_delimited(&mut self, quote: char) -> String {
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.current_char {
            if c == quote {
                if self.peek() == Some(&quote) {
                    text.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    break;
                }
            } else {
                text.push(c);
                self.advance();
            }
        }
        text
    }

    /// `$$ ... $$` or `$tag$ ... $tag$` bodies.
    fn read_dollar_quoted(&mut self) -> String {
        let mut tag = String::from("$");
        self.advance();
        while let Some(c) = self.current_char {
            tag.push(c);
            self.advance();
            if c == '$' {
                break;
            }
        }

        let mut body = String::new();
        while let Some(c) = self.current_char {
            body.push(c);
            self.advance();
            if body.ends_with(&tag) {
                body.truncate(body.len() - tag.len());
                break;
            }
        }
        body
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;
        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot && self.peek().is_some_and(|n| n.is_ascii_digit()) {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn read_operator(&mut self) -> String {
        let mut op = String::new();
        while let Some(c) = self.current_char {
            if "+-*/<>=~!@#%^&|`?".contains(c) {
                if c == '-' && self.peek() == Some(&'-') {
                    break;
                }
                op.push(c);
                self.advance();
            } else {
                break;
            }
        }
        op
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let current = self.current_char;
            match current {
                None => return Token::Eof,
                Some('-') if self.peek() == Some(&'-') => {
                    self.skip_line_comment();
                }
                Some('/') if self.peek() == Some(&'*') => {
                    self.skip_block_comment();
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
                Some(';') => {
                    self.advance();
                    return Token::Semicolon;
                }
                Some('.') => {
                    self.advance();
                    return Token::Dot;
                }
                Some(':') => {
                    self.advance();
                    if self.current_char == Some(':') {
                        self.advance();
                        return Token::Cast;
                    }
                    return Token::Op(":".to_string());
                }
                Some('"') => return Token::Quoted(self.read_delimited('"')),
                Some('\'') => return Token::Str(self.read_delimited('\'')),
                Some('$') if self.peek().is_some_and(|c| *c == '$' || c.is_alphabetic()) => {
                    return Token::Str(self.read_dollar_quoted());
                }
                Some(c) if (c == 'E' || c == 'e') && self.peek() == Some(&'\'') => {
                    self.advance();
                    return Token::Str(self.read_delimited('\''));
                }
                Some(c) if c.is_ascii_digit() => return Token::Num(self.read_number()),
                Some(c) if c.is_alphabetic() || c == '_' => return Token::Word(self.read_word()),
                Some(_) => {
                    let op = self.read_operator();
                    if op.is_empty() {
                        // unknown character
                        self.advance();
                        continue;
                    }
                    return Token::Op(op);
                }
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

/// Render tokens back to SQL text with conventional spacing.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Token> = None;

    for token in tokens {
        if *token == Token::Eof {
            break;
        }
        let glue = match (previous, token) {
            (None, _) => true,
            (_, Token::RParen | Token::RBracket | Token::Comma | Token::Dot | Token::Cast) => true,
            (Some(Token::LParen | Token::LBracket | Token::Dot | Token::Cast), _) => true,
            (Some(Token::Word(_) | Token::Quoted(_)), Token::LParen) => {
                !previous.is_some_and(is_spaced_keyword)
            }
            (Some(Token::RBracket), Token::LBracket) => true,
            (Some(Token::Word(_) | Token::Quoted(_) | Token::RParen), Token::LBracket) => true,
            _ => false,
        };
        if !glue {
            out.push(' ');
        }
        match token {
            Token::Word(word) | Token::Num(word) | Token::Op(word) => out.push_str(word),
            Token::Quoted(name) => {
                out.push('"');
                out.push_str(&name.replace('"', "\"\""));
                out.push('"');
            }
            Token::Str(text) => {
                out.push('\'');
                out.push_str(&text.replace('\'', "''"));
                out.push('\'');
            }
            Token::LParen => out.push('('),
            Token::RParen => out.push(')'),
            Token::LBracket => out.push('['),
            Token::RBracket => out.push(']'),
            Token::Comma => out.push(','),
            Token::Semicolon => out.push(';'),
            Token::Dot => out.push('.'),
            Token::Cast => out.push_str("::"),
            Token::Eof => {}
        }
        previous = Some(token);
    }

    out
}

fn is_spaced_keyword(token: &Token) -> bool {
    ["AND", "OR", "NOT", "IN", "CHECK", "ANY", "ALL", "IS"]
        .iter()
        .any(|keyword| token.is_keyword(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_create_table() {
        let tokens = Lexer::new("CREATE TABLE \"Users\" (id int); -- trailing").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Word("CREATE".to_string()),
                Token::Word("TABLE".to_string()),
                Token::Quoted("Users".to_string()),
                Token::LParen,
                Token::Word("id".to_string()),
                Token::Word("int".to_string()),
                Token::RParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn reads_strings_casts_and_comments() {
        let tokens = Lexer::new("/* c */ 'it''s'::text $$body$$ 1.5").tokenize();
        assert_eq!(tokens[0], Token::Str("it's".to_string()));
        assert_eq!(tokens[1], Token::Cast);
        assert_eq!(tokens[3], Token::Str("body".to_string()));
        assert_eq!(tokens[4], Token::Num("1.5".to_string()));
    }

    #[test]
    fn renders_expressions() {
        let tokens = Lexer::new("nextval ( 'users_id_seq' :: regclass )").tokenize();
        assert_eq!(render(&tokens), "nextval('users_id_seq'::regclass)");

        let tokens = Lexer::new("price > 0 AND (qty >= 1)").tokenize();
        assert_eq!(render(&tokens), "price > 0 AND (qty >= 1)");

        let tokens = Lexer::new("numeric(10, 2)").tokenize();
        assert_eq!(render(&tokens), "numeric(10, 2)");
    }

    #[test]
    fn trailing_eof_adds_no_space() {
        let tokens = Lexer::new("status").tokenize();
        assert_eq!(tokens.last(), Some(&Token::Eof));
        assert_eq!(render(&tokens), "status");
        assert_eq!(render(&tokens[..tokens.len() - 1]), "status");
    }
}
