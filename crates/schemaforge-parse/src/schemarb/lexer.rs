//! Tokenizer for the subset of Ruby used by Rails `schema.rb` files.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    /// Hash key written as `name:`.
    Label(String),
    /// `:name` or `:"name"`.
    Symbol(String),
    Str(String),
    /// A double-quoted string containing `#{...}`; its value is only known at runtime.
    Interpolated(String),
    /// `%w[...]` / `%i[...]` word lists.
    Words(Vec<String>),
    Num(String),
    True,
    False,
    Nil,
    Do,
    End,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    ColonColon,
    Pipe,
    /// `=>`
    Rocket,
    /// `->`
    Lambda,
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

    fn skip_comment(&mut self) {
        while let Some(c) = self.current_char {
            if c == '\n' {
                break;
            }
            self.advance();
        }
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
        // predicate and bang methods
        if let Some(c @ ('?' | '!')) = self.current_char {
            if self.peek() != Some(&'=') {
                ident.push(c);
                self.advance();
            }
        }
        ident
    }

    /// Returns the text and whether it contained interpolation.
    fn read_string(&mut self, quote: char) -> (String, bool) {
        self.advance();
        let mut text = String::new();
        let mut interpolated = false;
        while let Some(c) = self.current_char {
            if c == quote {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char {
                    match (quote, escaped) {
                        ('"', 'n') => text.push('\n'),
                        ('"', 't') => text.push('\t'),
                        ('\'', '\'') | ('\'', '\\') | ('"', _) => text.push(escaped),
                        _ => {
                            text.push('\\');
                            text.push(escaped);
                        }
                    }
                    self.advance();
                }
                continue;
            }
            if quote == '"' && c == '#' && self.peek() == Some(&'{') {
                interpolated = true;
            }
            text.push(c);
            self.advance();
        }
        (text, interpolated)
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }
        let mut has_dot = false;
        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
            } else if c == '_' {
                // digit separator
            } else if c == '.' && !has_dot && self.peek().is_some_and(|n| n.is_ascii_digit()) {
                has_dot = true;
                num.push(c);
            } else {
                break;
            }
            self.advance();
        }
        num
    }

    fn read_words(&mut self) -> Vec<String> {
        // positioned on the opening delimiter
        let close = match self.current_char {
            Some('(') => ')',
            Some('{') => '}',
            Some('<') => '>',
            _ => ']',
        };
        self.advance();
        let mut words = Vec::new();
        let mut word = String::new();
        while let Some(c) = self.current_char {
            self.advance();
            if c == close {
                break;
            }
            if c.is_whitespace() {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                word.push(c);
            }
        }
        if !word.is_empty() {
            words.push(word);
        }
        words
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let current = self.current_char;
            match current {
                None => return Token::Eof,
                Some('\n') | Some(';') => {
                    self.advance();
                    return Token::Newline;
                }
                Some(c) if c.is_whitespace() => self.advance(),
                Some('#') => self.skip_comment(),
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
                Some('{') => {
                    self.advance();
                    return Token::LBrace;
                }
                Some('}') => {
                    self.advance();
                    return Token::RBrace;
                }
                Some(',') => {
                    self.advance();
                    return Token::Comma;
                }
                Some('.') => {
                    self.advance();
                    return Token::Dot;
                }
                Some('|') => {
                    self.advance();
                    return Token::Pipe;
                }
                Some('=') if self.peek() == Some(&'>') => {
                    self.advance();
                    self.advance();
                    return Token::Rocket;
                }
                Some('-') if self.peek() == Some(&'>') => {
                    self.advance();
                    self.advance();
                    return Token::Lambda;
                }
                Some('-') if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    return Token::Num(self.read_number());
                }
                Some(':') => {
                    self.advance();
                    match self.current_char {
                        Some(':') => {
                            self.advance();
                            return Token::ColonColon;
                        }
                        Some(quote @ ('"' | '\'')) => {
                            return Token::Symbol(self.read_string(quote).0);
                        }
                        Some(c) if c.is_alphabetic() || c == '_' => {
                            return Token::Symbol(self.read_identifier());
                        }
                        _ => return Token::Other(':'),
                    }
                }
                Some('%') if self.peek().is_some_and(|c| matches!(c, 'w' | 'i' | 'W' | 'I')) => {
                    self.advance();
                    self.advance();
                    return Token::Words(self.read_words());
                }
                Some(quote @ ('"' | '\'')) => {
                    let (text, interpolated) = self.read_string(quote);
                    if interpolated {
                        return Token::Interpolated(text);
                    }
                    return Token::Str(text);
                }
                Some(c) if c.is_ascii_digit() => return Token::Num(self.read_number()),
                Some(c) if c.is_alphabetic() || c == '_' || c == '@' => {
                    if c == '@' {
                        self.advance();
                    }
                    let ident = self.read_identifier();
                    if self.current_char == Some(':') && self.peek() != Some(&':') {
                        self.advance();
                        return Token::Label(ident);
                    }
                    return match ident.as_str() {
                        "true" => Token::True,
                        "false" => Token::False,
                        "nil" => Token::Nil,
                        "do" => Token::Do,
                        "end" => Token::End,
                        _ => Token::Ident(ident),
                    };
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
            // collapse blank lines
            if !(token == Token::Newline && tokens.last() == Some(&Token::Newline)) {
                tokens.push(token);
            }
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
    fn tokenizes_create_table_line() {
        let tokens = Lexer::new(r#"create_table "users", force: :cascade do |t|"#).tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("create_table".to_string()),
                Token::Str("users".to_string()),
                Token::Comma,
                Token::Label("force".to_string()),
                Token::Symbol("cascade".to_string()),
                Token::Do,
                Token::Pipe,
                Token::Ident("t".to_string()),
                Token::Pipe,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn reads_numbers_lambdas_and_interpolation() {
        let tokens =
            Lexer::new("version: 2024_01_15_120000\n-> { \"now()\" } \"#{prefix}_users\" ::")
                .tokenize();
        assert_eq!(tokens[1], Token::Num("20240115120000".to_string()));
        assert_eq!(tokens[2], Token::Newline);
        assert_eq!(tokens[3], Token::Lambda);
        assert_eq!(tokens[5], Token::Str("now()".to_string()));
        assert_eq!(tokens[7], Token::Interpolated("#{prefix}_users".to_string()));
        assert_eq!(tokens[8], Token::ColonColon);
    }

    #[test]
    fn skips_comments_and_reads_word_lists() {
        let tokens = Lexer::new("# header\n%w[a b]").tokenize();
        assert_eq!(tokens[0], Token::Newline);
        assert_eq!(
            tokens[1],
            Token::Words(vec!["a".to_string(), "b".to_string()])
        );
    }
}
