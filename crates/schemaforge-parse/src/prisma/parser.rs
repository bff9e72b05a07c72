//! Block-level AST for Prisma schema files.

use crate::error::{ProcessError, Result};
use crate::prisma::lexer::Token;

/// Attribute argument expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Num(String),
    Bool(bool),
    Ident(String),
    Call(String, Vec<Arg>),
    Array(Vec<Expr>),
}

impl Expr {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Expr::Str(text) | Expr::Ident(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Identifiers of an array expression such as `[authorId, id]`.
    pub fn names(&self) -> Vec<String> {
        match self {
            Expr::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    // `[title(sort: Desc)]`
                    Expr::Call(name, _) => Some(name.as_str()),
                    other => other.as_text(),
                })
                .map(str::to_string)
                .collect(),
            other => other.as_text().map(|name| vec![name.to_string()]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// `id`, `default`, `db.VarChar`, ...
    pub name: String,
    pub args: Vec<Arg>,
}

impl Attribute {
    /// Named argument, or the first positional one when `name` is absent.
    pub fn arg(&self, name: &str) -> Option<&Expr> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| &arg.value)
    }

    pub fn positional(&self, position: usize) -> Option<&Expr> {
        self.args
            .iter()
            .filter(|arg| arg.name.is_none())
            .nth(position)
            .map(|arg| &arg.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: String,
    pub optional: bool,
    pub list: bool,
    pub attributes: Vec<Attribute>,
    pub doc: Option<String>,
}

impl Field {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
    pub attributes: Vec<Attribute>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumBlock {
    pub name: String,
    pub values: Vec<(String, Option<String>)>,
    pub attributes: Vec<Attribute>,
    pub doc: Option<String>,
}

#[derive(Debug, Default)]
pub struct Document {
    pub models: Vec<Model>,
    pub enums: Vec<EnumBlock>,
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

    fn unexpected(&self, expected: &str) -> ProcessError {
        ProcessError::UnexpectedToken(format!("expected {expected}, found {:?}", self.current()))
    }

    fn skip_newlines(&mut self) {
        while self.current() == &Token::Newline {
            self.advance();
        }
    }

    /// Skip to the matching `}` of a block whose `{` was already consumed.
    fn skip_block(&mut self) {
        let mut depth = 1usize;
        loop {
            match self.current() {
                Token::Eof => return,
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    depth -= 1;
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

    fn skip_line(&mut self) {
        while !matches!(self.current(), Token::Newline | Token::Eof | Token::RBrace) {
            self.advance();
        }
    }

    pub fn parse_document(&mut self) -> (Document, Vec<ProcessError>) {
        let mut document = Document::default();
        let mut errors = Vec::new();
        let mut doc: Option<String> = None;

        loop {
            self.skip_newlines();
            let keyword = match self.current() {
                Token::Eof => break,
                Token::DocComment(text) => {
                    append_doc(&mut doc, text);
                    self.advance();
                    continue;
                }
                Token::Ident(keyword) => keyword.clone(),
                _ => {
                    errors.push(self.unexpected("block"));
                    self.skip_line();
                    self.advance();
                    continue;
                }
            };
            self.advance();

            let name = match self.identifier() {
                Ok(name) => name,
                Err(err) => {
                    errors.push(err);
                    self.skip_line();
                    continue;
                }
            };
            if let Err(err) = self.expect(&Token::LBrace) {
                errors.push(err);
                self.skip_line();
                continue;
            }

            let block_doc = doc.take();
            match keyword.as_str() {
                "model" => {
                    let model = self.model_body(name, block_doc, &mut errors);
                    document.models.push(model);
                }
                "enum" => {
                    let block = self.enum_body(name, block_doc, &mut errors);
                    document.enums.push(block);
                }
                "datasource" | "generator" => self.skip_block(),
                other => {
                    errors.push(ProcessError::UnsupportedToken(format!("{other} {name}")));
                    self.skip_block();
                }
            }
        }

        (document, errors)
    }

    fn model_body(
        &mut self,
        name: String,
        doc: Option<String>,
        errors: &mut Vec<ProcessError>,
    ) -> Model {
        let mut model = Model {
            name,
            fields: Vec::new(),
            attributes: Vec::new(),
            doc,
        };
        let mut field_doc: Option<String> = None;

        loop {
            self.skip_newlines();
            match self.current() {
                Token::Eof => break,
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::DocComment(text) => {
                    append_doc(&mut field_doc, text);
                    self.advance();
                }
                Token::AtAt => {
                    self.advance();
                    match self.attribute() {
                        Ok(attribute) => model.attributes.push(attribute),
                        Err(err) => {
                            errors.push(err);
                            self.skip_line();
                        }
                    }
                }
                _ => match self.field(field_doc.take()) {
                    Ok(field) => model.fields.push(field),
                    Err(err) => {
                        errors.push(err);
                        self.skip_line();
                    }
                },
            }
        }

        model
    }

    fn field(&mut self, doc: Option<String>) -> Result<Field> {
        let name = self.identifier()?;
        let field_type = self.identifier()?;
        if self.current() == &Token::LParen {
            // Unsupported("...")
            self.arguments()?;
        }

        let mut optional = false;
        let mut list = false;
        if self.eat(&Token::Question) {
            optional = true;
        } else if self.eat(&Token::LBracket) {
            self.expect(&Token::RBracket)?;
            list = true;
        }

        let mut attributes = Vec::new();
        while self.eat(&Token::At) {
            attributes.push(self.attribute()?);
        }
        if !matches!(self.current(), Token::Newline | Token::Eof | Token::RBrace) {
            return Err(self.unexpected("end of field"));
        }

        Ok(Field {
            name,
            field_type,
            optional,
            list,
            attributes,
            doc,
        })
    }

    fn enum_body(
        &mut self,
        name: String,
        doc: Option<String>,
        errors: &mut Vec<ProcessError>,
    ) -> EnumBlock {
        let mut block = EnumBlock {
            name,
            values: Vec::new(),
            attributes: Vec::new(),
            doc,
        };

        loop {
            self.skip_newlines();
            match self.current() {
                Token::Eof => break,
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::DocComment(_) => self.advance(),
                Token::AtAt => {
                    self.advance();
                    match self.attribute() {
                        Ok(attribute) => block.attributes.push(attribute),
                        Err(err) => {
                            errors.push(err);
                            self.skip_line();
                        }
                    }
                }
                Token::Ident(value) => {
                    let value = value.clone();
                    self.advance();
                    let mut mapped = None;
                    while self.eat(&Token::At) {
                        match self.attribute() {
                            Ok(attribute) if attribute.name == "map" => {
                                mapped = attribute
                                    .positional(0)
                                    .and_then(Expr::as_text)
                                    .map(str::to_string);
                            }
                            Ok(_) => {}
                            Err(err) => {
                                errors.push(err);
                                self.skip_line();
                            }
                        }
                    }
                    block.values.push((value, mapped));
                }
                _ => {
                    errors.push(self.unexpected("enum value"));
                    self.skip_line();
                }
            }
        }

        block
    }

    /// Attribute after its `@`/`@@`: a dotted name with optional arguments.
    fn attribute(&mut self) -> Result<Attribute> {
        let mut name = self.identifier()?;
        while self.eat(&Token::Dot) {
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        let args = if self.current() == &Token::LParen {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Attribute { name, args })
    }

    fn arguments(&mut self) -> Result<Vec<Arg>> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&Token::RParen) {
                break;
            }
            let name = match (self.current(), self.tokens.get(self.pos + 1)) {
                (Token::Ident(key), Some(Token::Colon)) => {
                    let key = key.clone();
                    self.advance();
                    self.advance();
                    Some(key)
                }
                _ => None,
            };
            let value = self.expr()?;
            args.push(Arg { name, value });
            self.skip_newlines();
            if !self.eat(&Token::Comma) {
                self.skip_newlines();
                self.expect(&Token::RParen)?;
                break;
            }
        }
        Ok(args)
    }

    fn expr(&mut self) -> Result<Expr> {
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
            Token::LBracket => {
                self.advance();
                let mut items = Vec::new();
                loop {
                    self.skip_newlines();
                    if self.eat(&Token::RBracket) {
                        break;
                    }
                    items.push(self.expr()?);
                    self.skip_newlines();
                    if !self.eat(&Token::Comma) {
                        self.skip_newlines();
                        self.expect(&Token::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::Array(items))
            }
            Token::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "true" => return Ok(Expr::Bool(true)),
                    "false" => return Ok(Expr::Bool(false)),
                    _ => {}
                }
                let mut name = name;
                while self.eat(&Token::Dot) {
                    name.push('.');
                    name.push_str(&self.identifier()?);
                }
                if self.current() == &Token::LParen {
                    let args = self.arguments()?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn append_doc(doc: &mut Option<String>, text: &str) {
    match doc {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *doc = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prisma::lexer::Lexer;

    #[test]
    fn parses_models_and_enums() {
        let source = r#"
/// Blog posts
model Post {
  id       Int     @id @default(autoincrement())
  /// Shown in lists
  title    String  @db.VarChar(200)
  author   User    @relation(fields: [authorId], references: [id], onDelete: Cascade)
  authorId Int
  tags     String[]

  @@index([authorId, title(sort: Desc)], map: "post_author_idx")
}

enum Role {
  USER
  ADMIN @map("admin")
  @@map("role")
}
"#;
        let (document, errors) = Parser::new(Lexer::new(source).tokenize()).parse_document();
        assert!(errors.is_empty(), "{errors:?}");

        let post = &document.models[0];
        assert_eq!(post.doc.as_deref(), Some("Blog posts"));
        assert_eq!(post.fields.len(), 5);
        assert_eq!(post.fields[1].doc.as_deref(), Some("Shown in lists"));
        assert!(post.fields[4].list);

        let relation = post.fields[2].attribute("relation").unwrap();
        assert_eq!(relation.arg("fields").unwrap().names(), vec!["authorId"]);
        assert_eq!(relation.arg("onDelete"), Some(&Expr::Ident("Cascade".to_string())));

        let index = &post.attributes[0];
        assert_eq!(index.positional(0).unwrap().names(), vec!["authorId", "title"]);

        let role = &document.enums[0];
        assert_eq!(
            role.values,
            vec![("USER".to_string(), None), ("ADMIN".to_string(), Some("admin".to_string()))]
        );
        assert_eq!(role.attributes[0].name, "map");
    }
}
