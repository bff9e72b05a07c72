//! Statement-level interpretation of PostgreSQL DDL.

use schemaforge_core::{
    CheckConstraint, Column, Constraint, DefaultValue, EnumType, Extension, ForeignKeyAction,
    ForeignKeyConstraint, Index, PrimaryKeyConstraint, Schema, Table, UniqueConstraint,
};

use crate::error::{ProcessError, Result};
use crate::postgres::cursor::{Cursor, split_commas, split_statements};
use crate::postgres::lexer::{Lexer, Token, render};
use crate::result::ProcessResult;

/// Words that end a column's type and start one of its constraint clauses.
const COLUMN_CLAUSES: &[&str] = &[
    "NOT", "NULL", "DEFAULT", "PRIMARY", "UNIQUE", "REFERENCES", "CHECK", "CONSTRAINT",
    "COLLATE", "GENERATED",
];

/// Statements that carry no schema information.
const IGNORED_STATEMENTS: &[&str] = &[
    "SET", "SELECT", "BEGIN", "COMMIT", "START", "GRANT", "REVOKE", "DROP", "ANALYZE",
];

/// Parse a PostgreSQL DDL script.
pub fn process(source: &str) -> ProcessResult {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = DdlParser::default();

    for statement in split_statements(&tokens) {
        if let Err(err) = parser.statement(statement) {
            parser.errors.push(err);
        }
    }

    ProcessResult::new(parser.schema, parser.errors)
}

#[derive(Default)]
struct DdlParser {
    schema: Schema,
    errors: Vec<ProcessError>,
}

/// A table-level constraint before it is attached to its table.
enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKey {
        columns: Vec<String>,
        target_table: String,
        /// `None` when the reference names only the table, meaning its primary key.
        target_columns: Option<Vec<String>>,
        on_update: ForeignKeyAction,
        on_delete: ForeignKeyAction,
    },
    Check(String),
}

impl DdlParser {
    fn statement(&mut self, tokens: &[Token]) -> Result<()> {
        let mut cursor = Cursor::new(tokens);

        if IGNORED_STATEMENTS.iter().any(|keyword| cursor.is_keyword(keyword)) {
            return Ok(());
        }

        if cursor.eat_keyword("CREATE") {
            cursor.eat_keywords(&["OR", "REPLACE"]);
            for modifier in ["UNLOGGED", "TEMP", "TEMPORARY"] {
                cursor.eat_keyword(modifier);
            }

            if cursor.eat_keyword("TABLE") {
                return self.create_table(&mut cursor);
            }
            if cursor.is_keyword("UNIQUE") || cursor.is_keyword("INDEX") {
                return self.create_index(&mut cursor);
            }
            if cursor.eat_keyword("TYPE") {
                return self.create_type(&mut cursor);
            }
            if cursor.eat_keyword("EXTENSION") {
                cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);
                let name = cursor.identifier()?;
                self.schema
                    .extensions
                    .insert(name.clone(), Extension { name });
                return Ok(());
            }
            if ["SEQUENCE", "SCHEMA", "FUNCTION", "TRIGGER", "VIEW"]
                .iter()
                .any(|keyword| cursor.is_keyword(keyword))
            {
                return Ok(());
            }
        } else if cursor.eat_keyword("ALTER") {
            if cursor.eat_keyword("TABLE") {
                return self.alter_table(&mut cursor);
            }
            if cursor.is_keyword("SEQUENCE") {
                return Ok(());
            }
        } else if cursor.eat_keywords(&["COMMENT", "ON"]) {
            return self.comment_on(&mut cursor);
        }

        Err(ProcessError::UnsupportedToken(statement_head(tokens)))
    }

    fn create_table(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);
        let table_name = cursor.qualified_name()?;
        let body = cursor.group()?;

        let mut table = Table::new(table_name.as_str());
        let mut pending = Vec::new();

        for element in split_commas(body) {
            let mut element_cursor = Cursor::new(element);
            let outcome = if is_table_constraint_start(&element_cursor) {
                table_constraint(&mut element_cursor).map(|constraint| pending.push(constraint))
            } else if element_cursor.is_keyword("LIKE") || element_cursor.is_keyword("EXCLUDE") {
                Err(ProcessError::UnsupportedToken(statement_head(element)))
            } else {
                column_definition(&mut element_cursor, &table_name).map(|(column, inline)| {
                    table.insert_column(column);
                    pending.extend(inline);
                })
            };
            if let Err(err) = outcome {
                self.errors.push(err);
            }
        }

        self.schema.insert_table(table);
        for (name, constraint) in pending {
            self.attach_constraint(&table_name, name, constraint)?;
        }
        Ok(())
    }

    fn create_index(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        let unique = cursor.eat_keyword("UNIQUE");
        cursor.expect_keyword("INDEX")?;
        cursor.eat_keyword("CONCURRENTLY");
        cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);

        let explicit_name = if cursor.is_keyword("ON") {
            None
        } else {
            Some(cursor.qualified_name()?)
        };
        cursor.expect_keyword("ON")?;
        cursor.eat_keyword("ONLY");
        let table_name = cursor.qualified_name()?;

        let index_type = if cursor.eat_keyword("USING") {
            cursor.identifier()?.to_ascii_lowercase()
        } else {
            String::new()
        };

        let columns: Vec<String> = split_commas(cursor.group()?)
            .into_iter()
            .map(index_column)
            .collect();

        let name = explicit_name
            .unwrap_or_else(|| format!("{table_name}_{}_idx", columns.join("_")));
        let table = self.table_mut(&table_name)?;
        let mut index = Index::new(name, columns, unique);
        index.index_type = index_type;
        table.insert_index(index);
        Ok(())
    }

    fn create_type(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        let name = cursor.qualified_name()?;
        if !cursor.eat_keywords(&["AS", "ENUM"]) {
            return Err(ProcessError::UnsupportedToken(format!(
                "CREATE TYPE {name} (only enum types are supported)"
            )));
        }

        let values = split_commas(cursor.group()?)
            .into_iter()
            .map(|value| match value {
                [Token::Str(label)] => Ok(label.clone()),
                other => Err(ProcessError::UnexpectedToken(format!(
                    "enum label must be a string literal, found {}",
                    render(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        self.schema.insert_enum(EnumType::new(name, values));
        Ok(())
    }

    fn alter_table(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        cursor.eat_keywords(&["IF", "EXISTS"]);
        cursor.eat_keyword("ONLY");
        let table_name = cursor.qualified_name()?;

        for action in split_commas(cursor.rest()) {
            let mut action_cursor = Cursor::new(action);
            if let Err(err) = self.alter_action(&table_name, &mut action_cursor) {
                self.errors.push(err);
            }
        }
        Ok(())
    }

    fn alter_action(&mut self, table_name: &str, cursor: &mut Cursor<'_>) -> Result<()> {
        if cursor.eat_keyword("ADD") {
            if is_table_constraint_start(cursor) {
                let (name, constraint) = table_constraint(cursor)?;
                return self.attach_constraint(table_name, name, constraint);
            }
            cursor.eat_keyword("COLUMN");
            cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);
            let (column, inline) = column_definition(cursor, table_name)?;
            self.table_mut(table_name)?.insert_column(column);
            for (name, constraint) in inline {
                self.attach_constraint(table_name, name, constraint)?;
            }
            return Ok(());
        }

        if cursor.eat_keyword("ALTER") {
            cursor.eat_keyword("COLUMN");
            let column_name = cursor.identifier()?;
            let column = self
                .table_mut(table_name)?
                .columns
                .get_mut(&column_name)
                .ok_or_else(|| {
                    ProcessError::InvalidSchema(format!(
                        "column not found: {table_name}.{column_name}"
                    ))
                })?;

            if cursor.eat_keywords(&["SET", "DEFAULT"]) {
                column.default = default_value(cursor.take_until(|_| false));
            } else if cursor.eat_keywords(&["DROP", "DEFAULT"]) {
                column.default = None;
            } else if cursor.eat_keywords(&["SET", "NOT", "NULL"]) {
                column.not_null = true;
            } else if cursor.eat_keywords(&["DROP", "NOT", "NULL"]) {
                column.not_null = false;
            } else if cursor.eat_keywords(&["SET", "DATA", "TYPE"]) || cursor.eat_keyword("TYPE") {
                column.data_type = type_text(cursor.take_until(|token| token.is_keyword("USING")));
            } else {
                return Err(ProcessError::UnsupportedToken(statement_head(cursor.rest())));
            }
            return Ok(());
        }

        if cursor.is_keyword("OWNER")
            || cursor.is_keyword("ENABLE")
            || cursor.is_keyword("DISABLE")
        {
            return Ok(());
        }

        Err(ProcessError::UnsupportedToken(format!(
            "ALTER TABLE {table_name} {}",
            statement_head(cursor.rest())
        )))
    }

    fn comment_on(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        let target = if cursor.eat_keyword("TABLE") {
            CommentTarget::Table
        } else if cursor.eat_keyword("COLUMN") {
            CommentTarget::Column
        } else if cursor.eat_keyword("TYPE") {
            CommentTarget::Type
        } else {
            return Ok(());
        };

        let parts = cursor.dotted_name()?;
        cursor.expect_keyword("IS")?;
        let comment = match cursor.current() {
            Token::Str(text) => Some(text.clone()),
            token if token.is_keyword("NULL") => None,
            _ => return Err(cursor.unexpected("comment string")),
        };

        match target {
            CommentTarget::Table => {
                let name = last_part(&parts, 0)?;
                self.table_mut(name)?.comment = comment;
            }
            CommentTarget::Column => {
                let table_name = last_part(&parts, 1)?;
                let column_name = last_part(&parts, 0)?;
                let column = self
                    .table_mut(table_name)?
                    .columns
                    .get_mut(column_name)
                    .ok_or_else(|| {
                        ProcessError::InvalidSchema(format!(
                            "column not found: {table_name}.{column_name}"
                        ))
                    })?;
                column.comment = comment;
            }
            CommentTarget::Type => {
                let name = last_part(&parts, 0)?;
                if let Some(enum_type) = self.schema.enums.get_mut(name) {
                    enum_type.comment = comment;
                }
            }
        }
        Ok(())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.schema
            .tables
            .get_mut(name)
            .ok_or_else(|| ProcessError::InvalidSchema(format!("table not found: {name}")))
    }

    /// Primary key columns of `table`, or `id` when it is not known yet.
    fn referenced_key(&self, table: &str) -> Vec<String> {
        self.schema
            .tables
            .get(table)
            .and_then(Table::primary_key_columns)
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec!["id".to_string()])
    }

    fn attach_constraint(
        &mut self,
        table_name: &str,
        name: Option<String>,
        constraint: TableConstraint,
    ) -> Result<()> {
        let referenced_key = match &constraint {
            TableConstraint::ForeignKey {
                target_table,
                target_columns: None,
                ..
            } => Some(self.referenced_key(target_table)),
            _ => None,
        };
        let table = self.table_mut(table_name)?;

        let constraint = match constraint {
            TableConstraint::PrimaryKey(columns) => {
                for column in &columns {
                    if let Some(column) = table.columns.get_mut(column) {
                        column.primary = true;
                        column.not_null = true;
                    }
                }
                Constraint::PrimaryKey(PrimaryKeyConstraint {
                    name: name.unwrap_or_else(|| format!("{table_name}_pkey")),
                    column_names: columns,
                })
            }
            TableConstraint::Unique(columns) => {
                if let [single] = columns.as_slice() {
                    if let Some(column) = table.columns.get_mut(single) {
                        column.unique = true;
                    }
                }
                Constraint::Unique(UniqueConstraint {
                    name: name.unwrap_or_else(|| format!("{table_name}_{}_key", columns.join("_"))),
                    column_names: columns,
                })
            }
            TableConstraint::ForeignKey {
                columns,
                target_table,
                target_columns,
                on_update,
                on_delete,
            } => Constraint::ForeignKey(ForeignKeyConstraint {
                name: name.unwrap_or_else(|| format!("{table_name}_{}_fkey", columns.join("_"))),
                column_names: columns,
                target_table_name: target_table,
                target_column_names: target_columns.or(referenced_key).unwrap_or_default(),
                update_constraint: on_update,
                delete_constraint: on_delete,
            }),
            TableConstraint::Check(expression) => {
                let name =
                    name.unwrap_or_else(|| unused_name(table, format!("{table_name}_check")));
                Constraint::Check(CheckConstraint {
                    name,
                    detail: format!("CHECK ({expression})"),
                })
            }
        };

        table.insert_constraint(constraint);
        Ok(())
    }
}

enum CommentTarget {
    Table,
    Column,
    Type,
}

fn is_column_clause(token: &Token) -> bool {
    COLUMN_CLAUSES.iter().any(|keyword| token.is_keyword(keyword))
}

fn is_table_constraint_start(cursor: &Cursor<'_>) -> bool {
    ["CONSTRAINT", "PRIMARY", "UNIQUE", "FOREIGN", "CHECK"]
        .iter()
        .any(|keyword| cursor.is_keyword(keyword))
}

fn table_constraint(cursor: &mut Cursor<'_>) -> Result<(Option<String>, TableConstraint)> {
    let name = if cursor.eat_keyword("CONSTRAINT") {
        Some(cursor.identifier()?)
    } else {
        None
    };

    let constraint = if cursor.eat_keywords(&["PRIMARY", "KEY"]) {
        TableConstraint::PrimaryKey(column_list(cursor)?)
    } else if cursor.eat_keyword("UNIQUE") {
        cursor.eat_keywords(&["NULLS", "NOT", "DISTINCT"]);
        TableConstraint::Unique(column_list(cursor)?)
    } else if cursor.eat_keywords(&["FOREIGN", "KEY"]) {
        let columns = column_list(cursor)?;
        let (target_table, target_columns, on_update, on_delete) = references(cursor)?;
        TableConstraint::ForeignKey {
            target_columns,
            columns,
            target_table,
            on_update,
            on_delete,
        }
    } else if cursor.eat_keyword("CHECK") {
        TableConstraint::Check(render(cursor.group()?))
    } else {
        return Err(cursor.unexpected("constraint"));
    };

    Ok((name, constraint))
}

fn column_list(cursor: &mut Cursor<'_>) -> Result<Vec<String>> {
    split_commas(cursor.group()?)
        .into_iter()
        .map(|part| {
            part.first()
                .and_then(Token::identifier)
                .map(str::to_string)
                .ok_or_else(|| {
                    ProcessError::UnexpectedToken(format!(
                        "expected column, found {}",
                        render(part)
                    ))
                })
        })
        .collect()
}

type References = (String, Option<Vec<String>>, ForeignKeyAction, ForeignKeyAction);

/// `REFERENCES table [(columns)] [ON DELETE action] [ON UPDATE action] ...`
fn references(cursor: &mut Cursor<'_>) -> Result<References> {
    cursor.expect_keyword("REFERENCES")?;
    let target_table = cursor.qualified_name()?;
    let target_columns = if cursor.current() == &Token::LParen {
        Some(column_list(cursor)?)
    } else {
        None
    };

    let mut on_update = ForeignKeyAction::NoAction;
    let mut on_delete = ForeignKeyAction::NoAction;
    loop {
        if cursor.eat_keywords(&["ON", "DELETE"]) {
            on_delete = referential_action(cursor)?;
        } else if cursor.eat_keywords(&["ON", "UPDATE"]) {
            on_update = referential_action(cursor)?;
        } else if cursor.eat_keyword("MATCH") {
            cursor.advance();
        } else if cursor.eat_keyword("DEFERRABLE") || cursor.eat_keywords(&["NOT", "DEFERRABLE"]) {
        } else if cursor.eat_keyword("INITIALLY") {
            cursor.advance();
        } else {
            break;
        }
    }

    Ok((target_table, target_columns, on_update, on_delete))
}

fn referential_action(cursor: &mut Cursor<'_>) -> Result<ForeignKeyAction> {
    let words = if cursor.is_keyword("SET") || cursor.is_keyword("NO") {
        2
    } else {
        1
    };
    let mut raw = Vec::with_capacity(words);
    for _ in 0..words {
        raw.push(cursor.identifier()?);
    }
    let raw = raw.join(" ");
    ForeignKeyAction::parse(&raw)
        .ok_or_else(|| ProcessError::UnexpectedToken(format!("unknown referential action: {raw}")))
}

type InlineConstraints = Vec<(Option<String>, TableConstraint)>;

fn column_definition(
    cursor: &mut Cursor<'_>,
    table_name: &str,
) -> Result<(Column, InlineConstraints)> {
    let name = cursor.identifier()?;
    let type_tokens = cursor.take_until(is_column_clause);
    if type_tokens.is_empty() {
        return Err(cursor.unexpected(&format!("type for column {name}")));
    }

    let mut column = Column::new(name.as_str(), type_text(type_tokens));
    let mut constraints = InlineConstraints::new();
    let mut pending_name: Option<String> = None;

    while !cursor.at_end() {
        if cursor.eat_keyword("CONSTRAINT") {
            pending_name = Some(cursor.identifier()?);
            continue;
        }

        if cursor.eat_keywords(&["NOT", "NULL"]) {
            column.not_null = true;
        } else if cursor.eat_keyword("NULL") {
            column.not_null = false;
        } else if cursor.eat_keyword("DEFAULT") {
            if cursor.eat_keyword("NULL") {
                if cursor.eat(&Token::Cast) {
                    cursor.take_until(is_column_clause);
                }
                column.default = None;
            } else {
                column.default = default_value(cursor.take_until(is_column_clause));
            }
        } else if cursor.eat_keywords(&["PRIMARY", "KEY"]) {
            column.primary = true;
            column.not_null = true;
            constraints.push((
                pending_name.take(),
                TableConstraint::PrimaryKey(vec![name.clone()]),
            ));
        } else if cursor.eat_keyword("UNIQUE") {
            column.unique = true;
            constraints.push((pending_name.take(), TableConstraint::Unique(vec![name.clone()])));
        } else if cursor.is_keyword("REFERENCES") {
            let (target_table, target_columns, on_update, on_delete) = references(cursor)?;
            constraints.push((
                pending_name.take(),
                TableConstraint::ForeignKey {
                    columns: vec![name.clone()],
                    target_table,
                    target_columns,
                    on_update,
                    on_delete,
                },
            ));
        } else if cursor.eat_keyword("CHECK") {
            let expression = render(cursor.group()?);
            column.check = Some(expression.clone());
            let check_name = pending_name
                .take()
                .unwrap_or_else(|| format!("{table_name}_{name}_check"));
            constraints.push((Some(check_name), TableConstraint::Check(expression)));
        } else if cursor.eat_keyword("COLLATE") {
            cursor.qualified_name()?;
        } else if cursor.eat_keyword("GENERATED") {
            skip_generated(cursor)?;
        } else {
            return Err(cursor.unexpected(&format!("column constraint for {name}")));
        }
    }

    Ok((column, constraints))
}

/// `GENERATED { ALWAYS | BY DEFAULT } AS { IDENTITY [(options)] | (expr) STORED }`
fn skip_generated(cursor: &mut Cursor<'_>) -> Result<()> {
    if !cursor.eat_keyword("ALWAYS") {
        cursor.expect_keyword("BY")?;
        cursor.expect_keyword("DEFAULT")?;
    }
    cursor.expect_keyword("AS")?;
    if cursor.eat_keyword("IDENTITY") {
        if cursor.current() == &Token::LParen {
            cursor.group()?;
        }
    } else {
        cursor.group()?;
        cursor.eat_keyword("STORED");
    }
    Ok(())
}

fn index_column(part: &[Token]) -> String {
    match part {
        [single] => single
            .identifier()
            .map(str::to_string)
            .unwrap_or_else(|| render(part)),
        [first, rest @ ..] if first.identifier().is_some() && rest.iter().all(is_ordering_word) => {
            first.identifier().unwrap_or_default().to_string()
        }
        _ => render(part),
    }
}

fn is_ordering_word(token: &Token) -> bool {
    ["ASC", "DESC", "NULLS", "FIRST", "LAST"]
        .iter()
        .any(|keyword| token.is_keyword(keyword))
}

/// Type name as written, without identifier quoting.
fn type_text(tokens: &[Token]) -> String {
    let unquoted: Vec<Token> = tokens
        .iter()
        .map(|token| match token {
            Token::Quoted(name) => Token::Word(name.clone()),
            other => other.clone(),
        })
        .collect();
    render(&unquoted)
}

/// Classify a DEFAULT expression.
///
/// Literals keep their JSON kind; casts on string literals are dropped;
/// anything else is kept as expression text.
pub(crate) fn default_value(tokens: &[Token]) -> Option<DefaultValue> {
    let tokens = strip_parens(tokens);
    match tokens {
        [] => None,
        [token] if token.is_keyword("NULL") => None,
        [token] if token.is_keyword("TRUE") => Some(DefaultValue::Boolean(true)),
        [token] if token.is_keyword("FALSE") => Some(DefaultValue::Boolean(false)),
        [Token::Num(number)] => Some(number_default(number, false)),
        [Token::Op(sign), Token::Num(number)] if sign == "-" => Some(number_default(number, true)),
        [Token::Str(text)] => Some(DefaultValue::text(text.as_str())),
        [Token::Str(text), Token::Cast, ..] => Some(DefaultValue::text(text.as_str())),
        [token, Token::Cast, ..] if token.is_keyword("NULL") => None,
        other => Some(DefaultValue::text(render(other))),
    }
}

fn strip_parens(tokens: &[Token]) -> &[Token] {
    let mut tokens = tokens;
    while let [Token::LParen, inner @ .., Token::RParen] = tokens {
        if !is_balanced(inner) {
            break;
        }
        tokens = inner;
    }
    tokens
}

fn is_balanced(tokens: &[Token]) -> bool {
    let mut depth = 0i32;
    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn number_default(number: &str, negative: bool) -> DefaultValue {
    let text = if negative {
        format!("-{number}")
    } else {
        number.to_string()
    };
    if let Ok(integer) = text.parse::<i64>() {
        return DefaultValue::integer(integer);
    }
    text.parse::<f64>()
        .ok()
        .and_then(DefaultValue::from_f64)
        .unwrap_or(DefaultValue::Text(text))
}

fn unused_name(table: &Table, base: String) -> String {
    if !table.constraints.contains_key(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !table.constraints.contains_key(candidate))
        .unwrap_or(base)
}

fn last_part(parts: &[String], from_end: usize) -> Result<&str> {
    parts
        .len()
        .checked_sub(from_end + 1)
        .and_then(|idx| parts.get(idx))
        .map(String::as_str)
        .ok_or_else(|| {
            ProcessError::UnexpectedToken(format!("incomplete name: {}", parts.join(".")))
        })
}

fn statement_head(tokens: &[Token]) -> String {
    let head: Vec<Token> = tokens.iter().take(4).cloned().collect();
    render(&head)
}
