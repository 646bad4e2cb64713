//! Command parser
//!
//! Statements are recognized by their leading keyword and matched position by
//! position against a small table of expected shapes. There is no general
//! grammar: a token that does not fit its slot aborts the statement.

use super::ast::*;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::catalog::{Column, ColumnType, StructureKind};
use crate::error::{Error, Result};

const CREATE_USAGE: &str = "CREATE TABLE <name> [TYPE] (<col> <type>, ...) [USING <TYPE>]";
const INSERT_USAGE: &str = "INSERT INTO <table> VALUES (<v1>, <v2>, ...)";
const SELECT_USAGE: &str =
    "SELECT * FROM <table> [WHERE <col> <op> <value> | WHERE ID <id> USING BFS|DFS]";
const UPDATE_USAGE: &str = "UPDATE <table> SET <col> <value> WHERE ID <id>";
const DELETE_USAGE: &str = "DELETE FROM <table> WHERE ID <id>";

/// One expected token position in a statement shape
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Identifier equal to the keyword, ignoring case
    Keyword(&'static str),
    /// Exact symbol
    Symbol(&'static str),
    /// Identifier (table, column, type or structure name)
    Name,
    /// Number, string literal or bare word
    Value,
    /// One of `=`, `<`, `>`, `<=`, `>=`
    Operator,
}

impl Slot {
    fn accepts(&self, token: &Token) -> bool {
        match self {
            Slot::Keyword(keyword) => token.is_keyword(keyword),
            Slot::Symbol(symbol) => token.is_symbol(symbol),
            Slot::Name => token.kind == TokenKind::Identifier,
            Slot::Value => token.is_value(),
            Slot::Operator => {
                token.kind == TokenKind::Symbol && CompareOp::from_symbol(&token.text).is_some()
            }
        }
    }

    /// Keywords and symbols are fixed; the rest carry statement data
    fn captures(&self) -> bool {
        matches!(self, Slot::Name | Slot::Value | Slot::Operator)
    }

    fn describe(&self) -> String {
        match self {
            Slot::Keyword(keyword) => keyword.to_string(),
            Slot::Symbol(symbol) => format!("'{}'", symbol),
            Slot::Name => "a name".to_string(),
            Slot::Value => "a value".to_string(),
            Slot::Operator => "a comparison operator (=, <, >, <=, >=)".to_string(),
        }
    }
}

const CREATE_PREFIX: &[Slot] = &[Slot::Keyword("CREATE"), Slot::Keyword("TABLE"), Slot::Name];

const INSERT_PREFIX: &[Slot] = &[
    Slot::Keyword("INSERT"),
    Slot::Keyword("INTO"),
    Slot::Name,
    Slot::Keyword("VALUES"),
    Slot::Symbol("("),
];

const SELECT_SHAPE: &[Slot] = &[
    Slot::Keyword("SELECT"),
    Slot::Symbol("*"),
    Slot::Keyword("FROM"),
    Slot::Name,
];

const WHERE_SHAPE: &[Slot] = &[Slot::Keyword("WHERE"), Slot::Name, Slot::Operator, Slot::Value];

const LOOKUP_SHAPE: &[Slot] = &[
    Slot::Keyword("WHERE"),
    Slot::Keyword("ID"),
    Slot::Value,
    Slot::Keyword("USING"),
    Slot::Name,
];

const UPDATE_SHAPE: &[Slot] = &[
    Slot::Keyword("UPDATE"),
    Slot::Name,
    Slot::Keyword("SET"),
    Slot::Name,
    Slot::Value,
    Slot::Keyword("WHERE"),
    Slot::Keyword("ID"),
    Slot::Value,
];

const DELETE_SHAPE: &[Slot] = &[
    Slot::Keyword("DELETE"),
    Slot::Keyword("FROM"),
    Slot::Name,
    Slot::Keyword("WHERE"),
    Slot::Keyword("ID"),
    Slot::Value,
];

/// Command parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a command string
    pub fn new(command: &str) -> Self {
        let mut tokens = Lexer::new(command).tokenize();

        // A single statement terminator is allowed before the end marker
        let len = tokens.len();
        if len >= 2 && tokens[len - 2].is_symbol(";") {
            tokens.remove(len - 2);
        }

        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the command as one statement
    pub fn parse(&mut self) -> Result<Statement> {
        let first = self.current().clone();
        if first.is_end() {
            return Err(Error::Syntax("empty command".to_string()));
        }
        if first.kind != TokenKind::Identifier {
            return Err(Error::UnknownCommand(first.text));
        }

        match first.text.to_ascii_uppercase().as_str() {
            "CREATE" => self.parse_create_table().map(Statement::CreateTable),
            "INSERT" => self.parse_insert().map(Statement::Insert),
            "SELECT" => self.parse_select().map(Statement::Select),
            "UPDATE" => self.parse_update().map(Statement::Update),
            "DELETE" => self.parse_delete().map(Statement::Delete),
            "UNDO" => self.parse_bare("UNDO").map(|_| Statement::Undo),
            "REDO" => self.parse_bare("REDO").map(|_| Statement::Redo),
            "GRAPH" => Err(Error::Unsupported("GRAPH".to_string())),
            _ => Err(Error::UnknownCommand(first.text)),
        }
    }

    // ========== CREATE TABLE ==========

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        let captured = self.expect_shape(CREATE_PREFIX, CREATE_USAGE)?;
        let name = captured[0].text.clone();

        let mut structure = StructureKind::Heap;
        if !self.current().is_symbol("(") {
            let label = self.expect(Slot::Name, CREATE_USAGE)?;
            structure = parse_structure(&label)?;
        }

        self.expect(Slot::Symbol("("), CREATE_USAGE)?;
        let mut columns = Vec::new();
        if !self.current().is_symbol(")") {
            loop {
                columns.push(self.parse_column_def()?);
                if self.current().is_symbol(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Slot::Symbol(")"), CREATE_USAGE)?;

        if self.current().is_keyword("USING") {
            self.advance();
            let label = self.expect(Slot::Name, CREATE_USAGE)?;
            structure = parse_structure(&label)?;
        }
        self.expect_end(CREATE_USAGE)?;

        Ok(CreateTableStatement {
            name,
            columns,
            structure,
        })
    }

    fn parse_column_def(&mut self) -> Result<Column> {
        let name = self.expect(Slot::Name, CREATE_USAGE)?.text;
        let type_token = self.expect(Slot::Name, CREATE_USAGE)?;
        let column_type = ColumnType::parse(&type_token.text).ok_or_else(|| {
            Error::InvalidColumnType(format!(
                "unknown type '{}' for column '{}' (expected INT, FLOAT or STRING)",
                type_token.text, name
            ))
        })?;
        Ok(Column::new(name, column_type))
    }

    // ========== INSERT ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        let captured = self.expect_shape(INSERT_PREFIX, INSERT_USAGE)?;
        let table = captured[0].text.clone();

        let mut values = Vec::new();
        if !self.current().is_symbol(")") {
            loop {
                values.push(self.expect(Slot::Value, INSERT_USAGE)?.text);
                if self.current().is_symbol(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Slot::Symbol(")"), INSERT_USAGE)?;
        self.expect_end(INSERT_USAGE)?;

        Ok(InsertStatement { table, values })
    }

    // ========== SELECT ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        let captured = self.expect_shape(SELECT_SHAPE, SELECT_USAGE)?;
        let table = captured[0].text.clone();

        let mut stmt = SelectStatement {
            table,
            filter: None,
            lookup: None,
        };
        if self.current().is_end() {
            return Ok(stmt);
        }

        if self.peek(1).is_keyword("ID") && self.peek(3).is_keyword("USING") {
            let captured = self.expect_shape(LOOKUP_SHAPE, SELECT_USAGE)?;
            self.expect_end(SELECT_USAGE)?;
            let order = SearchOrder::parse(&captured[1].text).ok_or_else(|| {
                Error::Syntax(format!(
                    "unknown search order {} (expected BFS or DFS)",
                    captured[1]
                ))
            })?;
            stmt.lookup = Some(IdLookup {
                id: parse_id(&captured[0])?,
                order,
            });
            return Ok(stmt);
        }

        let captured = self.expect_shape(WHERE_SHAPE, SELECT_USAGE)?;
        self.expect_end(SELECT_USAGE)?;
        let op = CompareOp::from_symbol(&captured[1].text)
            .ok_or_else(|| Error::Syntax(format!("unsupported operator {}", captured[1])))?;
        stmt.filter = Some(Condition {
            column: captured[0].text.clone(),
            op,
            value: captured[2].text.clone(),
        });
        Ok(stmt)
    }

    // ========== UPDATE / DELETE ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        let captured = self.expect_shape(UPDATE_SHAPE, UPDATE_USAGE)?;
        self.expect_end(UPDATE_USAGE)?;
        Ok(UpdateStatement {
            table: captured[0].text.clone(),
            column: captured[1].text.clone(),
            value: captured[2].text.clone(),
            id: parse_id(&captured[3])?,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        let captured = self.expect_shape(DELETE_SHAPE, DELETE_USAGE)?;
        self.expect_end(DELETE_USAGE)?;
        Ok(DeleteStatement {
            table: captured[0].text.clone(),
            id: parse_id(&captured[1])?,
        })
    }

    fn parse_bare(&mut self, keyword: &'static str) -> Result<()> {
        self.expect(Slot::Keyword(keyword), keyword)?;
        self.expect_end(keyword)
    }

    // ========== Helper Methods ==========

    fn current(&self) -> &Token {
        // the end marker is never consumed, so the index stays in range
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Token `offset` places ahead, or the end marker
    fn peek(&self, offset: usize) -> &Token {
        &self.tokens[(self.position + offset).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if !self.current().is_end() {
            self.position += 1;
        }
    }

    /// Consume one token that must fit `slot`
    fn expect(&mut self, slot: Slot, usage: &str) -> Result<Token> {
        let token = self.current().clone();
        if slot.accepts(&token) {
            self.advance();
            Ok(token)
        } else {
            Err(Error::Syntax(format!(
                "expected {} at position {}, found {}. Usage: {}",
                slot.describe(),
                self.position,
                token,
                usage
            )))
        }
    }

    /// Consume a run of slots, returning the tokens of the data-carrying ones
    fn expect_shape(&mut self, shape: &[Slot], usage: &str) -> Result<Vec<Token>> {
        let mut captured = Vec::new();
        for slot in shape {
            let token = self.expect(*slot, usage)?;
            if slot.captures() {
                captured.push(token);
            }
        }
        Ok(captured)
    }

    fn expect_end(&self, usage: &str) -> Result<()> {
        let token = self.current();
        if token.is_end() {
            Ok(())
        } else {
            Err(Error::Syntax(format!(
                "unexpected {} at position {}. Usage: {}",
                token, self.position, usage
            )))
        }
    }
}

/// Parse a command string into a statement
pub fn parse(command: &str) -> Result<Statement> {
    Parser::new(command).parse()
}

fn parse_structure(token: &Token) -> Result<StructureKind> {
    StructureKind::parse(&token.text).ok_or_else(|| {
        Error::Syntax(format!(
            "unknown structure type {} (expected HEAP, AVL, BST or HASH)",
            token
        ))
    })
}

fn parse_id(token: &Token) -> Result<i32> {
    token.text.parse::<i32>().map_err(|_| Error::TypeMismatch {
        column: "ID".to_string(),
        expected: ColumnType::Int.to_string(),
        value: token.text.clone(),
    })
}
