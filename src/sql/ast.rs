//! Command statements
//!
//! This module defines the statements the parser recognizes. Values stay as
//! raw token text; the executor coerces them once the table schema is known.

use std::fmt;

use crate::catalog::{Column, StructureKind};

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// INSERT statement
    Insert(InsertStatement),
    /// SELECT statement
    Select(SelectStatement),
    /// UPDATE statement
    Update(UpdateStatement),
    /// DELETE statement
    Delete(DeleteStatement),
    /// UNDO
    Undo,
    /// REDO
    Redo,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: String,
    pub columns: Vec<Column>,
    /// Label given before `(` or after `USING`; HEAP when absent
    pub structure: StructureKind,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    /// One raw value per column, in schema order
    pub values: Vec<String>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub filter: Option<Condition>,
    /// `WHERE ID <id> USING BFS|DFS`; set instead of `filter`
    pub lookup: Option<IdLookup>,
}

/// Identity lookup with a named tree search order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdLookup {
    pub id: i32,
    pub order: SearchOrder,
}

/// Tree search order for identity lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Bfs,
    Dfs,
}

impl SearchOrder {
    /// Parse an order name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "BFS" => Some(SearchOrder::Bfs),
            "DFS" => Some(SearchOrder::Dfs),
            _ => None,
        }
    }
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOrder::Bfs => write!(f, "BFS"),
            SearchOrder::Dfs => write!(f, "DFS"),
        }
    }
}

/// UPDATE statement: `UPDATE t SET col value WHERE ID id`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub column: String,
    pub value: String,
    pub id: i32,
}

/// DELETE statement: `DELETE FROM t WHERE ID id`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub id: i32,
}

/// Single-column WHERE predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl CompareOp {
    /// Parse an operator symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(CompareOp::Eq),
            "<" => Some(CompareOp::Lt),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::LtEq),
            ">=" => Some(CompareOp::GtEq),
            _ => None,
        }
    }

    /// Range operators are answered by sort + binary search
    pub fn is_range(&self) -> bool {
        !matches!(self, CompareOp::Eq)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::LtEq => "<=",
            CompareOp::GtEq => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_symbols() {
        for symbol in ["=", "<", ">", "<=", ">="] {
            let op = CompareOp::from_symbol(symbol).unwrap();
            assert_eq!(op.to_string(), symbol);
        }
        assert_eq!(CompareOp::from_symbol("!="), None);
        assert!(!CompareOp::Eq.is_range());
        assert!(CompareOp::GtEq.is_range());
    }

    #[test]
    fn test_search_order_names() {
        assert_eq!(SearchOrder::parse("bfs"), Some(SearchOrder::Bfs));
        assert_eq!(SearchOrder::parse("DFS"), Some(SearchOrder::Dfs));
        assert_eq!(SearchOrder::parse("dijkstra"), None);
        assert_eq!(SearchOrder::Dfs.to_string(), "DFS");
    }
}
