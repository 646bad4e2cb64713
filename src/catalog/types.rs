//! Data types for ChronoDB
//!
//! This module defines the column types and table structure labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// 32-bit signed integer
    #[serde(rename = "INT")]
    Int,
    /// Single-precision floating point
    #[serde(rename = "FLOAT")]
    Float,
    /// UTF-8 string
    #[serde(rename = "STRING")]
    String,
}

impl ColumnType {
    /// Parse a type name (case-insensitive)
    pub fn parse(name: &str) -> Option<ColumnType> {
        match name.to_uppercase().as_str() {
            "INT" => Some(ColumnType::Int),
            "FLOAT" => Some(ColumnType::Float),
            "STRING" => Some(ColumnType::String),
            _ => None,
        }
    }

    /// Tag name as written in commands and meta files
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::String => "STRING",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structure label a table was declared with.
///
/// Only a label: every table is stored as a heap of slotted pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StructureKind {
    #[default]
    Heap,
    Avl,
    Bst,
    Hash,
}

impl StructureKind {
    /// Parse a structure label (case-insensitive)
    pub fn parse(name: &str) -> Option<StructureKind> {
        match name.to_uppercase().as_str() {
            "HEAP" => Some(StructureKind::Heap),
            "AVL" => Some(StructureKind::Avl),
            "BST" => Some(StructureKind::Bst),
            "HASH" => Some(StructureKind::Hash),
            _ => None,
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureKind::Heap => write!(f, "HEAP"),
            StructureKind::Avl => write!(f, "AVL"),
            StructureKind::Bst => write!(f, "BST"),
            StructureKind::Hash => write!(f, "HASH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parsing() {
        assert_eq!(ColumnType::parse("int"), Some(ColumnType::Int));
        assert_eq!(ColumnType::parse("Float"), Some(ColumnType::Float));
        assert_eq!(ColumnType::parse("STRING"), Some(ColumnType::String));
        assert_eq!(ColumnType::parse("VARCHAR"), None);
    }

    #[test]
    fn test_type_serde_tags() {
        let json = serde_json::to_string(&ColumnType::Float).unwrap();
        assert_eq!(json, "\"FLOAT\"");
        let kind: StructureKind = serde_json::from_str("\"AVL\"").unwrap();
        assert_eq!(kind, StructureKind::Avl);
    }

    #[test]
    fn test_structure_parsing() {
        assert_eq!(StructureKind::parse("bst"), Some(StructureKind::Bst));
        assert_eq!(StructureKind::parse("btree"), None);
        assert_eq!(StructureKind::default(), StructureKind::Heap);
    }
}
