//! Error types for ChronoDB
//!
//! This module defines all error types used throughout the store. Every
//! variant renders as a tagged, human readable message so the command loop
//! can report it and move on to the next statement.

use thiserror::Error;

/// The main error type for ChronoDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Parser Errors ==========
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Syntax error: unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Syntax error: {0} is not supported by the relational engine")]
    Unsupported(String),

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Catalog error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Catalog error: column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Catalog error: invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("Catalog error: invalid column definition - {0}")]
    InvalidColumnType(String),

    // ========== Type Errors ==========
    #[error("Type error: cannot convert '{value}' to {expected} for column '{column}'")]
    TypeMismatch {
        column: String,
        expected: String,
        value: String,
    },

    #[error("Type error: expected {expected} values, got {found}")]
    ArityMismatch { expected: usize, found: usize },

    // ========== Execution Errors ==========
    #[error("Execution error: ID {id} already exists in table '{table}'")]
    DuplicateId { table: String, id: i32 },

    #[error("Execution error: ID {id} not found in table '{table}'")]
    RecordNotFound { table: String, id: i32 },

    // ========== History Errors ==========
    #[error("History error: nothing to undo")]
    EmptyUndo,

    #[error("History error: nothing to redo")]
    EmptyRedo,

    // ========== Storage Errors ==========
    #[error("Storage error: record of {0} bytes does not fit in an empty page")]
    RecordTooLarge(usize),

    #[error("Storage error: corrupted page {page_id} - {reason}")]
    CorruptedPage { page_id: u32, reason: String },

    #[error("Storage error: corrupted record - {0}")]
    CorruptedRecord(String),

    #[error("Storage error: slot {slot} of page {page_id} in table '{table}' is not in the expected state")]
    SlotState {
        table: String,
        page_id: u32,
        slot: u16,
    },

    #[error("Storage error: schema metadata - {0}")]
    Metadata(#[from] serde_json::Error),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ChronoDB operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("students".to_string());
        assert_eq!(err.to_string(), "Catalog error: table 'students' not found");

        let err = Error::ArityMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "Type error: expected 3 values, got 2");

        let err = Error::TypeMismatch {
            column: "gpa".to_string(),
            expected: "FLOAT".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Type error: cannot convert 'abc' to FLOAT for column 'gpa'"
        );
    }

    #[test]
    fn test_history_errors() {
        assert_eq!(Error::EmptyUndo.to_string(), "History error: nothing to undo");
        assert_eq!(Error::EmptyRedo.to_string(), "History error: nothing to redo");
    }
}
