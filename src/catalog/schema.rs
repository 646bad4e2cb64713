//! Schema definitions for ChronoDB
//!
//! This module defines table schemas and column metadata. A schema is what
//! gets persisted in a table's `.meta` file.

use super::types::{ColumnType, StructureKind};
use serde::{Deserialize, Serialize};

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Table schema - ordered columns plus the primary-key name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Ordered list of columns
    pub columns: Vec<Column>,
    /// Name of the identity column (empty for schema-less tables)
    #[serde(default)]
    pub primary_key: String,
    /// Declared structure label
    #[serde(default)]
    pub structure: StructureKind,
}

impl TableSchema {
    /// Build a schema whose primary key is the first column
    pub fn new(columns: Vec<Column>) -> Self {
        let primary_key = columns
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Self {
            columns,
            primary_key,
            structure: StructureKind::Heap,
        }
    }

    /// Set the structure label
    pub fn with_structure(mut self, structure: StructureKind) -> Self {
        self.structure = structure;
        self
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn students() -> TableSchema {
        TableSchema::new(vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::String),
            Column::new("gpa", ColumnType::Float),
        ])
    }

    #[test]
    fn test_schema_creation() {
        let schema = students();
        assert_eq!(schema.column_count(), 3);
        assert_eq!(schema.primary_key, "id");
        assert_eq!(schema.structure, StructureKind::Heap);
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let schema = students();
        assert_eq!(schema.column_index("GPA"), Some(2));
        assert_eq!(schema.column_index("Name"), Some(1));
        assert_eq!(schema.column_index("email"), None);
    }

    #[test]
    fn test_meta_json_layout() {
        let schema = students().with_structure(StructureKind::Hash);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["columns"][0]["name"], "id");
        assert_eq!(json["columns"][0]["type"], "INT");
        assert_eq!(json["primary_key"], "id");
        assert_eq!(json["structure"], "HASH");
    }

    #[test]
    fn test_missing_structure_defaults_to_heap() {
        let json = r#"{"columns":[{"name":"id","type":"INT"}],"primary_key":"id"}"#;
        let schema: TableSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.structure, StructureKind::Heap);
        assert_eq!(schema.column_count(), 1);
    }
}
