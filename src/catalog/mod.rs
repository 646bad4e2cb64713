//! Catalog module
//!
//! This module contains schema definitions and column types.

pub mod schema;
pub mod types;

pub use schema::{Column, TableSchema};
pub use types::{ColumnType, StructureKind};
