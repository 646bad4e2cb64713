//! ChronoDB - an embedded relational store driven by a small command language
//!
//! This library provides the core components:
//! - Command language (lexer, positional parser)
//! - Storage engine (slotted pages, heap files, schema persistence)
//! - Statement execution (range filtering, undo/redo history)
//! - Table schemas and configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use executor::{Executor, QueryResult};
