//! Statement execution module
//!
//! This module contains the executor, the undo/redo history and the
//! sort-assisted range filter.

pub mod executor;
pub mod history;
pub mod sorting;

pub use executor::{Executor, QueryResult};
pub use history::{Action, History, RowImage};
