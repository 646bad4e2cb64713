//! Undo/redo log
//!
//! Every successful mutating statement records one `Action` that reverses it.
//! Actions are plain data and are interpreted against the storage engine, so
//! each reversal can be tested on its own. Applying an action moves its
//! inverse to the opposite stack.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::storage::{Record, SlotId, StorageEngine};

/// A row together with the slot it lives in
#[derive(Debug, Clone, PartialEq)]
pub struct RowImage {
    pub record: Record,
    pub location: SlotId,
}

impl RowImage {
    pub fn new(record: Record, location: SlotId) -> Self {
        Self { record, location }
    }

    fn id(&self) -> i32 {
        self.record.id().unwrap_or_default()
    }
}

/// A reversible storage operation
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Tombstone a row added by INSERT
    RemoveInsertedRow { table: String, row: RowImage },
    /// Reactivate a row tombstoned by DELETE
    RestoreRow { table: String, row: RowImage },
    /// Make `restore` live again and retire `discard`
    RevertUpdate {
        table: String,
        restore: RowImage,
        discard: RowImage,
    },
    /// Reversal of CREATE TABLE; only logged, the table is kept
    ForgetCreatedTable { table: String },
}

impl Action {
    /// The action that cancels this one once it has been applied
    pub fn inverse(&self) -> Action {
        match self {
            Action::RemoveInsertedRow { table, row } => Action::RestoreRow {
                table: table.clone(),
                row: row.clone(),
            },
            Action::RestoreRow { table, row } => Action::RemoveInsertedRow {
                table: table.clone(),
                row: row.clone(),
            },
            Action::RevertUpdate {
                table,
                restore,
                discard,
            } => Action::RevertUpdate {
                table: table.clone(),
                restore: discard.clone(),
                discard: restore.clone(),
            },
            Action::ForgetCreatedTable { table } => Action::ForgetCreatedTable {
                table: table.clone(),
            },
        }
    }

    /// Table the action touches
    pub fn table(&self) -> &str {
        match self {
            Action::RemoveInsertedRow { table, .. }
            | Action::RestoreRow { table, .. }
            | Action::RevertUpdate { table, .. }
            | Action::ForgetCreatedTable { table } => table,
        }
    }

    /// Apply the action, returning a description of what changed
    pub fn apply(&self, engine: &StorageEngine) -> Result<String> {
        match self {
            Action::RemoveInsertedRow { table, row } => {
                engine.delete_at(table, row.location)?;
                Ok(format!("Removed row ID {} from '{}'", row.id(), table))
            }
            Action::RestoreRow { table, row } => {
                engine.restore_at(table, row.location)?;
                Ok(format!("Restored row ID {} in '{}'", row.id(), table))
            }
            Action::RevertUpdate {
                table,
                restore,
                discard,
            } => {
                if restore.location == discard.location {
                    engine.overwrite_at(table, restore.location, &restore.record)?;
                } else {
                    engine.delete_at(table, discard.location)?;
                    if let Err(e) = engine.restore_at(table, restore.location) {
                        // leave the table as it was before this action
                        if let Err(rollback) = engine.restore_at(table, discard.location) {
                            warn!(table = %table, error = %rollback, "partial reversal not rolled back");
                        }
                        return Err(e);
                    }
                }
                Ok(format!("Reverted update for ID {} in '{}'", restore.id(), table))
            }
            Action::ForgetCreatedTable { table } => {
                warn!(table = %table, "table creation cannot be reversed; table kept");
                Ok(format!("Table '{}' kept (CREATE TABLE is not reversible)", table))
            }
        }
    }
}

/// Undo and redo stacks owned by one executor
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Action>,
    redo: Vec<Action>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the reversal of a successful mutation; invalidates redo
    pub fn record(&mut self, action: Action) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Reverse the most recent mutation
    pub fn undo(&mut self, engine: &StorageEngine) -> Result<String> {
        let action = self.undo.pop().ok_or(Error::EmptyUndo)?;
        match action.apply(engine) {
            Ok(message) => {
                info!(table = action.table(), "undo: {}", message);
                self.redo.push(action.inverse());
                Ok(message)
            }
            Err(e) => {
                self.undo.push(action);
                Err(e)
            }
        }
    }

    /// Re-apply the most recently undone mutation
    pub fn redo(&mut self, engine: &StorageEngine) -> Result<String> {
        let action = self.redo.pop().ok_or(Error::EmptyRedo)?;
        match action.apply(engine) {
            Ok(message) => {
                info!(table = action.table(), "redo: {}", message);
                self.undo.push(action.inverse());
                Ok(message)
            }
            Err(e) => {
                self.redo.push(action);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
