//! Statement executor for ChronoDB
//!
//! This module runs parsed statements against the storage engine and owns
//! the undo/redo history. `Executor::execute` is the single entry point.

use serde::Serialize;
use tracing::debug;

use super::history::{Action, History, RowImage};
use super::sorting;
use crate::catalog::{Column, StructureKind, TableSchema};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::Parser;
use crate::storage::{Record, StorageEngine, Value};

/// Query result
#[derive(Debug, Serialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Result rows
    pub rows: Vec<Record>,
    /// Number of affected rows (for INSERT/UPDATE/DELETE)
    pub affected_rows: usize,
    /// Message
    pub message: Option<String>,
}

impl QueryResult {
    /// Create a new empty result
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
            message: None,
        }
    }

    /// Create a result with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Create a result with affected rows count
    pub fn with_affected_rows(count: usize, message: impl Into<String>) -> Self {
        Self {
            affected_rows: count,
            message: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Create a result carrying rows
    pub fn with_rows(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self {
            columns,
            rows,
            ..Self::empty()
        }
    }
}

/// Statement executor
pub struct Executor {
    engine: StorageEngine,
    history: History,
}

impl Executor {
    /// Create an executor over an opened storage engine
    pub fn new(engine: StorageEngine) -> Self {
        Self {
            engine,
            history: History::new(),
        }
    }

    /// Open the store described by `config`
    pub fn open(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(StorageEngine::open(config)?))
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Parse and run one command
    pub fn execute(&mut self, command: &str) -> Result<QueryResult> {
        debug!(command, "executing");
        let statement = Parser::new(command).parse()?;
        self.execute_statement(statement)
    }

    /// Run a parsed statement.
    ///
    /// Successful mutations record their reversal here and nowhere else,
    /// which also discards any pending redo.
    pub fn execute_statement(&mut self, statement: Statement) -> Result<QueryResult> {
        let (result, action) = match statement {
            Statement::Undo => {
                let message = self.history.undo(&self.engine)?;
                return Ok(QueryResult::with_message(format!("[UNDO] {}", message)));
            }
            Statement::Redo => {
                let message = self.history.redo(&self.engine)?;
                return Ok(QueryResult::with_message(format!("[REDO] {}", message)));
            }
            Statement::Select(select) => return self.execute_select(select),
            Statement::CreateTable(create) => self.execute_create_table(create)?,
            Statement::Insert(insert) => self.execute_insert(insert)?,
            Statement::Update(update) => self.execute_update(update)?,
            Statement::Delete(delete) => self.execute_delete(delete)?,
        };
        self.history.record(action);
        Ok(result)
    }

    fn execute_create_table(&self, stmt: CreateTableStatement) -> Result<(QueryResult, Action)> {
        let count = stmt.columns.len();
        let schema = TableSchema::new(stmt.columns).with_structure(stmt.structure);
        self.engine.create_table_with(&stmt.name, schema)?;

        let result = QueryResult::with_message(format!(
            "Table '{}' created using {} ({} columns)",
            stmt.name, stmt.structure, count
        ));
        Ok((result, Action::ForgetCreatedTable { table: stmt.name }))
    }

    fn execute_insert(&self, stmt: InsertStatement) -> Result<(QueryResult, Action)> {
        let schema = self.schema_of(&stmt.table)?;
        if stmt.values.len() != schema.column_count() {
            return Err(Error::ArityMismatch {
                expected: schema.column_count(),
                found: stmt.values.len(),
            });
        }

        let record = schema
            .columns
            .iter()
            .zip(&stmt.values)
            .map(|(column, text)| coerce(column, text))
            .collect::<Result<Record>>()?;

        let id = record.id().ok_or_else(|| {
            Error::InvalidColumnType(format!(
                "table '{}' has no INT identity column",
                stmt.table
            ))
        })?;
        if self.engine.find_record(&stmt.table, id)?.is_some() {
            return Err(Error::DuplicateId {
                table: stmt.table,
                id,
            });
        }

        let location = self.engine.insert_record(&stmt.table, &record)?;
        let action = Action::RemoveInsertedRow {
            table: stmt.table,
            row: RowImage::new(record, location),
        };
        Ok((QueryResult::with_affected_rows(1, "Record inserted."), action))
    }

    fn execute_select(&self, stmt: SelectStatement) -> Result<QueryResult> {
        let schema = self.schema_of(&stmt.table)?;
        let mut rows = match stmt.lookup {
            Some(lookup) => self.lookup_by_id(&stmt.table, &schema, lookup)?,
            None => self.engine.select_all(&stmt.table)?,
        };

        if let Some(condition) = &stmt.filter {
            let index = schema.column_index(&condition.column).ok_or_else(|| {
                Error::ColumnNotFound(condition.column.clone(), stmt.table.clone())
            })?;
            let value = coerce(&schema.columns[index], &condition.value)?;
            rows = sorting::filter_rows(rows, index, condition.op, &value);
        }

        let names = schema.columns.into_iter().map(|c| c.name).collect();
        let mut result = QueryResult::with_rows(names, rows);
        if result.rows.is_empty() {
            result.message = Some(format!("No matching rows in table {}", stmt.table));
        }
        Ok(result)
    }

    /// `WHERE ID <id> USING BFS|DFS`, answered only for tables labeled BST.
    ///
    /// Rows live in the heap whatever the label, so both orders reach the
    /// same row and the lookup is a scan for the id.
    fn lookup_by_id(
        &self,
        table: &str,
        schema: &TableSchema,
        lookup: IdLookup,
    ) -> Result<Vec<Record>> {
        if schema.structure != StructureKind::Bst {
            return Err(Error::Unsupported(format!(
                "{} lookup on {} table '{}' (only BST tables)",
                lookup.order, schema.structure, table
            )));
        }
        debug!(table, id = lookup.id, order = %lookup.order, "id lookup");
        Ok(self
            .engine
            .find_record(table, lookup.id)?
            .map(|stored| stored.record)
            .into_iter()
            .collect())
    }

    fn execute_update(&self, stmt: UpdateStatement) -> Result<(QueryResult, Action)> {
        let schema = self.schema_of(&stmt.table)?;
        let index = schema
            .column_index(&stmt.column)
            .ok_or_else(|| Error::ColumnNotFound(stmt.column.clone(), stmt.table.clone()))?;
        let value = coerce(&schema.columns[index], &stmt.value)?;

        let current = self
            .engine
            .find_record(&stmt.table, stmt.id)?
            .ok_or_else(|| Error::RecordNotFound {
                table: stmt.table.clone(),
                id: stmt.id,
            })?;

        let mut updated = current.record.clone();
        updated.set(index, value);
        if let Some(new_id) = updated.id().filter(|new_id| *new_id != stmt.id) {
            if self.engine.find_record(&stmt.table, new_id)?.is_some() {
                return Err(Error::DuplicateId {
                    table: stmt.table,
                    id: new_id,
                });
            }
        }

        let moved = self.engine.update_record(&stmt.table, stmt.id, &updated)?;
        debug!(table = %stmt.table, id = stmt.id, in_place = moved.is_in_place(), "updated record");

        let action = Action::RevertUpdate {
            table: stmt.table,
            restore: RowImage::new(current.record, moved.from),
            discard: RowImage::new(updated, moved.to),
        };
        Ok((QueryResult::with_affected_rows(1, "Record updated."), action))
    }

    fn execute_delete(&self, stmt: DeleteStatement) -> Result<(QueryResult, Action)> {
        self.schema_of(&stmt.table)?;
        let removed = self.engine.delete_record(&stmt.table, stmt.id)?;
        let action = Action::RestoreRow {
            table: stmt.table,
            row: RowImage::new(removed.record, removed.location),
        };
        Ok((QueryResult::with_affected_rows(1, "Record deleted."), action))
    }

    /// Schema of a table; no declared columns means the table is absent
    fn schema_of(&self, table: &str) -> Result<TableSchema> {
        if self.engine.get_table_columns(table).is_empty() {
            return Err(Error::TableNotFound(table.to_string()));
        }
        self.engine.load_schema(table)
    }
}

fn coerce(column: &Column, text: &str) -> Result<Value> {
    Value::parse_as(text, column.column_type).ok_or_else(|| Error::TypeMismatch {
        column: column.name.clone(),
        expected: column.column_type.to_string(),
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_executor() -> (tempfile::TempDir, Executor) {
        let dir = tempfile::tempdir().unwrap();
        let engine = StorageEngine::new(dir.path()).unwrap();
        (dir, Executor::new(engine))
    }

    fn ids(result: &QueryResult) -> Vec<i32> {
        result.rows.iter().filter_map(Record::id).collect()
    }

    #[test]
    fn test_create_table() {
        let (_dir, mut executor) = create_test_executor();
        let result = executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        assert_eq!(
            result.message.as_deref(),
            Some("Table 'students' created using HEAP (3 columns)")
        );
        assert!(matches!(
            executor.execute("CREATE TABLE students (id INT)"),
            Err(Error::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn test_insert_and_select() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        let result = executor
            .execute("INSERT INTO students VALUES (1, \"Alice\", 3.8)")
            .unwrap();
        assert_eq!(result.affected_rows, 1);

        let result = executor.execute("SELECT * FROM students").unwrap();
        assert_eq!(result.columns, vec!["id", "name", "gpa"]);
        assert_eq!(
            result.rows,
            vec![Record::new(vec![
                Value::Int(1),
                Value::from("Alice"),
                Value::Float(3.8)
            ])]
        );
    }

    #[test]
    fn test_insert_errors_leave_table_unchanged() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        executor
            .execute("INSERT INTO students VALUES (1, Alice, 3.8)")
            .unwrap();

        assert!(matches!(
            executor.execute("INSERT INTO students VALUES (2, Bob)"),
            Err(Error::ArityMismatch { expected: 3, found: 2 })
        ));
        assert!(matches!(
            executor.execute("INSERT INTO students VALUES (2, Bob, high)"),
            Err(Error::TypeMismatch { ref column, .. }) if column == "gpa"
        ));
        assert!(matches!(
            executor.execute("INSERT INTO students VALUES (1, Bob, 2.0)"),
            Err(Error::DuplicateId { id: 1, .. })
        ));
        assert!(matches!(
            executor.execute("INSERT INTO nobody VALUES (1)"),
            Err(Error::TableNotFound(_))
        ));
        assert_eq!(executor.execute("SELECT * FROM students").unwrap().rows.len(), 1);
        assert_eq!(executor.history().undo_len(), 2);
    }

    #[test]
    fn test_select_where() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        for (id, gpa) in [(1, "2.0"), (2, "3.0"), (3, "1.0"), (4, "4.0"), (5, "3.5")] {
            executor
                .execute(&format!("INSERT INTO students VALUES ({}, s{}, {})", id, id, gpa))
                .unwrap();
        }

        let result = executor.execute("SELECT * FROM students WHERE GPA < 3").unwrap();
        assert_eq!(ids(&result), vec![3, 1]);

        let result = executor.execute("SELECT * FROM students WHERE name = s4").unwrap();
        assert_eq!(ids(&result), vec![4]);

        let result = executor.execute("SELECT * FROM students WHERE id > 9").unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(
            result.message.as_deref(),
            Some("No matching rows in table students")
        );

        assert!(matches!(
            executor.execute("SELECT * FROM students WHERE age > 3"),
            Err(Error::ColumnNotFound(..))
        ));
        assert!(matches!(
            executor.execute("SELECT * FROM students WHERE gpa > high"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_fractional_values_are_not_ints() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        for id in 1..=4 {
            executor
                .execute(&format!("INSERT INTO students VALUES ({}, s{}, 3.0)", id, id))
                .unwrap();
        }

        assert!(matches!(
            executor.execute("SELECT * FROM students WHERE id > 2.5"),
            Err(Error::TypeMismatch { ref value, .. }) if value == "2.5"
        ));
        assert!(matches!(
            executor.execute("SELECT * FROM students WHERE id = 2.0"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            executor.execute("UPDATE students SET gpa 1.0 WHERE ID 1.5"),
            Err(Error::TypeMismatch { ref column, .. }) if column == "ID"
        ));
        assert!(matches!(
            executor.execute("INSERT INTO students VALUES (5.5, s5, 3.0)"),
            Err(Error::TypeMismatch { ref column, .. }) if column == "id"
        ));
        assert_eq!(ids(&executor.execute("SELECT * FROM students").unwrap()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_update_unknown_column() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        executor.execute("INSERT INTO students VALUES (1, Alice, 3.8)").unwrap();
        let before = executor.execute("SELECT * FROM students").unwrap().rows;

        assert!(matches!(
            executor.execute("UPDATE students SET age 3 WHERE ID 1"),
            Err(Error::ColumnNotFound(ref column, _)) if column == "age"
        ));
        assert_eq!(executor.execute("SELECT * FROM students").unwrap().rows, before);
        assert_eq!(executor.history().undo_len(), 2);
    }

    #[test]
    fn test_select_id_lookup() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE products BST (id INT, name STRING)")
            .unwrap();
        executor.execute("CREATE TABLE plain (id INT)").unwrap();
        for id in [5, 2, 8] {
            executor
                .execute(&format!("INSERT INTO products VALUES ({}, p{})", id, id))
                .unwrap();
        }

        let bfs = executor
            .execute("SELECT * FROM products WHERE ID 2 USING BFS")
            .unwrap();
        assert_eq!(bfs.columns, vec!["id", "name"]);
        assert_eq!(ids(&bfs), vec![2]);
        let dfs = executor
            .execute("SELECT * FROM products WHERE ID 2 USING DFS")
            .unwrap();
        assert_eq!(dfs.rows, bfs.rows);

        let missing = executor
            .execute("SELECT * FROM products WHERE ID 9 USING BFS")
            .unwrap();
        assert!(missing.rows.is_empty());
        assert!(missing.message.is_some());

        assert!(matches!(
            executor.execute("SELECT * FROM plain WHERE ID 1 USING DFS"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            executor.execute("SELECT * FROM nobody WHERE ID 1 USING BFS"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        executor.execute("INSERT INTO students VALUES (1, Alice, 3.8)").unwrap();
        executor.execute("INSERT INTO students VALUES (2, Bob, 2.9)").unwrap();

        executor.execute("UPDATE students SET GPA 3.9 WHERE ID 2").unwrap();
        let result = executor.execute("SELECT * FROM students WHERE id = 2").unwrap();
        assert_eq!(result.rows[0].get(2), Some(&Value::Float(3.9)));

        assert!(matches!(
            executor.execute("UPDATE students SET id 1 WHERE ID 2"),
            Err(Error::DuplicateId { id: 1, .. })
        ));
        assert!(matches!(
            executor.execute("UPDATE students SET gpa 1.0 WHERE ID 7"),
            Err(Error::RecordNotFound { id: 7, .. })
        ));

        executor.execute("DELETE FROM students WHERE ID 1").unwrap();
        assert_eq!(ids(&executor.execute("SELECT * FROM students").unwrap()), vec![2]);
        assert!(matches!(
            executor.execute("DELETE FROM students WHERE ID 1"),
            Err(Error::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_undo_redo_update() {
        let (_dir, mut executor) = create_test_executor();
        executor
            .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
            .unwrap();
        executor.execute("INSERT INTO students VALUES (1, Alice, 3.8)").unwrap();
        executor.execute("INSERT INTO students VALUES (2, Bob, 2.9)").unwrap();
        let before = executor.execute("SELECT * FROM students").unwrap().rows;

        executor.execute("UPDATE students SET name Alexandra WHERE ID 1").unwrap();
        let after = executor.execute("SELECT * FROM students").unwrap().rows;

        executor.execute("UNDO").unwrap();
        assert_eq!(executor.execute("SELECT * FROM students").unwrap().rows, before);

        executor.execute("REDO").unwrap();
        assert_eq!(executor.execute("SELECT * FROM students").unwrap().rows, after);
    }

    #[test]
    fn test_undo_create_keeps_table() {
        let (_dir, mut executor) = create_test_executor();
        executor.execute("CREATE TABLE t (id INT)").unwrap();
        let result = executor.execute("UNDO").unwrap();
        assert!(result.message.unwrap().contains("kept"));
        assert!(executor.engine().table_exists("t"));
        assert!(matches!(executor.execute("UNDO"), Err(Error::EmptyUndo)));
    }

    #[test]
    fn test_failed_statement_keeps_redo() {
        let (_dir, mut executor) = create_test_executor();
        executor.execute("CREATE TABLE t (id INT)").unwrap();
        executor.execute("INSERT INTO t VALUES (1)").unwrap();
        executor.execute("UNDO").unwrap();

        assert!(executor.execute("INSERT INTO t VALUES (x)").is_err());
        assert!(executor.execute("SELECT * FROM t").is_ok());
        assert!(executor.history().can_redo());

        executor.execute("INSERT INTO t VALUES (2)").unwrap();
        assert!(!executor.history().can_redo());
    }
}
