//! Storage engine for ChronoDB
//!
//! This module combines schema persistence and heap files into table
//! lifecycle and record CRUD. A table exists exactly when its `.meta` file
//! does; its rows live in the matching `.data` page file.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::disk::{DiskManager, META_EXTENSION};
use super::heap::{HeapFile, SlotId};
use super::page::{Page, PageId};
use super::record::Record;
use crate::catalog::{Column, ColumnType, StructureKind, TableSchema};
use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// A live record together with where it is stored
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub location: SlotId,
    pub record: Record,
}

/// Where an updated record moved from and to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub from: SlotId,
    pub to: SlotId,
}

impl Relocation {
    /// True when the update overwrote the original slot
    pub fn is_in_place(&self) -> bool {
        self.from == self.to
    }
}

/// Storage engine
#[derive(Debug, Clone)]
pub struct StorageEngine {
    disk: DiskManager,
}

impl StorageEngine {
    /// Open the store described by `config`, creating its directory if needed
    pub fn open(config: &EngineConfig) -> Result<Self> {
        Self::new(&config.data_dir)
    }

    /// Open the store rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        debug!(path = %data_dir.display(), "storage directory ready");
        Ok(Self {
            disk: DiskManager::new(data_dir),
        })
    }

    /// Directory holding the table files
    pub fn data_dir(&self) -> &Path {
        self.disk.data_dir()
    }

    // ========== Table lifecycle ==========

    /// Create a table with a typed schema
    pub fn create_table(&self, name: &str, columns: Vec<Column>) -> Result<()> {
        self.create_table_with(name, TableSchema::new(columns))
    }

    /// Create a table from a full schema (columns plus structure label)
    pub fn create_table_with(&self, name: &str, schema: TableSchema) -> Result<()> {
        validate_table_name(name)?;
        if self.table_exists(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        validate_columns(&schema.columns)?;

        self.write_table_files(name, &schema)?;
        info!(
            table = name,
            columns = schema.column_count(),
            structure = %schema.structure,
            "created table"
        );
        Ok(())
    }

    /// Legacy schema-less creation.
    ///
    /// The table gets a meta file without columns, so `get_table_columns`
    /// reports it as absent to the query layer.
    pub fn create_table_untyped(&self, name: &str) -> Result<()> {
        validate_table_name(name)?;
        if self.table_exists(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        let schema = TableSchema {
            columns: Vec::new(),
            primary_key: String::new(),
            structure: StructureKind::Heap,
        };
        self.write_table_files(name, &schema)?;
        info!(table = name, "created schema-less table");
        Ok(())
    }

    /// Data file first, meta file last: the table only exists once both are in place
    fn write_table_files(&self, name: &str, schema: &TableSchema) -> Result<()> {
        self.disk.create_data_file(name)?;
        if let Err(e) = self.save_schema(name, schema) {
            if let Err(cleanup) = std::fs::remove_file(self.disk.data_path(name)) {
                warn!(table = name, error = %cleanup, "could not remove orphaned data file");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Check if a table exists (its schema file is present)
    pub fn table_exists(&self, name: &str) -> bool {
        validate_table_name(name).is_ok() && self.disk.meta_path(name).is_file()
    }

    /// Names of all tables, sorted
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        for entry in std::fs::read_dir(self.data_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tables.push(stem.to_string());
            }
        }
        tables.sort();
        Ok(tables)
    }

    // ========== Schema persistence ==========

    /// Load a table's schema
    pub fn load_schema(&self, name: &str) -> Result<TableSchema> {
        if !self.table_exists(name) {
            return Err(Error::TableNotFound(name.to_string()));
        }
        let json = std::fs::read_to_string(self.disk.meta_path(name))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Persist a table's schema
    pub fn save_schema(&self, name: &str, schema: &TableSchema) -> Result<()> {
        validate_table_name(name)?;
        let json = serde_json::to_string_pretty(schema)?;
        std::fs::write(self.disk.meta_path(name), json)?;
        Ok(())
    }

    /// Ordered columns of a table; empty when the table does not exist
    pub fn get_table_columns(&self, name: &str) -> Vec<Column> {
        if !self.table_exists(name) {
            return Vec::new();
        }
        match self.load_schema(name) {
            Ok(schema) => schema.columns,
            Err(e) => {
                warn!(table = name, error = %e, "unreadable schema treated as missing table");
                Vec::new()
            }
        }
    }

    // ========== Record CRUD ==========

    /// Insert a record, returning where it was stored
    pub fn insert_record(&self, table: &str, record: &Record) -> Result<SlotId> {
        let schema = self.load_schema(table)?;
        check_shape(&schema, record)?;
        let slot_id = self.heap(table).insert(record)?;
        debug!(table, page_id = slot_id.page_id, slot = slot_id.slot_num, "inserted record");
        Ok(slot_id)
    }

    /// All live records in physical (insertion) order
    pub fn select_all(&self, table: &str) -> Result<Vec<Record>> {
        Ok(self.scan(table)?.into_iter().map(|r| r.record).collect())
    }

    /// All live records with their locations
    pub fn scan(&self, table: &str) -> Result<Vec<StoredRecord>> {
        self.ensure_exists(table)?;
        Ok(self
            .heap(table)
            .scan()?
            .into_iter()
            .map(|(location, record)| StoredRecord { location, record })
            .collect())
    }

    /// First live record whose field 0 equals `id`
    pub fn find_record(&self, table: &str, id: i32) -> Result<Option<StoredRecord>> {
        Ok(self
            .scan(table)?
            .into_iter()
            .find(|stored| stored.record.id() == Some(id)))
    }

    /// Replace the record identified by `id`.
    ///
    /// Same-length encodings are overwritten in place; otherwise the old slot
    /// is tombstoned and the new image appended.
    pub fn update_record(&self, table: &str, id: i32, new_record: &Record) -> Result<Relocation> {
        let schema = self.load_schema(table)?;
        check_shape(&schema, new_record)?;
        let current = self
            .find_record(table, id)?
            .ok_or_else(|| Error::RecordNotFound {
                table: table.to_string(),
                id,
            })?;

        let heap = self.heap(table);
        let from = current.location;
        if heap.overwrite(from, new_record)? {
            return Ok(Relocation { from, to: from });
        }

        heap.delete(from)?;
        match heap.insert(new_record) {
            Ok(to) => Ok(Relocation { from, to }),
            Err(e) => {
                // put the old image back so the row is not lost
                if let Err(restore_err) = heap.restore(from) {
                    warn!(table, error = %restore_err, "could not restore row after failed update");
                }
                Err(e)
            }
        }
    }

    /// Tombstone the record identified by `id`, returning its last image
    pub fn delete_record(&self, table: &str, id: i32) -> Result<StoredRecord> {
        let stored = self
            .find_record(table, id)?
            .ok_or_else(|| Error::RecordNotFound {
                table: table.to_string(),
                id,
            })?;
        self.heap(table).delete(stored.location)?;
        Ok(stored)
    }

    /// Tombstone the record at a known location
    pub fn delete_at(&self, table: &str, location: SlotId) -> Result<()> {
        self.ensure_exists(table)?;
        self.heap(table).delete(location)
    }

    /// Reactivate a tombstoned record at a known location
    pub fn restore_at(&self, table: &str, location: SlotId) -> Result<()> {
        self.ensure_exists(table)?;
        self.heap(table).restore(location)
    }

    /// Overwrite the record at a known location with a same-length image
    pub fn overwrite_at(&self, table: &str, location: SlotId, record: &Record) -> Result<()> {
        self.ensure_exists(table)?;
        if self.heap(table).overwrite(location, record)? {
            Ok(())
        } else {
            Err(Error::SlotState {
                table: table.to_string(),
                page_id: location.page_id,
                slot: location.slot_num,
            })
        }
    }

    // ========== Page I/O ==========

    /// Persist one page at `page_index * PAGE_SIZE`
    pub fn write_page_to_file(&self, table: &str, page_index: PageId, page: &Page) -> Result<()> {
        self.ensure_exists(table)?;
        self.disk.write_page(table, page_index, page)
    }

    /// Load the page at `page_index * PAGE_SIZE`
    pub fn read_page_from_file(&self, table: &str, page_index: PageId) -> Result<Page> {
        self.ensure_exists(table)?;
        self.disk.read_page(table, page_index)
    }

    /// Number of pages in a table's data file
    pub fn page_count(&self, table: &str) -> Result<u32> {
        self.ensure_exists(table)?;
        self.disk.page_count(table)
    }

    fn heap(&self, table: &str) -> HeapFile {
        HeapFile::new(table, self.disk.clone())
    }

    fn ensure_exists(&self, table: &str) -> Result<()> {
        if self.table_exists(table) {
            Ok(())
        } else {
            Err(Error::TableNotFound(table.to_string()))
        }
    }
}

/// Table names become file names, so only identifier characters are allowed
fn validate_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidTableName(name.to_string()))
    }
}

fn validate_columns(columns: &[Column]) -> Result<()> {
    let first = columns
        .first()
        .ok_or_else(|| Error::InvalidColumnType("a table needs at least one column".to_string()))?;
    if first.column_type != ColumnType::Int {
        return Err(Error::InvalidColumnType(format!(
            "identity column '{}' must be INT, not {}",
            first.name, first.column_type
        )));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.name.is_empty() {
            return Err(Error::InvalidColumnType("empty column name".to_string()));
        }
        if !seen.insert(column.name.to_ascii_lowercase()) {
            return Err(Error::InvalidColumnType(format!(
                "duplicate column '{}'",
                column.name
            )));
        }
    }
    Ok(())
}

fn check_shape(schema: &TableSchema, record: &Record) -> Result<()> {
    if schema.columns.is_empty() || record.len() != schema.column_count() {
        return Err(Error::ArityMismatch {
            expected: schema.column_count(),
            found: record.len(),
        });
    }
    for (value, column) in record.values().iter().zip(schema.columns()) {
        if value.column_type() != column.column_type {
            return Err(Error::TypeMismatch {
                column: column.name.clone(),
                expected: column.column_type.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
