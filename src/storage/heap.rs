//! Heap file storage for ChronoDB
//!
//! This module implements the per-table heap: records are appended to the
//! tail page in arrival order and located afterwards by `SlotId`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::disk::DiskManager;
use super::page::{Page, PageId, MAX_RECORD_SIZE};
use super::record::Record;
use crate::error::{Error, Result};

/// A slot identifier (page_id, slot_number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub page_id: PageId,
    pub slot_num: u16,
}

impl SlotId {
    pub fn new(page_id: PageId, slot_num: u16) -> Self {
        Self { page_id, slot_num }
    }
}

/// Heap file for storing records of one table
#[derive(Debug, Clone)]
pub struct HeapFile {
    /// Table this heap file belongs to
    table: String,
    /// Page I/O
    disk: DiskManager,
}

impl HeapFile {
    /// Open the heap of an existing table
    pub fn new(table: impl Into<String>, disk: DiskManager) -> Self {
        Self {
            table: table.into(),
            disk,
        }
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of pages in the heap
    pub fn page_count(&self) -> Result<u32> {
        self.disk.page_count(&self.table)
    }

    /// Insert a record into the tail page, allocating a new page when it is full
    pub fn insert(&self, record: &Record) -> Result<SlotId> {
        let bytes = record.to_bytes()?;
        if bytes.len() > MAX_RECORD_SIZE {
            return Err(Error::RecordTooLarge(bytes.len()));
        }

        let page_count = self.page_count()?;
        if page_count > 0 {
            let last = page_count - 1;
            let mut page = self.disk.read_page(&self.table, last)?;
            if let Some(slot_num) = page.insert_raw_record(&bytes) {
                self.disk.write_page(&self.table, last, &page)?;
                return Ok(SlotId::new(last, slot_num));
            }
        }

        // Tail page full (or no page yet)
        let page_id = self.disk.append_empty_page(&self.table)?;
        let mut page = Page::new(page_id);
        let slot_num = page
            .insert_raw_record(&bytes)
            .ok_or(Error::RecordTooLarge(bytes.len()))?;
        self.disk.write_page(&self.table, page_id, &page)?;
        debug!(table = %self.table, page_id, "record spilled to new page");
        Ok(SlotId::new(page_id, slot_num))
    }

    /// Tombstone the record at `slot_id`
    pub fn delete(&self, slot_id: SlotId) -> Result<()> {
        self.modify(slot_id, |page| page.delete_slot(slot_id.slot_num))
    }

    /// Reactivate a tombstoned record at `slot_id`
    pub fn restore(&self, slot_id: SlotId) -> Result<()> {
        self.modify(slot_id, |page| page.restore_slot(slot_id.slot_num))
    }

    /// Overwrite the record at `slot_id` in place.
    ///
    /// Returns `Ok(false)` without touching the page when the new encoding
    /// differs in length from the stored one.
    pub fn overwrite(&self, slot_id: SlotId, record: &Record) -> Result<bool> {
        let bytes = record.to_bytes()?;
        let mut page = self.load(slot_id)?;
        match page.slots().get(slot_id.slot_num as usize) {
            Some(slot) if slot.active => {
                if slot.length as usize != bytes.len() {
                    return Ok(false);
                }
            }
            _ => return Err(self.slot_state(slot_id)),
        }
        page.overwrite_slot(slot_id.slot_num, &bytes);
        self.disk.write_page(&self.table, slot_id.page_id, &page)?;
        Ok(true)
    }

    /// Get a live record by slot ID
    pub fn get(&self, slot_id: SlotId) -> Result<Option<Record>> {
        if slot_id.page_id >= self.page_count()? {
            return Ok(None);
        }
        let page = self.disk.read_page(&self.table, slot_id.page_id)?;
        page.get_record(slot_id.slot_num)
            .map(Record::from_bytes)
            .transpose()
    }

    /// Scan all live records in physical order
    pub fn scan(&self) -> Result<Vec<(SlotId, Record)>> {
        let mut result = Vec::new();
        for page_id in 0..self.page_count()? {
            let page = self.disk.read_page(&self.table, page_id)?;
            for (slot_num, bytes) in page.live_records() {
                result.push((SlotId::new(page_id, slot_num), Record::from_bytes(bytes)?));
            }
        }
        Ok(result)
    }

    fn load(&self, slot_id: SlotId) -> Result<Page> {
        if slot_id.page_id >= self.page_count()? {
            return Err(self.slot_state(slot_id));
        }
        self.disk.read_page(&self.table, slot_id.page_id)
    }

    fn modify(&self, slot_id: SlotId, op: impl FnOnce(&mut Page) -> bool) -> Result<()> {
        let mut page = self.load(slot_id)?;
        if !op(&mut page) {
            return Err(self.slot_state(slot_id));
        }
        self.disk.write_page(&self.table, slot_id.page_id, &page)
    }

    fn slot_state(&self, slot_id: SlotId) -> Error {
        Error::SlotState {
            table: self.table.clone(),
            page_id: slot_id.page_id,
            slot: slot_id.slot_num,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::Value;

    fn setup() -> (tempfile::TempDir, HeapFile) {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskManager::new(dir.path());
        disk.create_data_file("heap").unwrap();
        (dir, HeapFile::new("heap", disk))
    }

    fn row(id: i32, name: &str) -> Record {
        Record::new(vec![Value::Int(id), Value::String(name.to_string())])
    }

    #[test]
    fn test_heap_file_insert() {
        let (_dir, heap) = setup();
        let slot_id = heap.insert(&row(1, "test")).unwrap();

        assert_eq!(slot_id, SlotId::new(0, 0));
        assert_eq!(heap.get(slot_id).unwrap(), Some(row(1, "test")));
        assert_eq!(heap.page_count().unwrap(), 1);
    }

    #[test]
    fn test_heap_file_delete_and_restore() {
        let (_dir, heap) = setup();
        let slot_id = heap.insert(&row(1, "a")).unwrap();

        heap.delete(slot_id).unwrap();
        assert!(heap.get(slot_id).unwrap().is_none());
        assert!(heap.scan().unwrap().is_empty());
        assert!(matches!(heap.delete(slot_id), Err(Error::SlotState { .. })));

        heap.restore(slot_id).unwrap();
        assert_eq!(heap.scan().unwrap(), vec![(slot_id, row(1, "a"))]);
    }

    #[test]
    fn test_heap_file_overwrite() {
        let (_dir, heap) = setup();
        let slot_id = heap.insert(&row(1, "abc")).unwrap();

        assert!(heap.overwrite(slot_id, &row(1, "xyz")).unwrap());
        assert!(!heap.overwrite(slot_id, &row(1, "longer")).unwrap());
        assert_eq!(heap.get(slot_id).unwrap(), Some(row(1, "xyz")));
    }

    #[test]
    fn test_heap_file_spills_to_new_page() {
        let (_dir, heap) = setup();
        let name = "x".repeat(1000);
        let mut last = SlotId::new(0, 0);
        for i in 0..20 {
            last = heap.insert(&row(i, &name)).unwrap();
        }

        assert!(heap.page_count().unwrap() > 1);
        assert_eq!(last.page_id, heap.page_count().unwrap() - 1);

        let ids: Vec<i32> = heap
            .scan()
            .unwrap()
            .into_iter()
            .filter_map(|(_, r)| r.id())
            .collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_oversized_record_is_rejected() {
        let (_dir, heap) = setup();
        let huge = row(1, &"y".repeat(9000));
        assert!(matches!(heap.insert(&huge), Err(Error::RecordTooLarge(_))));
        assert_eq!(heap.page_count().unwrap(), 0);
    }
}
