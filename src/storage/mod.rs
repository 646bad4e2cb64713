//! Storage engine module
//!
//! This module contains the storage engine components:
//! - Slotted pages
//! - Record encoding
//! - Per-table page files
//! - Heap file storage
//! - Table lifecycle and record CRUD

pub mod disk;
pub mod engine;
pub mod heap;
pub mod page;
pub mod record;

pub use disk::DiskManager;
pub use engine::{Relocation, StorageEngine, StoredRecord};
pub use heap::{HeapFile, SlotId};
pub use page::{Page, PageId, MAX_RECORD_SIZE, PAGE_SIZE};
pub use record::{Record, Value};
