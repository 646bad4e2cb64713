//! Disk manager for ChronoDB
//!
//! This module handles direct page I/O on per-table data files. Files are
//! opened for each page access and closed again; no handle is cached.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::page::{Page, PageId, PAGE_SIZE};

/// Extension of a table's page file
pub const DATA_EXTENSION: &str = "data";

/// Extension of a table's schema sidecar
pub const META_EXTENSION: &str = "meta";

/// Disk manager
#[derive(Debug, Clone)]
pub struct DiskManager {
    /// Directory where data files are stored
    data_dir: PathBuf,
}

impl DiskManager {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding all table files
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a table's page file
    pub fn data_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", table, DATA_EXTENSION))
    }

    /// Path of a table's schema file
    pub fn meta_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", table, META_EXTENSION))
    }

    /// Create (or truncate) an empty page file
    pub fn create_data_file(&self, table: &str) -> Result<()> {
        File::create(self.data_path(table))?;
        Ok(())
    }

    /// Number of whole pages in the table's file
    pub fn page_count(&self, table: &str) -> Result<u32> {
        let len = std::fs::metadata(self.data_path(table))?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Read the page stored at `page_index * PAGE_SIZE`
    pub fn read_page(&self, table: &str, page_index: PageId) -> Result<Page> {
        let mut file = File::open(self.data_path(table))?;
        file.seek(SeekFrom::Start(page_offset(page_index)))?;

        let mut bytes = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut bytes)?;

        let page = Page::from_bytes(&bytes).map_err(|e| match e {
            Error::CorruptedPage { reason, .. } => Error::CorruptedPage {
                page_id: page_index,
                reason,
            },
            other => other,
        })?;
        debug!(table, page_index, slots = page.slot_count(), "read page");
        Ok(page)
    }

    /// Write a page at `page_index * PAGE_SIZE`
    pub fn write_page(&self, table: &str, page_index: PageId, page: &Page) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(self.data_path(table))?;
        file.seek(SeekFrom::Start(page_offset(page_index)))?;
        file.write_all(&page.to_bytes())?;
        file.flush()?;
        debug!(table, page_index, "wrote page");
        Ok(())
    }

    /// Append an empty page to the file and return its index
    pub fn append_empty_page(&self, table: &str) -> Result<PageId> {
        let page_index = self.page_count(table)?;
        self.write_page(table, page_index, &Page::new(page_index))?;
        debug!(table, page_index, "allocated page");
        Ok(page_index)
    }
}

fn page_offset(page_index: PageId) -> u64 {
    page_index as u64 * PAGE_SIZE as u64
}
