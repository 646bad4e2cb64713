//! Page management for ChronoDB
//!
//! This module defines the slotted page used for on-disk storage. Each page
//! is a fixed-size block (8KB) made of a reserved header, a slot directory
//! and an append-only record arena.
//!
//! On disk a page is laid out as:
//!
//! ```text
//! [page_id u32][slot_count u16][free_space_offset u16][zero pad to 64]
//! [slot_count x (offset u16, length u16, active u8)]
//! [arena bytes 64..free_space_offset]
//! ```
//!
//! Slot offsets address the in-memory data buffer, where the arena starts
//! right after the reserved header. Deleting a record only clears its
//! `active` flag; arena space is never reclaimed.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Page size in bytes (8KB)
pub const PAGE_SIZE: usize = 8192;

/// Bytes reserved for the page header
pub const PAGE_HEADER_RESERVED: usize = 64;

/// Serialized size of one slot entry: offset(2) + length(2) + active(1)
pub const SLOT_ENTRY_SIZE: usize = 5;

/// Largest record that fits in an empty page
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_RESERVED - SLOT_ENTRY_SIZE;

/// Page ID type
pub type PageId = u32;

/// Slot directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    /// Offset of the record inside the data buffer
    pub offset: u16,
    /// Length of the record in bytes
    pub length: u16,
    /// False once the record has been tombstoned
    pub active: bool,
}

impl SlotEntry {
    pub fn new(offset: u16, length: u16) -> Self {
        Self {
            offset,
            length,
            active: true,
        }
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.length as usize
    }
}

/// A slotted database page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    page_id: PageId,
    slots: Vec<SlotEntry>,
    free_space_offset: u16,
    /// Raw data buffer, always `PAGE_SIZE` bytes
    data: Vec<u8>,
}

impl Page {
    /// Create a new empty page
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            slots: Vec::new(),
            free_space_offset: PAGE_HEADER_RESERVED as u16,
            data: vec![0u8; PAGE_SIZE],
        }
    }

    /// Get page ID
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Number of slots, tombstones included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The slot directory
    pub fn slots(&self) -> &[SlotEntry] {
        &self.slots
    }

    /// End of the used part of the arena
    pub fn free_space_offset(&self) -> u16 {
        self.free_space_offset
    }

    /// Serialized size of the slot directory
    pub fn directory_size(&self) -> usize {
        self.slots.len() * SLOT_ENTRY_SIZE
    }

    /// Bytes still available for record data and directory growth
    pub fn free_space(&self) -> usize {
        PAGE_SIZE
            .saturating_sub(self.free_space_offset as usize)
            .saturating_sub(self.directory_size())
    }

    /// Number of active (non-tombstoned) records
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Append a record to the arena.
    ///
    /// Returns the new slot index, or `None` when the record (plus its
    /// directory entry) does not fit; the caller then moves to a new page.
    pub fn insert_raw_record(&mut self, record: &[u8]) -> Option<u16> {
        let needed_directory = (self.slots.len() + 1) * SLOT_ENTRY_SIZE;
        let available = PAGE_SIZE
            .checked_sub(self.free_space_offset as usize)?
            .checked_sub(needed_directory)?;
        if available < record.len() || self.slots.len() >= u16::MAX as usize {
            return None;
        }

        let offset = self.free_space_offset as usize;
        self.data[offset..offset + record.len()].copy_from_slice(record);
        self.free_space_offset = (offset + record.len()) as u16;

        let slot_num = self.slots.len() as u16;
        self.slots.push(SlotEntry::new(offset as u16, record.len() as u16));
        Some(slot_num)
    }

    /// Tombstone a slot. Fails if out of range or already inactive.
    pub fn delete_slot(&mut self, slot_num: u16) -> bool {
        match self.slots.get_mut(slot_num as usize) {
            Some(slot) if slot.active => {
                slot.active = false;
                true
            }
            _ => false,
        }
    }

    /// Reactivate a tombstoned slot. Its bytes are still in the arena.
    pub fn restore_slot(&mut self, slot_num: u16) -> bool {
        match self.slots.get_mut(slot_num as usize) {
            Some(slot) if !slot.active => {
                slot.active = true;
                true
            }
            _ => false,
        }
    }

    /// Overwrite an active record with bytes of exactly the same length
    pub fn overwrite_slot(&mut self, slot_num: u16, record: &[u8]) -> bool {
        let slot = match self.slots.get(slot_num as usize) {
            Some(slot) if slot.active && slot.length as usize == record.len() => *slot,
            _ => return false,
        };
        self.data[slot.range()].copy_from_slice(record);
        true
    }

    /// Copy an active record into `out`. Fails if out of range or inactive.
    pub fn read_raw_record(&self, slot_num: u16, out: &mut Vec<u8>) -> bool {
        match self.get_record(slot_num) {
            Some(bytes) => {
                out.clear();
                out.extend_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Borrow an active record
    pub fn get_record(&self, slot_num: u16) -> Option<&[u8]> {
        let slot = self.slots.get(slot_num as usize)?;
        if !slot.active {
            return None;
        }
        Some(&self.data[slot.range()])
    }

    /// Active records in slot order
    pub fn live_records(&self) -> impl Iterator<Item = (u16, &[u8])> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(i, slot)| (i as u16, &self.data[slot.range()]))
    }

    /// Serialize header, directory and arena into a fresh page buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; PAGE_SIZE];
        self.serialize_to_buffer(&mut buffer);
        buffer
    }

    /// Serialize into `buffer`, which must be exactly `PAGE_SIZE` bytes
    pub fn serialize_to_buffer(&self, buffer: &mut [u8]) {
        debug_assert_eq!(buffer.len(), PAGE_SIZE);
        buffer.fill(0);

        LittleEndian::write_u32(&mut buffer[0..4], self.page_id);
        LittleEndian::write_u16(&mut buffer[4..6], self.slots.len() as u16);
        LittleEndian::write_u16(&mut buffer[6..8], self.free_space_offset);

        let mut offset = PAGE_HEADER_RESERVED;
        for slot in &self.slots {
            LittleEndian::write_u16(&mut buffer[offset..offset + 2], slot.offset);
            LittleEndian::write_u16(&mut buffer[offset + 2..offset + 4], slot.length);
            buffer[offset + 4] = slot.active as u8;
            offset += SLOT_ENTRY_SIZE;
        }

        let arena = &self.data[PAGE_HEADER_RESERVED..self.free_space_offset as usize];
        buffer[offset..offset + arena.len()].copy_from_slice(arena);
    }

    /// Rebuild a page from its serialized form, validating the layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAGE_SIZE {
            return Err(Error::CorruptedPage {
                page_id: 0,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, bytes.len()),
            });
        }

        let page_id = LittleEndian::read_u32(&bytes[0..4]);
        let slot_count = LittleEndian::read_u16(&bytes[4..6]) as usize;
        let free_space_offset = LittleEndian::read_u16(&bytes[6..8]);
        let corrupted = |reason: String| Error::CorruptedPage { page_id, reason };

        let fso = free_space_offset as usize;
        let directory_size = slot_count * SLOT_ENTRY_SIZE;
        if fso < PAGE_HEADER_RESERVED || fso + directory_size > PAGE_SIZE {
            return Err(corrupted(format!(
                "free space offset {} with {} slots overflows the page",
                fso, slot_count
            )));
        }

        let mut slots = Vec::with_capacity(slot_count);
        let mut offset = PAGE_HEADER_RESERVED;
        for i in 0..slot_count {
            let slot = SlotEntry {
                offset: LittleEndian::read_u16(&bytes[offset..offset + 2]),
                length: LittleEndian::read_u16(&bytes[offset + 2..offset + 4]),
                active: match bytes[offset + 4] {
                    0 => false,
                    1 => true,
                    other => return Err(corrupted(format!("slot {} has flag {}", i, other))),
                },
            };
            if (slot.offset as usize) < PAGE_HEADER_RESERVED || slot.range().end > fso {
                return Err(corrupted(format!("slot {} points outside the arena", i)));
            }
            slots.push(slot);
            offset += SLOT_ENTRY_SIZE;
        }

        let mut data = vec![0u8; PAGE_SIZE];
        let arena_len = fso - PAGE_HEADER_RESERVED;
        data[PAGE_HEADER_RESERVED..fso].copy_from_slice(&bytes[offset..offset + arena_len]);

        Ok(Self {
            page_id,
            slots,
            free_space_offset,
            data,
        })
    }

    /// Replace this page's contents with the serialized form in `buffer`
    pub fn deserialize_from_buffer(&mut self, buffer: &[u8]) -> Result<()> {
        *self = Self::from_bytes(buffer)?;
        Ok(())
    }
}
