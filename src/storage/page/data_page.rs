//! Slotted data page: the in-page record store of a heap file.
//!
//! # Layout
//! ```text
//! ┌──────────────┬───────────────────────┬──────────────┬──────────────────┐
//! │ PageHeader   │ slot_count  free_ptr  │ slot array → │ ← record bytes   │
//! │ (5 bytes)    │ next_page   page_no   │ (4B / slot)  │                  │
//! └──────────────┴───────────────────────┴──────────────┴──────────────────┘
//! 0              5                       17             free_ptr      4096
//! ```
//!
//! Slots grow up from the header, record bytes grow down from the end of the
//! page. A slot is `{offset: u16, length: u16}`; offset 0 marks an empty slot.
//! Deleting a record compacts the record area, so the free space between the
//! slot array and `free_ptr` is always contiguous.

use std::ops::{Deref, DerefMut};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result, Rid};

use super::page::Page;
use super::page_header::{PageHeader, PageType};

const OFFSET_SLOT_COUNT: usize = PageHeader::SIZE;
const OFFSET_FREE_PTR: usize = PageHeader::SIZE + 2;
const OFFSET_NEXT_PAGE: usize = PageHeader::SIZE + 4;
const OFFSET_PAGE_NO: usize = PageHeader::SIZE + 8;

/// Bytes before the slot array.
pub const DATA_HEADER_SIZE: usize = PageHeader::SIZE + 12;

/// Bytes per slot entry.
pub const SLOT_SIZE: usize = 4;

/// Fixed overhead of a page holding a single record.
pub const DP_FIXED: usize = DATA_HEADER_SIZE + SLOT_SIZE;

/// Largest record that fits on an empty data page.
pub const MAX_RECORD_LEN: usize = PAGE_SIZE - DP_FIXED;

/// Typed view over a heap-file data page.
///
/// Works over anything that derefs to a [`Page`]: a plain reference, or a
/// buffer-pool lock guard. Mutating operations need `DerefMut`.
///
/// # Example
/// ```
/// use heapstore::storage::page::{DataPage, Page};
/// use heapstore::PageId;
///
/// let mut page = Page::new();
/// let mut data = DataPage::new(&mut page);
/// data.init(PageId::new(1));
/// let rid = data.insert_record(b"hello").unwrap();
/// assert_eq!(data.record(rid).unwrap(), b"hello");
/// ```
pub struct DataPage<P> {
    page: P,
}

impl<P: Deref<Target = Page>> DataPage<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    pub fn page_type(&self) -> PageType {
        self.page.page_type()
    }

    pub fn page_no(&self) -> PageId {
        self.page.read_page_id(OFFSET_PAGE_NO)
    }

    /// Next page in the heap file chain, `PageId::INVALID` at the tail.
    pub fn next_page(&self) -> PageId {
        self.page.read_page_id(OFFSET_NEXT_PAGE)
    }

    fn slot_count(&self) -> u16 {
        self.page.read_u16(OFFSET_SLOT_COUNT)
    }

    fn free_ptr(&self) -> usize {
        self.page.read_u16(OFFSET_FREE_PTR) as usize
    }

    fn slot(&self, slot_no: u16) -> (usize, usize) {
        let at = DATA_HEADER_SIZE + slot_no as usize * SLOT_SIZE;
        (
            self.page.read_u16(at) as usize,
            self.page.read_u16(at + 2) as usize,
        )
    }

    /// Slot array fits before the record area.
    fn slots_in_bounds(&self) -> bool {
        DATA_HEADER_SIZE + self.slot_count() as usize * SLOT_SIZE <= PAGE_SIZE
    }

    fn is_live(&self, slot_no: u16) -> bool {
        if slot_no >= self.slot_count() || !self.slots_in_bounds() {
            return false;
        }
        let (offset, length) = self.slot(slot_no);
        offset != 0 && offset + length <= PAGE_SIZE
    }

    /// Contiguous bytes available for a record plus its slot.
    pub fn free_space(&self) -> usize {
        self.free_ptr() - (DATA_HEADER_SIZE + self.slot_count() as usize * SLOT_SIZE)
    }

    /// Number of live records on the page.
    pub fn record_count(&self) -> usize {
        if !self.slots_in_bounds() {
            return 0;
        }
        (0..self.slot_count()).filter(|&s| self.is_live(s)).count()
    }

    /// Borrow the bytes of a live record.
    ///
    /// # Errors
    /// `Error::InvalidSlot` if the slot is out of range or empty, or its
    /// entry points outside the page.
    pub fn record(&self, rid: Rid) -> Result<&[u8]> {
        if !self.is_live(rid.slot_no) {
            return Err(Error::InvalidSlot {
                page: rid.page_no.0,
                slot: rid.slot_no,
            });
        }
        let (offset, length) = self.slot(rid.slot_no);
        Ok(&self.page.as_slice()[offset..offset + length])
    }

    /// First live record in slot order, `None` if the page is empty.
    pub fn first_record(&self) -> Option<Rid> {
        self.live_from(0)
    }

    /// Live record following `after` in slot order, `None` at end of page.
    ///
    /// `after` need not be live; a deleted cursor position still advances.
    pub fn next_record(&self, after: Rid) -> Option<Rid> {
        self.live_from(after.slot_no.checked_add(1)?)
    }

    fn live_from(&self, start: u16) -> Option<Rid> {
        if !self.slots_in_bounds() {
            return None;
        }
        let page_no = self.page_no();
        (start..self.slot_count())
            .find(|&s| self.is_live(s))
            .map(|s| Rid::new(page_no, s))
    }
}

impl<P: DerefMut<Target = Page>> DataPage<P> {
    /// Format the page as an empty data page.
    pub fn init(&mut self, page_no: PageId) {
        self.page.reset();
        self.page.set_page_type(PageType::Data);
        self.page.write_u16(OFFSET_SLOT_COUNT, 0);
        self.page.write_u16(OFFSET_FREE_PTR, PAGE_SIZE as u16);
        self.page.write_page_id(OFFSET_NEXT_PAGE, PageId::INVALID);
        self.page.write_page_id(OFFSET_PAGE_NO, page_no);
    }

    pub fn set_next_page(&mut self, next: PageId) {
        self.page.write_page_id(OFFSET_NEXT_PAGE, next);
    }

    fn set_slot(&mut self, slot_no: u16, offset: usize, length: usize) {
        let at = DATA_HEADER_SIZE + slot_no as usize * SLOT_SIZE;
        self.page.write_u16(at, offset as u16);
        self.page.write_u16(at + 2, length as u16);
    }

    /// Insert a record, reusing the lowest empty slot.
    ///
    /// # Errors
    /// `Error::PageFull` if the record (plus a new slot, when none can be
    /// reused) does not fit in the free space.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<Rid> {
        let slot_count = self.slot_count();
        let reuse = (0..slot_count).find(|&s| self.slot(s).0 == 0);
        let needed = record.len() + if reuse.is_some() { 0 } else { SLOT_SIZE };
        if needed > self.free_space() {
            return Err(Error::PageFull(self.page_no().0));
        }

        let offset = self.free_ptr() - record.len();
        self.page.as_mut_slice()[offset..offset + record.len()].copy_from_slice(record);
        self.page.write_u16(OFFSET_FREE_PTR, offset as u16);

        let slot_no = match reuse {
            Some(slot_no) => slot_no,
            None => {
                self.page.write_u16(OFFSET_SLOT_COUNT, slot_count + 1);
                slot_count
            }
        };
        self.set_slot(slot_no, offset, record.len());
        Ok(Rid::new(self.page_no(), slot_no))
    }

    /// Delete a live record and compact the record area.
    ///
    /// # Errors
    /// `Error::InvalidSlot` if the slot is out of range or empty.
    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        if !self.is_live(rid.slot_no) {
            return Err(Error::InvalidSlot {
                page: rid.page_no.0,
                slot: rid.slot_no,
            });
        }
        let (offset, length) = self.slot(rid.slot_no);
        let free_ptr = self.free_ptr();

        // Records below the hole slide up by `length`.
        self.page
            .as_mut_slice()
            .copy_within(free_ptr..offset, free_ptr + length);
        for s in 0..self.slot_count() {
            let (o, l) = self.slot(s);
            if o != 0 && o < offset {
                self.set_slot(s, o + length, l);
            }
        }
        self.page.write_u16(OFFSET_FREE_PTR, (free_ptr + length) as u16);
        self.set_slot(rid.slot_no, 0, 0);

        let mut slot_count = self.slot_count();
        while slot_count > 0 && self.slot(slot_count - 1).0 == 0 {
            slot_count -= 1;
        }
        self.page.write_u16(OFFSET_SLOT_COUNT, slot_count);
        Ok(())
    }
}
