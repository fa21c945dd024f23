//! File header page of a heap file.
//!
//! # Layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       5     PageHeader (type = FileHeader)
//! 5       50    file name, NUL padded
//! 55      4     page_count (header + data pages)
//! 59      4     record_count
//! 63      4     first_page
//! 67      4     last_page
//! ```

use std::ops::{Deref, DerefMut};

use crate::common::config::MAX_NAME_LEN;
use crate::common::{Error, PageId, Result};

use super::page::Page;
use super::page_header::{PageHeader, PageType};

const OFFSET_NAME: usize = PageHeader::SIZE;
const OFFSET_PAGE_COUNT: usize = OFFSET_NAME + MAX_NAME_LEN;
const OFFSET_RECORD_COUNT: usize = OFFSET_PAGE_COUNT + 4;
const OFFSET_FIRST_PAGE: usize = OFFSET_RECORD_COUNT + 4;
const OFFSET_LAST_PAGE: usize = OFFSET_FIRST_PAGE + 4;

/// Typed view over a heap file's header page.
pub struct HeaderPage<P> {
    page: P,
}

impl<P: Deref<Target = Page>> HeaderPage<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    pub fn file_name(&self) -> String {
        let raw = &self.page.as_slice()[OFFSET_NAME..OFFSET_NAME + MAX_NAME_LEN];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    pub fn page_count(&self) -> u32 {
        self.page.read_u32(OFFSET_PAGE_COUNT)
    }

    pub fn record_count(&self) -> u32 {
        self.page.read_u32(OFFSET_RECORD_COUNT)
    }

    pub fn first_page(&self) -> PageId {
        self.page.read_page_id(OFFSET_FIRST_PAGE)
    }

    pub fn last_page(&self) -> PageId {
        self.page.read_page_id(OFFSET_LAST_PAGE)
    }
}

impl<P: DerefMut<Target = Page>> HeaderPage<P> {
    /// Format a fresh header: one page (itself), no records, no data pages.
    ///
    /// # Errors
    /// `Error::InvalidName` if `name` is empty or longer than the name field.
    pub fn init(&mut self, name: &str) -> Result<()> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(Error::InvalidName(name.to_string()));
        }
        self.page.reset();
        self.page.set_page_type(PageType::FileHeader);
        self.page.as_mut_slice()[OFFSET_NAME..OFFSET_NAME + name.len()]
            .copy_from_slice(name.as_bytes());
        self.set_page_count(1);
        self.set_record_count(0);
        self.set_first_page(PageId::INVALID);
        self.set_last_page(PageId::INVALID);
        Ok(())
    }

    pub fn set_page_count(&mut self, count: u32) {
        self.page.write_u32(OFFSET_PAGE_COUNT, count);
    }

    pub fn set_record_count(&mut self, count: u32) {
        self.page.write_u32(OFFSET_RECORD_COUNT, count);
    }

    pub fn set_first_page(&mut self, page_no: PageId) {
        self.page.write_page_id(OFFSET_FIRST_PAGE, page_no);
    }

    pub fn set_last_page(&mut self, page_no: PageId) {
        self.page.write_page_id(OFFSET_LAST_PAGE, page_no);
    }
}
