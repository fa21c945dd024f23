//! Page - one 4KB block as it sits in a buffer frame or on disk.
//!
//! A [`Page`] is plain bytes. [`DataPage`](super::DataPage) and
//! [`HeaderPage`](super::HeaderPage) wrap it to give those bytes meaning;
//! this type only offers little-endian field access and the checksum
//! stamp shared by every format.

use crate::common::config::PAGE_SIZE;
use crate::common::PageId;

use super::page_header::{PageHeader, PageType};

/// A page-sized, page-aligned byte block.
///
/// Not `Clone`: frames copy pages in and out with [`Page::copy_from`].
///
/// # Example
/// ```
/// use heapstore::storage::page::Page;
/// use heapstore::PageId;
///
/// let mut page = Page::new();
/// page.write_page_id(12, PageId::new(7));
/// assert_eq!(page.read_page_id(12), PageId::new(7));
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// A zeroed page. Its type reads as [`PageType::Invalid`].
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    pub fn copy_from(&mut self, other: &Page) {
        self.data.copy_from_slice(&other.data);
    }

    pub fn header(&self) -> PageHeader {
        PageHeader::read(&self.data)
    }

    pub fn page_type(&self) -> PageType {
        PageType::from(self.data[PageHeader::TYPE_AT])
    }

    /// Set the type byte. The checksum is left stale until the next stamp.
    pub fn set_page_type(&mut self, page_type: PageType) {
        self.data[PageHeader::TYPE_AT] = page_type as u8;
    }

    /// Store the checksum of the current contents. The page store calls
    /// this on every write.
    pub fn stamp(&mut self) {
        PageHeader::stamp(&mut self.data);
    }

    /// False if the page claims a type but its checksum does not match.
    pub fn is_intact(&self) -> bool {
        PageHeader::is_intact(&self.data)
    }

    // ========================================================================
    // Little-endian fields
    // ========================================================================

    #[inline]
    pub fn read_u16(&self, offset: usize) -> u16 {
        let mut bytes = [0u8; 2];
        bytes.copy_from_slice(&self.data[offset..offset + 2]);
        u16::from_le_bytes(bytes)
    }

    #[inline]
    pub fn write_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[offset..offset + 4]);
        u32::from_le_bytes(bytes)
    }

    #[inline]
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Page links are stored as four little-endian bytes.
    #[inline]
    pub fn read_page_id(&self, offset: usize) -> PageId {
        PageId::new(self.read_u32(offset))
    }

    #[inline]
    pub fn write_page_id(&mut self, offset: usize, page_no: PageId) {
        self.write_u32(offset, page_no.0);
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
