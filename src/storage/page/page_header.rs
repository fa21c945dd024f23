//! The five bytes every on-disk page starts with: a type tag and a CRC32
//! of the rest of the page.
//!
//! The page store stamps the checksum when it writes a page and checks it
//! when it reads one back. Typed views lay out their own fields after
//! [`PageHeader::SIZE`].

/// What a page holds. Stored as one byte at offset 0.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Never written, or zeroed by allocation. Carries no checksum.
    #[default]
    Invalid = 0,
    /// Page 0 of every store: free list and first-page pointer.
    StoreMeta = 1,
    /// Heap file header page.
    FileHeader = 2,
    /// Slotted heap-file data page.
    Data = 3,
    /// Page on the store's free list.
    Free = 4,
}

impl From<u8> for PageType {
    /// Unknown tags read as `Invalid`.
    fn from(tag: u8) -> Self {
        match tag {
            1 => PageType::StoreMeta,
            2 => PageType::FileHeader,
            3 => PageType::Data,
            4 => PageType::Free,
            _ => PageType::Invalid,
        }
    }
}

impl PageType {
    /// Whether pages of this type are checksummed on write.
    pub fn is_stamped(self) -> bool {
        self != PageType::Invalid
    }
}

/// Decoded page prefix.
///
/// ```text
/// byte 0      page type
/// bytes 1..5  CRC32 of the page with these four bytes zeroed (LE)
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
}

impl PageHeader {
    pub const SIZE: usize = 5;

    pub(crate) const TYPE_AT: usize = 0;
    pub(crate) const CHECKSUM_AT: usize = 1;

    /// Decode the prefix of `page`.
    ///
    /// # Panics
    /// Panics if `page` is shorter than [`PageHeader::SIZE`].
    pub fn read(page: &[u8]) -> Self {
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&page[Self::CHECKSUM_AT..Self::CHECKSUM_AT + 4]);
        Self {
            page_type: PageType::from(page[Self::TYPE_AT]),
            checksum: u32::from_le_bytes(checksum),
        }
    }

    /// CRC32 over `page`, reading the checksum field as zeros.
    pub fn checksum_of(page: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page[..Self::CHECKSUM_AT]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page[Self::CHECKSUM_AT + 4..]);
        hasher.finalize()
    }

    /// Write the checksum of `page` into its header.
    pub fn stamp(page: &mut [u8]) {
        let checksum = Self::checksum_of(page);
        page[Self::CHECKSUM_AT..Self::CHECKSUM_AT + 4].copy_from_slice(&checksum.to_le_bytes());
    }

    /// True if `page` is unstamped or its stored checksum matches.
    pub fn is_intact(page: &[u8]) -> bool {
        let header = Self::read(page);
        !header.page_type.is_stamped() || header.checksum == Self::checksum_of(page)
    }
}
