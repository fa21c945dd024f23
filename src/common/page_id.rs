//! Page identifier type.

use std::fmt;

/// Page number within one page store.
///
/// Page numbers are only unique per file; the buffer manager pairs them
/// with a [`FileId`](super::FileId). [`PageId::INVALID`] terminates a heap
/// file's page chain and the store's free list.
///
/// # Example
/// ```
/// use heapstore::PageId;
///
/// assert!(PageId::new(42).is_valid());
/// assert!(!PageId::INVALID.is_valid());
/// assert!(PageId::new(1) < PageId::new(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    pub const INVALID: PageId = PageId(u32::MAX);

    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.is_valid() {
            true => write!(f, "Page({})", self.0),
            false => f.write_str("Page(none)"),
        }
    }
}
