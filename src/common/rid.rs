//! Record identifier type.

use std::fmt;

use super::PageId;

/// Locates a record: the data page holding it and its slot on that page.
///
/// Unique among the live records of one heap file. A slot may be reused
/// after its record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page_no: PageId,
    pub slot_no: u16,
}

impl Rid {
    #[inline]
    pub fn new(page_no: PageId, slot_no: u16) -> Self {
        Self { page_no, slot_no }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}.{})", self.page_no.0, self.slot_no)
    }
}
