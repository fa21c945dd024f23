//! File identifier type.

use std::fmt;

/// Identifies an open page store.
///
/// The buffer manager keys resident pages by `(FileId, PageId)`, so two
/// files can cache the same page number without colliding. Ids are handed
/// out by the [`FileManager`](crate::storage::FileManager) on first open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}
