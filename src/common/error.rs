//! Error types for heapstore.
//!
//! Every operation reports its outcome through [`Result`]; the variants
//! below are the only error channel that crosses module boundaries.

use thiserror::Error;

use crate::common::{FileId, FrameId, PageId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in heapstore.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the page store. Never retried internally.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two full clock sweeps found no evictable frame.
    #[error("Buffer pool capacity exceeded: every frame is pinned")]
    CapacityExceeded,

    /// Released a page whose pin count was already zero.
    #[error("{page} of {file} is not pinned")]
    PageNotPinned { file: FileId, page: PageId },

    /// A pinned page blocked a flush or dispose.
    #[error("{page} of {file} is pinned")]
    PagePinned { file: FileId, page: PageId },

    /// The frame index is saturated or already holds the key.
    #[error("Frame index rejected {page} of {file}")]
    HashTable { file: FileId, page: PageId },

    /// The page is not resident in the buffer pool.
    #[error("{page} of {file} is not resident")]
    NotFound { file: FileId, page: PageId },

    /// A frame descriptor disagrees with the frame index.
    #[error("Inconsistent buffer descriptor for {0}")]
    BadBuffer(FrameId),

    /// Requested page does not exist in the page store.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// The page failed its checksum, or the store meta page is unreadable.
    #[error("Page {0} is corrupted")]
    Corrupted(u32),

    #[error("File already exists: {0}")]
    FileExists(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Destroying a file that still has open handles.
    #[error("File is open: {0}")]
    FileOpen(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    /// The slot is empty or out of range on its page.
    #[error("Invalid record slot {slot} on page {page}")]
    InvalidSlot { page: u32, slot: u16 },

    /// The record does not fit in the page's free space.
    #[error("Page {0} is full")]
    PageFull(u32),

    /// The record can never fit on a page.
    #[error("Invalid record length {len} (max {max})")]
    InvalidRecordLength { len: usize, max: usize },

    #[error("Bad scan parameter: {0}")]
    BadScanParam(String),

    /// The filter window extends past the end of a record.
    #[error("Filter window {offset}+{length} exceeds record length {record_len}")]
    FilterOutOfRange {
        offset: usize,
        length: usize,
        record_len: usize,
    },

    /// A scan ran off the last page of the file.
    #[error("End of file")]
    EndOfFile,

    /// The cursor does not point at a record.
    #[error("No current record")]
    NoCurrentRecord,

    /// `reset_scan` was called without a prior `mark_scan`.
    #[error("Scan has no mark")]
    ScanNotMarked,

    /// An insert named no value for one of the relation's attributes.
    #[error("No value for attribute {0}")]
    MissingAttribute(String),

    /// A value could not be converted to its attribute's type.
    #[error("Invalid value {value:?} for attribute {attr}")]
    InvalidValue { attr: String, value: String },
}

impl Error {
    /// True for the status that terminates a scan.
    pub fn is_end_of_file(&self) -> bool {
        matches!(self, Error::EndOfFile)
    }
}
