//! Frame descriptors - per-frame bookkeeping for the buffer pool.
//!
//! A [`FrameDescriptor`] records which page (if any) a frame holds, plus the
//! flags the clock policy reads:
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//! - Reference bit for second-chance retention
//!
//! The raw page bytes live in a separate pool owned by the
//! [`BufferManager`](crate::buffer::BufferManager); descriptors and pages are
//! matched by [`FrameId`].

use std::sync::Arc;

use crate::common::{FileId, FrameId, PageId};
use crate::storage::PagedFile;

/// Replacement state of a frame, derived from its descriptor.
///
/// The order of the checks in [`FrameDescriptor::state`] is the order the
/// clock applies them: an invalid frame is free, a set reference bit buys a
/// second chance (even while pinned), a pin blocks eviction, and only then is
/// the frame a victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Holds no page; immediately reusable.
    Free,
    /// Reference bit set; survives the next pass of the clock hand.
    Referenced,
    /// In use by at least one caller.
    Pinned,
    /// Unpinned with reference bit clear; `dirty` means it needs write-back.
    Evictable { dirty: bool },
}

/// Bookkeeping for one frame of the buffer pool.
///
/// # Invariants
/// - `valid == false` implies `pin_count == 0`, `!dirty`, `!ref_bit`.
/// - A valid frame has exactly one entry in the frame index.
#[derive(Clone)]
pub struct FrameDescriptor {
    pub(crate) file: Option<Arc<PagedFile>>,
    pub(crate) page_no: PageId,
    pub(crate) valid: bool,
    pub(crate) dirty: bool,
    pub(crate) ref_bit: bool,
    pub(crate) pin_count: u32,
}

impl FrameDescriptor {
    /// An empty, invalid descriptor.
    pub fn new() -> Self {
        Self {
            file: None,
            page_no: PageId::INVALID,
            valid: false,
            dirty: false,
            ref_bit: false,
            pin_count: 0,
        }
    }

    pub fn state(&self) -> FrameState {
        if !self.valid {
            FrameState::Free
        } else if self.ref_bit {
            FrameState::Referenced
        } else if self.pin_count > 0 {
            FrameState::Pinned
        } else {
            FrameState::Evictable { dirty: self.dirty }
        }
    }

    /// Bind the frame to a freshly loaded page: valid, referenced, pinned
    /// once, clean.
    pub(crate) fn set(&mut self, file: Arc<PagedFile>, page_no: PageId) {
        self.file = Some(file);
        self.page_no = page_no;
        self.valid = true;
        self.dirty = false;
        self.ref_bit = true;
        self.pin_count = 1;
    }

    /// Return the descriptor to the invalid state.
    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    /// Clear the reference bit as the clock hand passes.
    pub(crate) fn clear_reference(&mut self) {
        self.ref_bit = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn page_no(&self) -> PageId {
        self.page_no
    }

    /// Identity of the owning file, if the descriptor is tagged with one.
    pub fn file_id(&self) -> Option<FileId> {
        self.file.as_ref().map(|f| f.id())
    }

    pub(crate) fn belongs_to(&self, file: FileId) -> bool {
        self.file_id() == Some(file)
    }

    pub(crate) fn info(&self, frame: FrameId) -> FrameInfo {
        FrameInfo {
            frame,
            file: self.file_id(),
            page_no: self.page_no,
            state: self.state(),
            pin_count: self.pin_count,
            dirty: self.dirty,
        }
    }
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of one descriptor, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame: FrameId,
    pub file: Option<FileId>,
    pub page_no: PageId,
    pub state: FrameState,
    pub pin_count: u32,
    pub dirty: bool,
}
