//! Scoped pins.
//!
//! A [`PageGuard`] owns one pin on a buffered page together with the
//! frame's lock, and hands the pin back to the [`BufferManager`] when it
//! goes out of scope. The page is released dirty only if it was borrowed
//! mutably through the guard. A failed release cannot be reported from
//! `Drop`, so it is logged.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;
use crate::storage::PagedFile;

use super::buffer_manager::BufferManager;

/// Shared access; always released clean.
pub type PageReadGuard<'a> = PageGuard<'a, RwLockReadGuard<'a, Page>>;

/// Exclusive access.
///
/// ```ignore
/// let mut guard = bufs.new_page(&file)?;
/// let page_no = guard.page_id();
/// DataPage::new(&mut *guard).init(page_no);
/// // dropped here: released dirty
/// ```
pub type PageWriteGuard<'a> = PageGuard<'a, RwLockWriteGuard<'a, Page>>;

/// A pinned page plus the lock `L` on its frame.
pub struct PageGuard<'a, L> {
    bufs: &'a BufferManager,
    file: Arc<PagedFile>,
    frame_id: FrameId,
    page_id: PageId,
    dirty: bool,
    lock: L,
}

impl<'a, L> PageGuard<'a, L> {
    pub(crate) fn new(
        bufs: &'a BufferManager,
        file: Arc<PagedFile>,
        frame_id: FrameId,
        page_id: PageId,
        lock: L,
    ) -> Self {
        Self {
            bufs,
            file,
            frame_id,
            page_id,
            dirty: false,
            lock,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Whether the page will be released dirty.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl<L: Deref<Target = Page>> Deref for PageGuard<'_, L> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.dirty = true;
        &mut self.lock
    }
}

impl<L> Drop for PageGuard<'_, L> {
    fn drop(&mut self) {
        if let Err(e) = self.bufs.release_page(&self.file, self.page_id, self.dirty) {
            warn!(
                file = %self.file.id(),
                page = %self.page_id,
                error = %e,
                "page guard release failed"
            );
        }
    }
}
