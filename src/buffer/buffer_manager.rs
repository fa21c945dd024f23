//! Buffer Manager - the page caching layer.
//!
//! The [`BufferManager`] provides:
//! - Page caching between page files and memory
//! - Pin-based reference counting
//! - CLOCK replacement with write-back of dirty victims
//! - Per-file flush and page disposal

use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{
    BufferStats, FrameDescriptor, FrameIndex, FrameInfo, FrameState, PageReadGuard,
    PageWriteGuard,
};
use crate::common::config::DisposePolicy;
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// Manages a fixed pool of frames caching pages of any number of files.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                       BufferManager                          │
/// │  ┌───────────────────┐   ┌────────────────────────────────┐  │
/// │  │ index             │   │ pool: Vec<RwLock<Page>>        │  │
/// │  │ (file, page) → Fid│──▶│ [Page0] [Page1] [Page2] ...    │  │
/// │  └───────────────────┘   └────────────────────────────────┘  │
/// │  ┌───────────────────┐   ┌────────────────────────────────┐  │
/// │  │ clock hand        │──▶│ table: Vec<FrameDescriptor>    │  │
/// │  └───────────────────┘   └────────────────────────────────┘  │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - Descriptor table, index and clock sit behind one `Mutex` and are only
///   touched inside a single call.
/// - Each page has its own `RwLock`; callers take it through [`page`] or
///   [`page_mut`] while they hold a pin.
/// - The bookkeeping lock may be held while a page lock is taken (for
///   write-back), never the other way round, so callers must not hold a page
///   lock on a frame whose pin they are about to drop and re-fetch.
///
/// [`page`]: BufferManager::page
/// [`page_mut`]: BufferManager::page_mut
///
/// # Usage
/// ```ignore
/// let bufs = BufferManager::new(16);
/// let (page_no, frame) = bufs.allocate_page(&file)?;
/// bufs.page_mut(frame).as_mut_slice()[100] = 0xAB;
/// bufs.release_page(&file, page_no, true)?;
///
/// let frame = bufs.fetch_page(&file, page_no)?;
/// assert_eq!(bufs.page(frame).as_slice()[100], 0xAB);
/// bufs.release_page(&file, page_no, false)?;
/// ```
pub struct BufferManager {
    /// Raw page contents, one per frame.
    pool: Vec<RwLock<Page>>,

    /// Descriptor table, frame index and clock hand.
    state: Mutex<PoolState>,

    stats: BufferStats,

    dispose_policy: DisposePolicy,

    /// Number of frames in the pool (immutable after construction).
    capacity: usize,
}

struct PoolState {
    table: Vec<FrameDescriptor>,
    index: FrameIndex,
    clock: ClockReplacer,
}

impl BufferManager {
    /// Create a buffer manager with `capacity` frames.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, DisposePolicy::default())
    }

    /// Create a buffer manager with an explicit dispose policy.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn with_policy(capacity: usize, dispose_policy: DisposePolicy) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            pool: (0..capacity).map(|_| RwLock::new(Page::new())).collect(),
            state: Mutex::new(PoolState {
                table: vec![FrameDescriptor::new(); capacity],
                index: FrameIndex::new(capacity),
                clock: ClockReplacer::new(capacity),
            }),
            stats: BufferStats::new(),
            dispose_policy,
            capacity,
        }
    }

    // ========================================================================
    // Public API: Pin and release
    // ========================================================================

    /// Pin page `page_no` of `file`, reading it in if it is not resident.
    ///
    /// On a hit the reference bit is set and the pin count incremented. On a
    /// miss a frame is chosen by the clock, the page is read into it and the
    /// frame starts referenced with a pin count of 1.
    ///
    /// # Errors
    /// - `Error::CapacityExceeded` if every frame is pinned
    /// - `Error::PageNotFound` / `Error::Io` from the page store
    /// - `Error::HashTable` if the frame index rejects the entry
    pub fn fetch_page(&self, file: &Arc<PagedFile>, page_no: PageId) -> Result<FrameId> {
        let mut state = self.state.lock();

        if let Ok(frame_id) = state.index.lookup(file.id(), page_no) {
            let desc = &mut state.table[frame_id.0];
            desc.ref_bit = true;
            desc.pin_count += 1;
            BufferStats::bump(&self.stats.hits);
            trace!(file = %file.id(), page = %page_no, frame = %frame_id, "buffer hit");
            return Ok(frame_id);
        }

        BufferStats::bump(&self.stats.misses);
        debug!(file = %file.id(), page = %page_no, "buffer miss, reading page");

        let frame_id = self.allocate_frame(&mut state)?;
        let page = file.read_page(page_no)?;
        BufferStats::bump(&self.stats.pages_read);
        self.pool[frame_id.0].write().copy_from(&page);

        state.index.insert(file.id(), page_no, frame_id)?;
        state.table[frame_id.0].set(Arc::clone(file), page_no);
        Ok(frame_id)
    }

    /// Drop one pin on a resident page, optionally marking it dirty.
    ///
    /// # Errors
    /// - `Error::NotFound` if the page is not resident
    /// - `Error::PageNotPinned` if its pin count is already 0
    pub fn release_page(&self, file: &PagedFile, page_no: PageId, dirty: bool) -> Result<()> {
        let mut state = self.state.lock();
        let frame_id = state.index.lookup(file.id(), page_no)?;
        let desc = &mut state.table[frame_id.0];

        if desc.pin_count == 0 {
            return Err(Error::PageNotPinned {
                file: file.id(),
                page: page_no,
            });
        }
        if dirty {
            desc.dirty = true;
        }
        desc.pin_count -= 1;
        Ok(())
    }

    // ========================================================================
    // Public API: Create and dispose pages
    // ========================================================================

    /// Allocate a fresh page in `file` and pin it in a zeroed frame.
    ///
    /// The store is asked for the page number first, so a capacity failure
    /// leaves an allocated but unbuffered page behind.
    ///
    /// # Errors
    /// - `Error::Io` from the page store
    /// - `Error::CapacityExceeded` if every frame is pinned
    /// - `Error::HashTable` if the frame index rejects the entry
    pub fn allocate_page(&self, file: &Arc<PagedFile>) -> Result<(PageId, FrameId)> {
        let page_no = file.allocate_page()?;

        let mut state = self.state.lock();
        let frame_id = self.allocate_frame(&mut state)?;
        state.index.insert(file.id(), page_no, frame_id)?;
        state.table[frame_id.0].set(Arc::clone(file), page_no);
        self.pool[frame_id.0].write().reset();

        BufferStats::bump(&self.stats.pages_allocated);
        debug!(file = %file.id(), page = %page_no, frame = %frame_id, "allocated page");
        Ok((page_no, frame_id))
    }

    /// Drop a page from the pool (if resident) and free it in its file.
    ///
    /// Under [`DisposePolicy::Unconditional`] the frame is cleared even if it
    /// is still pinned; any outstanding pins are forgotten.
    ///
    /// # Errors
    /// - `Error::PagePinned` under [`DisposePolicy::RejectPinned`]
    /// - `Error::Io` / `Error::PageNotFound` from the page store
    pub fn dispose_page(&self, file: &PagedFile, page_no: PageId) -> Result<()> {
        {
            let mut state = self.state.lock();
            if let Ok(frame_id) = state.index.lookup(file.id(), page_no) {
                let desc = &mut state.table[frame_id.0];
                if desc.pin_count > 0 && self.dispose_policy == DisposePolicy::RejectPinned {
                    return Err(Error::PagePinned {
                        file: file.id(),
                        page: page_no,
                    });
                }
                desc.clear();
                state.index.remove(file.id(), page_no);
            }
        }
        file.dispose_page(page_no)
    }

    // ========================================================================
    // Public API: Flush
    // ========================================================================

    /// Write back and unbind every frame belonging to `file`.
    ///
    /// Not atomic: frames handled before a failure stay flushed.
    ///
    /// # Errors
    /// - `Error::PagePinned` at the first pinned page of the file
    /// - `Error::BadBuffer` for an invalid frame still tagged with the file
    /// - `Error::Io` from the write-back
    pub fn flush_file(&self, file: &PagedFile) -> Result<()> {
        let mut state = self.state.lock();
        let PoolState { table, index, .. } = &mut *state;
        let mut flushed = 0usize;

        for (i, desc) in table.iter_mut().enumerate() {
            if !desc.belongs_to(file.id()) {
                continue;
            }
            if !desc.valid {
                return Err(Error::BadBuffer(FrameId::new(i)));
            }
            if desc.pin_count > 0 {
                return Err(Error::PagePinned {
                    file: file.id(),
                    page: desc.page_no,
                });
            }
            if desc.dirty {
                file.write_page(desc.page_no, &self.pool[i].read())?;
                BufferStats::bump(&self.stats.pages_written);
                desc.dirty = false;
            }
            index.remove(file.id(), desc.page_no);
            desc.clear();
            flushed += 1;
        }

        debug!(file = %file.id(), frames = flushed, "flushed file");
        Ok(())
    }

    // ========================================================================
    // Public API: Page access
    // ========================================================================

    /// Shared access to a frame's page. The caller must hold a pin on it.
    ///
    /// # Panics
    /// Panics if `frame_id` is outside the pool.
    #[inline]
    pub fn page(&self, frame_id: FrameId) -> RwLockReadGuard<'_, Page> {
        self.pool[frame_id.0].read()
    }

    /// Exclusive access to a frame's page. The caller must hold a pin on it.
    ///
    /// # Panics
    /// Panics if `frame_id` is outside the pool.
    #[inline]
    pub fn page_mut(&self, frame_id: FrameId) -> RwLockWriteGuard<'_, Page> {
        self.pool[frame_id.0].write()
    }

    /// Fetch a page behind a guard that releases it clean on drop.
    pub fn fetch_page_read(
        &self,
        file: &Arc<PagedFile>,
        page_no: PageId,
    ) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page(file, page_no)?;
        Ok(PageReadGuard::new(
            self,
            Arc::clone(file),
            frame_id,
            page_no,
            self.page(frame_id),
        ))
    }

    /// Fetch a page behind a guard that releases it dirty if written through.
    pub fn fetch_page_write(
        &self,
        file: &Arc<PagedFile>,
        page_no: PageId,
    ) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page(file, page_no)?;
        Ok(PageWriteGuard::new(
            self,
            Arc::clone(file),
            frame_id,
            page_no,
            self.page_mut(frame_id),
        ))
    }

    /// Allocate a page and return it behind a write guard.
    pub fn new_page(&self, file: &Arc<PagedFile>) -> Result<PageWriteGuard<'_>> {
        let (page_no, frame_id) = self.allocate_page(file)?;
        Ok(PageWriteGuard::new(
            self,
            Arc::clone(file),
            frame_id,
            page_no,
            self.page_mut(frame_id),
        ))
    }

    // ========================================================================
    // Public API: Stats and diagnostics
    // ========================================================================

    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Number of frames in the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pin count of a resident page, `None` if not resident.
    pub fn pin_count(&self, file: &PagedFile, page_no: PageId) -> Option<u32> {
        let state = self.state.lock();
        let frame_id = state.index.lookup(file.id(), page_no).ok()?;
        Some(state.table[frame_id.0].pin_count)
    }

    /// Frame holding a resident page, `None` if not resident.
    pub fn frame_of(&self, file: &PagedFile, page_no: PageId) -> Option<FrameId> {
        self.state.lock().index.lookup(file.id(), page_no).ok()
    }

    /// # Panics
    /// Panics if `frame_id` is outside the pool.
    pub fn frame_state(&self, frame_id: FrameId) -> FrameState {
        self.state.lock().table[frame_id.0].state()
    }

    /// Snapshot of every descriptor, in frame order.
    pub fn frames(&self) -> Vec<FrameInfo> {
        let state = self.state.lock();
        state
            .table
            .iter()
            .enumerate()
            .map(|(i, desc)| desc.info(FrameId::new(i)))
            .collect()
    }

    /// Number of valid frames.
    pub fn resident_count(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Current clock hand position.
    pub fn clock_hand(&self) -> FrameId {
        self.state.lock().clock.hand()
    }

    /// Check that the frame index and the descriptor table agree.
    ///
    /// # Errors
    /// `Error::BadBuffer` naming the first inconsistent frame.
    pub fn verify_index(&self) -> Result<()> {
        let state = self.state.lock();

        for (i, desc) in state.table.iter().enumerate() {
            let frame_id = FrameId::new(i);
            let consistent = match (desc.valid, desc.file_id()) {
                (true, Some(file)) => state.index.lookup(file, desc.page_no).ok() == Some(frame_id),
                (true, None) => false,
                (false, file) => {
                    file.is_none() && desc.pin_count == 0 && !desc.dirty && !desc.ref_bit
                }
            };
            if !consistent {
                return Err(Error::BadBuffer(frame_id));
            }
        }

        for (file, page_no, frame_id) in state.index.iter() {
            let desc = state
                .table
                .get(frame_id.0)
                .ok_or(Error::BadBuffer(frame_id))?;
            if !desc.valid || !desc.belongs_to(file) || desc.page_no != page_no {
                return Err(Error::BadBuffer(frame_id));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Internal: Frame allocation
    // ========================================================================

    /// Pick a frame with the clock and make it free.
    ///
    /// A dirty victim is written back first; if that write fails the call
    /// aborts and the victim keeps its page.
    fn allocate_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        let PoolState {
            table,
            index,
            clock,
        } = state;

        let frame_id = clock.victim(table).ok_or(Error::CapacityExceeded)?;
        let desc = &table[frame_id.0];

        match (desc.valid, desc.file.as_deref()) {
            (true, Some(file)) => {
                if desc.dirty {
                    file.write_page(desc.page_no, &self.pool[frame_id.0].read())?;
                    BufferStats::bump(&self.stats.pages_written);
                }
                index.remove(file.id(), desc.page_no);
                BufferStats::bump(&self.stats.evictions);
                trace!(file = %file.id(), page = %desc.page_no, frame = %frame_id, "evicted page");
            }
            // Stale entry left behind by an invalid frame
            (false, Some(file)) => {
                if index.lookup(file.id(), desc.page_no).ok() == Some(frame_id) {
                    index.remove(file.id(), desc.page_no);
                }
            }
            _ => {}
        }

        table[frame_id.0].clear();
        Ok(frame_id)
    }
}

impl Drop for BufferManager {
    /// Best-effort write-back of dirty frames; failures are only logged.
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (i, desc) in state.table.iter().enumerate() {
            if !(desc.valid && desc.dirty) {
                continue;
            }
            if let Some(file) = desc.file.as_deref() {
                if let Err(e) = file.write_page(desc.page_no, &self.pool[i].read()) {
                    warn!(file = %file.id(), page = %desc.page_no, error = %e, "write-back on teardown failed");
                }
            }
        }
    }
}
