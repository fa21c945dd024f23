//! Heap file handle - header page pin plus one current data page.

use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::common::config::ReadPolicy;
use crate::common::{Error, FrameId, PageId, Result, Rid};
use crate::storage::page::{DataPage, HeaderPage, Page, PageType};
use crate::storage::PagedFile;
use crate::Database;

/// A page this handle holds a pin on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pinned {
    pub(crate) page_no: PageId,
    pub(crate) frame: FrameId,
}

/// An open heap file.
///
/// The header page stays pinned for the handle's lifetime. At most one data
/// page (the *current* page) is pinned besides it; moving to another page
/// releases the current one first.
///
/// Scanning and appending are layered on top by borrowing the handle, see
/// [`HeapFile::scan`] and [`HeapFile::inserter`].
///
/// Close explicitly with [`HeapFile::close`] to see release errors; dropping
/// the handle closes it best-effort.
pub struct HeapFile<'a> {
    pub(crate) db: &'a Database,
    pub(crate) file: Arc<PagedFile>,
    header: Pinned,
    header_dirty: bool,
    pub(crate) current: Option<Pinned>,
    pub(crate) current_dirty: bool,
    pub(crate) cur_rid: Option<Rid>,
    closed: bool,
}

impl<'a> HeapFile<'a> {
    /// Open the heap file `name`.
    ///
    /// Pins the header page (the file's first page) and the first data page.
    ///
    /// # Errors
    /// `Error::FileNotFound` if no such file exists, or any buffer manager
    /// error while pinning. Nothing stays pinned or open on failure.
    pub fn open(db: &'a Database, name: &str) -> Result<Self> {
        let file = db.open_file(name)?;

        match Self::pin_initial(db, &file) {
            Ok((header, current)) => {
                debug!(file = name, header = %header.page_no, "opened heap file");
                Ok(Self {
                    db,
                    file,
                    header,
                    header_dirty: false,
                    current,
                    current_dirty: false,
                    cur_rid: None,
                    closed: false,
                })
            }
            Err(e) => {
                if let Err(close_err) = db.close_file(&file) {
                    warn!(file = name, error = %close_err, "close after failed open");
                }
                Err(e)
            }
        }
    }

    fn pin_initial(db: &Database, file: &Arc<PagedFile>) -> Result<(Pinned, Option<Pinned>)> {
        let bufs = db.buffers();
        let header_no = file.first_page()?;
        let header_frame = bufs.fetch_page(file, header_no)?;
        let header = Pinned {
            page_no: header_no,
            frame: header_frame,
        };

        let first = HeaderPage::new(bufs.page(header_frame)).first_page();
        if !first.is_valid() {
            return Ok((header, None));
        }
        match bufs.fetch_page(file, first) {
            Ok(frame) => Ok((
                header,
                Some(Pinned {
                    page_no: first,
                    frame,
                }),
            )),
            Err(e) => {
                bufs.release_page(file, header_no, false)?;
                Err(e)
            }
        }
    }

    /// Release both pins and close the underlying file.
    ///
    /// All three steps are attempted; the first error is returned.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let released = self.release_current(self.current_dirty);
        let header = self
            .db
            .buffers()
            .release_page(&self.file, self.header.page_no, self.header_dirty);
        let closed = self.db.close_file(&self.file);
        debug!(file = self.file.name(), "closed heap file");

        released.and(header).and(closed)
    }

    // ========================================================================
    // Public API
    // ========================================================================

    /// Copy out the record `rid`, making its page the current page.
    ///
    /// Switching pages releases the previous page per the database's
    /// [`ReadPolicy`].
    ///
    /// # Errors
    /// `Error::InvalidSlot` if the slot is empty or out of range or `rid`
    /// names a page that is not a data page, or any buffer manager error
    /// while switching pages.
    pub fn get_record(&mut self, rid: Rid) -> Result<Vec<u8>> {
        if self.current_page_no() != Some(rid.page_no) {
            let dirty = match self.db.config().read_policy {
                ReadPolicy::DirtyOnSwitch => true,
                ReadPolicy::CleanOnSwitch => self.current_dirty,
            };
            self.release_current(dirty)?;
            self.pin_current(rid.page_no)?;

            // The header page and any unformatted page hold no records.
            if self.current_page()?.page_type() != PageType::Data {
                self.release_current(false)?;
                return Err(Error::InvalidSlot {
                    page: rid.page_no.0,
                    slot: rid.slot_no,
                });
            }
        }

        let record = self.read_current(rid)?;
        self.cur_rid = Some(rid);
        Ok(record)
    }

    /// Number of live records, from the header page.
    pub fn record_count(&self) -> u32 {
        self.header_page().record_count()
    }

    /// Header page plus data pages.
    pub fn page_count(&self) -> u32 {
        self.header_page().page_count()
    }

    pub fn first_page(&self) -> PageId {
        self.header_page().first_page()
    }

    pub fn last_page(&self) -> PageId {
        self.header_page().last_page()
    }

    /// Name stored in the header page.
    pub fn file_name(&self) -> String {
        self.header_page().file_name()
    }

    /// Page the handle currently holds pinned, if any.
    pub fn current_page_no(&self) -> Option<PageId> {
        self.current.map(|c| c.page_no)
    }

    pub fn paged_file(&self) -> &Arc<PagedFile> {
        &self.file
    }

    // ========================================================================
    // Crate internals shared with scans and inserts
    // ========================================================================

    pub(crate) fn header_page(&self) -> HeaderPage<RwLockReadGuard<'a, Page>> {
        HeaderPage::new(self.db.buffers().page(self.header.frame))
    }

    /// Write access to the header page; marks it dirty.
    pub(crate) fn header_page_mut(&mut self) -> HeaderPage<RwLockWriteGuard<'a, Page>> {
        self.header_dirty = true;
        HeaderPage::new(self.db.buffers().page_mut(self.header.frame))
    }

    pub(crate) fn current_page(&self) -> Result<DataPage<RwLockReadGuard<'a, Page>>> {
        let current = self.current.ok_or(Error::NoCurrentRecord)?;
        Ok(DataPage::new(self.db.buffers().page(current.frame)))
    }

    /// Write access to the current page; marks it dirty.
    pub(crate) fn current_page_mut(&mut self) -> Result<DataPage<RwLockWriteGuard<'a, Page>>> {
        let current = self.current.ok_or(Error::NoCurrentRecord)?;
        self.current_dirty = true;
        Ok(DataPage::new(self.db.buffers().page_mut(current.frame)))
    }

    pub(crate) fn read_current(&self, rid: Rid) -> Result<Vec<u8>> {
        Ok(self.current_page()?.record(rid)?.to_vec())
    }

    /// Drop the pin on the current page, if any.
    pub(crate) fn release_current(&mut self, dirty: bool) -> Result<()> {
        if let Some(current) = self.current.take() {
            self.current_dirty = false;
            self.db
                .buffers()
                .release_page(&self.file, current.page_no, dirty)?;
        }
        Ok(())
    }

    /// Pin `page_no` as the (clean) current page. Any previous current page
    /// must already be released.
    pub(crate) fn pin_current(&mut self, page_no: PageId) -> Result<FrameId> {
        debug_assert!(self.current.is_none());
        let frame = self.db.buffers().fetch_page(&self.file, page_no)?;
        self.current = Some(Pinned { page_no, frame });
        self.current_dirty = false;
        Ok(frame)
    }

    /// Make an already pinned page current.
    pub(crate) fn adopt_current(&mut self, pinned: Pinned, dirty: bool) {
        debug_assert!(self.current.is_none());
        self.current = Some(pinned);
        self.current_dirty = dirty;
    }
}

impl Drop for HeapFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(file = self.file.name(), error = %e, "heap file close on drop failed");
        }
    }
}
