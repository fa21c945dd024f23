//! Heap file scan - a filtered cursor over the page chain.

use tracing::{trace, warn};

use crate::common::config::WindowPolicy;
use crate::common::{Error, PageId, Result, Rid};
use crate::heap::predicate::{Datatype, Operator, ScanFilter};
use crate::heap::HeapFile;

/// Cursor position saved by [`HeapFileScan::mark_scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScanMark {
    page_no: Option<PageId>,
    rid: Option<Rid>,
}

/// A predicate-filtered traversal of a [`HeapFile`].
///
/// The scan borrows the handle's current-page pin as its cursor page, so at
/// most one data page (plus the header) is pinned at any time. Dropping the
/// scan ends it.
///
/// # Example
/// ```ignore
/// let mut heap = HeapFile::open(&db, "emp")?;
/// let mut scan = heap.scan()?;
/// scan.start_scan(0, 4, Datatype::Integer, Some(&50i32.to_le_bytes()), Operator::Gt)?;
/// while let Ok(rid) = scan.scan_next() {
///     let record = scan.current_record()?;
/// }
/// ```
pub struct HeapFileScan<'h, 'a> {
    heap: &'h mut HeapFile<'a>,
    filter: Option<ScanFilter>,
    mark: Option<ScanMark>,
    window_policy: WindowPolicy,
}

impl<'a> HeapFile<'a> {
    /// Start a scan from the head of the page chain. It matches every record
    /// until [`HeapFileScan::start_scan`] installs a filter.
    ///
    /// # Errors
    /// Any buffer manager error while releasing a current page that is not
    /// the first page.
    pub fn scan(&mut self) -> Result<HeapFileScan<'_, 'a>> {
        if self.current_page_no() != Some(self.first_page()) {
            self.release_current(self.current_dirty)?;
        }
        self.cur_rid = None;

        let window_policy = self.db.config().window_policy;
        Ok(HeapFileScan {
            heap: self,
            filter: None,
            mark: None,
            window_policy,
        })
    }
}

impl<'h, 'a> HeapFileScan<'h, 'a> {
    /// Install the scan predicate; `None` matches every record.
    ///
    /// # Errors
    /// `Error::BadScanParam` if the parameters are inconsistent; the
    /// previous predicate is kept in that case.
    pub fn start_scan(
        &mut self,
        offset: i32,
        length: i32,
        ty: Datatype,
        filter: Option<&[u8]>,
        op: Operator,
    ) -> Result<()> {
        self.filter = match filter {
            None => None,
            Some(bytes) => Some(ScanFilter::new(offset, length, ty, bytes, op)?),
        };
        Ok(())
    }

    /// Advance to the next matching record and return its id.
    ///
    /// # Errors
    /// `Error::EndOfFile` once the last page is exhausted; the cursor stays
    /// on the last page, so further calls keep returning `EndOfFile`.
    pub fn scan_next(&mut self) -> Result<Rid> {
        if self.heap.current.is_none() {
            let first = self.heap.first_page();
            if !first.is_valid() {
                return Err(Error::EndOfFile);
            }
            self.heap.pin_current(first)?;
            self.heap.cur_rid = None;
        }

        loop {
            let (page_no, next_page) = {
                let page = self.heap.current_page()?;
                let page_no = page.page_no();

                let mut candidate = match self.heap.cur_rid {
                    Some(rid) if rid.page_no == page_no => page.next_record(rid),
                    _ => page.first_record(),
                };
                while let Some(rid) = candidate {
                    if self.matches(page.record(rid)?)? {
                        self.heap.cur_rid = Some(rid);
                        return Ok(rid);
                    }
                    candidate = page.next_record(rid);
                }
                (page_no, page.next_page())
            };

            if page_no == self.heap.last_page() || !next_page.is_valid() {
                return Err(Error::EndOfFile);
            }

            trace!(from = %page_no, to = %next_page, "scan advancing");
            self.heap.release_current(self.heap.current_dirty)?;
            self.heap.pin_current(next_page)?;
        }
    }

    fn matches(&self, record: &[u8]) -> Result<bool> {
        match &self.filter {
            None => Ok(true),
            Some(filter) => filter.matches(record, self.window_policy),
        }
    }

    /// Copy out the record under the cursor.
    ///
    /// # Errors
    /// `Error::NoCurrentRecord` if the cursor is not on a record.
    pub fn current_record(&self) -> Result<Vec<u8>> {
        let rid = self.cursor()?;
        self.heap.read_current(rid)
    }

    /// Id of the record under the cursor.
    pub fn current_rid(&self) -> Option<Rid> {
        self.cursor().ok()
    }

    fn cursor(&self) -> Result<Rid> {
        match (self.heap.cur_rid, self.heap.current_page_no()) {
            (Some(rid), Some(page_no)) if rid.page_no == page_no => Ok(rid),
            _ => Err(Error::NoCurrentRecord),
        }
    }

    /// Snapshot the cursor so [`reset_scan`](Self::reset_scan) can return
    /// to it.
    pub fn mark_scan(&mut self) {
        self.mark = Some(ScanMark {
            page_no: self.heap.current_page_no(),
            rid: self.heap.cur_rid,
        });
    }

    /// Return the cursor to the last mark.
    ///
    /// Re-pins the marked page (clean) only if the cursor has moved off it.
    ///
    /// # Errors
    /// `Error::ScanNotMarked` without a prior mark.
    pub fn reset_scan(&mut self) -> Result<()> {
        let mark = self.mark.ok_or(Error::ScanNotMarked)?;

        if self.heap.current_page_no() != mark.page_no {
            self.heap.release_current(self.heap.current_dirty)?;
            if let Some(page_no) = mark.page_no {
                self.heap.pin_current(page_no)?;
            }
        }
        self.heap.cur_rid = mark.rid;
        Ok(())
    }

    /// Release the cursor page and forget the position.
    pub fn end_scan(&mut self) -> Result<()> {
        self.heap.cur_rid = None;
        self.heap.release_current(self.heap.current_dirty)
    }

    /// Delete the record under the cursor.
    ///
    /// The cursor keeps its position, so the next `scan_next` continues with
    /// the record after the deleted one.
    ///
    /// # Errors
    /// `Error::NoCurrentRecord` if the cursor is not on a record.
    pub fn delete_record(&mut self) -> Result<()> {
        let rid = self.cursor()?;
        self.heap.current_page_mut()?.delete_record(rid)?;

        let mut header = self.heap.header_page_mut();
        let count = header.record_count();
        debug_assert!(count > 0, "header record count out of step with data pages");
        header.set_record_count(count.saturating_sub(1));
        Ok(())
    }

    /// Note that the caller modified the current page in place.
    pub fn mark_dirty(&mut self) {
        if self.heap.current.is_some() {
            self.heap.current_dirty = true;
        }
    }

    /// Iterate over the remaining matches as `(rid, bytes)` pairs.
    ///
    /// The iterator stops at end of file and yields any other error once.
    pub fn records(&mut self) -> Records<'_, 'h, 'a> {
        Records {
            scan: self,
            done: false,
        }
    }
}

impl Drop for HeapFileScan<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self.end_scan() {
            warn!(file = self.heap.file.name(), error = %e, "end of scan on drop failed");
        }
    }
}

/// Iterator returned by [`HeapFileScan::records`].
pub struct Records<'s, 'h, 'a> {
    scan: &'s mut HeapFileScan<'h, 'a>,
    done: bool,
}

impl Iterator for Records<'_, '_, '_> {
    type Item = Result<(Rid, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .scan
            .scan_next()
            .and_then(|rid| Ok((rid, self.scan.current_record()?)));
        match item {
            Err(Error::EndOfFile) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(item) => Some(Ok(item)),
        }
    }
}
