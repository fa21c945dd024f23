//! Insert file scan - appends records at the tail of the page chain.

use tracing::debug;

use crate::common::{Error, Result, Rid};
use crate::heap::heap_file::Pinned;
use crate::heap::HeapFile;
use crate::storage::page::{DataPage, MAX_RECORD_LEN};

/// Append-only access to a [`HeapFile`].
///
/// Records always go to the file's last page; when it is full a new page is
/// allocated, linked behind it and becomes the new tail.
pub struct InsertFileScan<'h, 'a> {
    heap: &'h mut HeapFile<'a>,
}

impl<'a> HeapFile<'a> {
    /// Borrow the handle for appending records.
    pub fn inserter(&mut self) -> InsertFileScan<'_, 'a> {
        InsertFileScan { heap: self }
    }
}

impl InsertFileScan<'_, '_> {
    /// Append a record and return its id.
    ///
    /// # Errors
    /// - `Error::InvalidRecordLength` if the record can never fit on a page;
    ///   nothing is changed
    /// - Any buffer manager error while moving to the tail or growing the
    ///   chain. Growth is not atomic: a failure part way through can leave
    ///   the new page allocated but unused.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<Rid> {
        if record.len() > MAX_RECORD_LEN {
            return Err(Error::InvalidRecordLength {
                len: record.len(),
                max: MAX_RECORD_LEN,
            });
        }

        let last = self.heap.last_page();
        if self.heap.current_page_no() != Some(last) {
            self.heap.release_current(self.heap.current_dirty)?;
            if last.is_valid() {
                self.heap.pin_current(last)?;
            } else {
                self.grow()?;
            }
        }

        let rid = match self.heap.current_page_mut()?.insert_record(record) {
            Ok(rid) => rid,
            Err(Error::PageFull(_)) => {
                self.grow()?;
                self.heap.current_page_mut()?.insert_record(record)?
            }
            Err(e) => return Err(e),
        };

        let mut header = self.heap.header_page_mut();
        let count = header.record_count();
        header.set_record_count(count + 1);
        drop(header);

        self.heap.cur_rid = Some(rid);
        Ok(rid)
    }

    /// Allocate an empty page, link it after the current tail and make it
    /// the current page.
    fn grow(&mut self) -> Result<()> {
        let bufs = self.heap.db.buffers();
        let (page_no, frame) = bufs.allocate_page(&self.heap.file)?;
        DataPage::new(bufs.page_mut(frame)).init(page_no);

        match self.heap.current {
            Some(_) => self.heap.current_page_mut()?.set_next_page(page_no),
            None => self.heap.header_page_mut().set_first_page(page_no),
        }

        let mut header = self.heap.header_page_mut();
        header.set_last_page(page_no);
        let pages = header.page_count();
        header.set_page_count(pages + 1);
        drop(header);

        self.heap.release_current(true)?;
        self.heap.adopt_current(Pinned { page_no, frame }, true);
        debug!(file = self.heap.file.name(), page = %page_no, "heap file grew");
        Ok(())
    }
}
