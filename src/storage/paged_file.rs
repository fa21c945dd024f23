//! Paged file - the persistent page store behind one heap file.
//!
//! The [`PagedFile`] handles all direct file operations:
//! - Reading and writing pages by number
//! - Allocating pages (reusing disposed ones first)
//! - Disposing pages onto a free list
//! - Remembering the first page ever allocated (the heap file header)

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};

/// Identifies a heapstore page file ("HPST").
const STORE_MAGIC: u32 = 0x4850_5354;

const META_PAGE: PageId = PageId(0);
const OFFSET_MAGIC: usize = PageHeader::SIZE;
const OFFSET_NUM_PAGES: usize = OFFSET_MAGIC + 4;
const OFFSET_FREE_HEAD: usize = OFFSET_NUM_PAGES + 4;
const OFFSET_FIRST_PAGE: usize = OFFSET_FREE_HEAD + 4;

/// Offset of the next-free link inside a disposed page.
const OFFSET_NEXT_FREE: usize = PageHeader::SIZE;

/// In-memory copy of page 0.
#[derive(Debug, Clone, Copy)]
struct StoreMeta {
    num_pages: u32,
    free_head: PageId,
    first_page: PageId,
}

impl StoreMeta {
    fn to_page(self) -> Page {
        let mut page = Page::new();
        page.set_page_type(PageType::StoreMeta);
        page.write_u32(OFFSET_MAGIC, STORE_MAGIC);
        page.write_u32(OFFSET_NUM_PAGES, self.num_pages);
        page.write_page_id(OFFSET_FREE_HEAD, self.free_head);
        page.write_page_id(OFFSET_FIRST_PAGE, self.first_page);
        page
    }

    fn from_page(page: &Page) -> Result<Self> {
        if page.page_type() != PageType::StoreMeta
            || page.read_u32(OFFSET_MAGIC) != STORE_MAGIC
            || !page.is_intact()
        {
            return Err(Error::Corrupted(META_PAGE.0));
        }
        Ok(Self {
            num_pages: page.read_u32(OFFSET_NUM_PAGES),
            free_head: page.read_page_id(OFFSET_FREE_HEAD),
            first_page: page.read_page_id(OFFSET_FIRST_PAGE),
        })
    }
}

struct Inner {
    file: File,
    meta: StoreMeta,
}

/// Persistent store of fixed-size pages for a single OS file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (meta)  │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// Page 0 holds the store metadata (page count, free-list head, first
/// page) and is never handed out. Disposed pages form a singly linked free
/// list threaded through their bodies.
///
/// # Thread Safety
/// I/O goes through an internal `Mutex`, so a `PagedFile` can be shared by
/// `Arc` between the file manager and the buffer manager's frame table.
///
/// # Durability
/// Writes are not synced individually; [`PagedFile::sync`] is called when
/// the last handle on the file closes.
pub struct PagedFile {
    id: FileId,
    name: String,
    inner: Mutex<Inner>,
}

impl PagedFile {
    /// Create a new page file containing only its meta page.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, id: FileId, name: &str) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        let meta = StoreMeta {
            num_pages: 1,
            free_head: PageId::INVALID,
            first_page: PageId::INVALID,
        };
        write_raw(&mut file, META_PAGE, meta.to_page())?;
        file.sync_all()?;

        Ok(Self {
            id,
            name: name.to_string(),
            inner: Mutex::new(Inner { file, meta }),
        })
    }

    /// Open an existing page file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, or `Error::Corrupted` if
    /// its meta page is damaged.
    pub fn open<P: AsRef<Path>>(path: P, id: FileId, name: &str) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let meta = StoreMeta::from_page(&read_raw(&mut file, META_PAGE)?)?;

        Ok(Self {
            id,
            name: name.to_string(),
            inner: Mutex::new(Inner { file, meta }),
        })
    }

    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page is outside the file
    /// - `Error::Corrupted` if the page fails its checksum
    pub fn read_page(&self, page_id: PageId) -> Result<Page> {
        let mut inner = self.inner.lock();
        inner.check_range(page_id)?;

        let page = read_raw(&mut inner.file, page_id)?;
        if !page.is_intact() {
            return Err(Error::Corrupted(page_id.0));
        }
        Ok(page)
    }

    /// Write a page to disk, stamping its checksum.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_range(page_id)?;

        let mut stamped = Page::new();
        stamped.copy_from(page);
        stamped.stamp();
        write_raw(&mut inner.file, page_id, stamped)
    }

    /// Allocate a zeroed page, reusing the free list before growing the file.
    pub fn allocate_page(&self) -> Result<PageId> {
        let mut inner = self.inner.lock();
        let mut meta = inner.meta;

        let page_id = if meta.free_head.is_valid() {
            let reused = meta.free_head;
            let free = read_raw(&mut inner.file, reused)?;
            meta.free_head = free.read_page_id(OFFSET_NEXT_FREE);
            reused
        } else {
            let fresh = PageId::new(meta.num_pages);
            meta.num_pages += 1;
            fresh
        };
        if !meta.first_page.is_valid() {
            meta.first_page = page_id;
        }

        write_raw(&mut inner.file, page_id, Page::new())?;
        inner.store_meta(meta)?;
        debug!(file = %self.name, page = %page_id, "allocated page");
        Ok(page_id)
    }

    /// Return a page to the free list.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn dispose_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_range(page_id)?;
        let mut meta = inner.meta;

        let mut free = Page::new();
        free.set_page_type(PageType::Free);
        free.write_page_id(OFFSET_NEXT_FREE, meta.free_head);
        free.stamp();
        write_raw(&mut inner.file, page_id, free)?;

        meta.free_head = page_id;
        if meta.first_page == page_id {
            meta.first_page = PageId::INVALID;
        }
        inner.store_meta(meta)?;
        debug!(file = %self.name, page = %page_id, "disposed page");
        Ok(())
    }

    /// The first page allocated in this file.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if no page has been allocated yet.
    pub fn first_page(&self) -> Result<PageId> {
        let first = self.inner.lock().meta.first_page;
        if first.is_valid() {
            Ok(first)
        } else {
            Err(Error::PageNotFound(first.0))
        }
    }

    /// Number of pages in the file, including the meta page.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.inner.lock().meta.num_pages
    }

    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count() as u64) * (PAGE_SIZE as u64)
    }

    /// Flush OS buffers for this file to stable storage.
    pub fn sync(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }
}

impl Inner {
    fn check_range(&self, page_id: PageId) -> Result<()> {
        if page_id == META_PAGE || page_id.0 >= self.meta.num_pages {
            return Err(Error::PageNotFound(page_id.0));
        }
        Ok(())
    }

    fn store_meta(&mut self, meta: StoreMeta) -> Result<()> {
        write_raw(&mut self.file, META_PAGE, meta.to_page())?;
        self.meta = meta;
        Ok(())
    }
}

fn read_raw(file: &mut File, page_id: PageId) -> Result<Page> {
    let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
    file.seek(SeekFrom::Start(offset))?;

    let mut page = Page::new();
    file.read_exact(page.as_mut_slice())?;
    Ok(page)
}

/// Write a page as-is; only the meta page is stamped here.
fn write_raw(file: &mut File, page_id: PageId, mut page: Page) -> Result<()> {
    if page_id == META_PAGE {
        page.stamp();
    }
    let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(page.as_slice())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_store() -> (PagedFile, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        (PagedFile::create(&path, FileId::new(1), "test").unwrap(), dir)
    }

    #[test]
    fn test_create_new_store() {
        let (store, _dir) = create_store();
        assert_eq!(store.page_count(), 1);
        assert_eq!(store.file_size(), PAGE_SIZE as u64);
        assert!(matches!(store.first_page(), Err(Error::PageNotFound(_))));
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        PagedFile::create(&path, FileId::new(1), "test").unwrap();
        assert!(PagedFile::create(&path, FileId::new(2), "test").is_err());
    }

    #[test]
    fn test_allocate_and_read_page() {
        let (store, _dir) = create_store();

        let page_id = store.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(1));
        assert_eq!(store.first_page().unwrap(), page_id);
        assert_eq!(store.page_count(), 2);

        let page = store.read_page(page_id).unwrap();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_write_and_read_page() {
        let (store, _dir) = create_store();
        let page_id = store.allocate_page().unwrap();

        let mut page = Page::new();
        page.set_page_type(PageType::Data);
        page.as_mut_slice()[100] = 0xCD;
        page.as_mut_slice()[4095] = 0xEF;
        store.write_page(page_id, &page).unwrap();

        let read_page = store.read_page(page_id).unwrap();
        assert_eq!(read_page.as_slice()[100], 0xCD);
        assert_eq!(read_page.as_slice()[4095], 0xEF);
        assert!(read_page.is_intact());
    }

    #[test]
    fn test_meta_page_is_not_addressable() {
        let (store, _dir) = create_store();
        assert!(matches!(
            store.read_page(PageId::new(0)),
            Err(Error::PageNotFound(0))
        ));
        assert!(store.write_page(PageId::new(0), &Page::new()).is_err());
    }

    #[test]
    fn test_dispose_then_reuse() {
        let (store, _dir) = create_store();
        let first = store.allocate_page().unwrap();
        let second = store.allocate_page().unwrap();

        store.dispose_page(second).unwrap();
        assert_eq!(store.allocate_page().unwrap(), second);
        assert_eq!(store.page_count(), 3);

        // Reused pages come back zeroed.
        let page = store.read_page(second).unwrap();
        assert_eq!(page.page_type(), PageType::Invalid);
        assert_eq!(store.first_page().unwrap(), first);
    }

    #[test]
    fn test_dispose_first_page_clears_pointer() {
        let (store, _dir) = create_store();
        let first = store.allocate_page().unwrap();
        store.dispose_page(first).unwrap();
        assert!(store.first_page().is_err());
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let store = PagedFile::create(&path, FileId::new(1), "t").unwrap();
            let page_id = store.allocate_page().unwrap();
            store.allocate_page().unwrap();
            store.dispose_page(PageId::new(2)).unwrap();

            let mut page = Page::new();
            page.set_page_type(PageType::Data);
            page.as_mut_slice()[64] = 0x42;
            store.write_page(page_id, &page).unwrap();
            store.sync().unwrap();
        }

        {
            let store = PagedFile::open(&path, FileId::new(7), "t").unwrap();
            assert_eq!(store.id(), FileId::new(7));
            assert_eq!(store.page_count(), 3);
            assert_eq!(store.first_page().unwrap(), PageId::new(1));
            assert_eq!(store.read_page(PageId::new(1)).unwrap().as_slice()[64], 0x42);
            // free list survived the reopen
            assert_eq!(store.allocate_page().unwrap(), PageId::new(2));
        }
    }

    #[test]
    fn test_corrupted_page_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = PagedFile::create(&path, FileId::new(1), "t").unwrap();
        let page_id = store.allocate_page().unwrap();

        let mut page = Page::new();
        page.set_page_type(PageType::Data);
        store.write_page(page_id, &page).unwrap();

        // Flip a byte behind the store's back.
        {
            let mut raw = OpenOptions::new().write(true).open(&path).unwrap();
            raw.seek(SeekFrom::Start(PAGE_SIZE as u64 + 2000)).unwrap();
            raw.write_all(&[0xFF]).unwrap();
        }

        assert!(matches!(store.read_page(page_id), Err(Error::Corrupted(1))));
    }

    #[test]
    fn test_open_garbage_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.db");
        std::fs::write(&path, vec![0x11u8; PAGE_SIZE]).unwrap();
        assert!(matches!(
            PagedFile::open(&path, FileId::new(1), "junk"),
            Err(Error::Corrupted(0))
        ));
    }
}
