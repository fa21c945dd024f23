//! Heap files - unordered, page-chained record files.
//!
//! # Components
//! - [`HeapFile`] - An open file: header page pin plus one current page
//! - [`HeapFileScan`] - Filtered cursor borrowing a `HeapFile`
//! - [`InsertFileScan`] - Append-only inserter borrowing a `HeapFile`
//! - [`predicate`] - Typed scan predicates
//!
//! # File layout
//! ```text
//! store meta ─▶ header page ──first──▶ data ─▶ data ─▶ ... ─▶ data
//!                          └──last──────────────────────────────▲
//! ```

mod heap_file;
mod insert;
pub mod predicate;
mod scan;

pub use heap_file::HeapFile;
pub use insert::InsertFileScan;
pub use predicate::{Datatype, Operator, ScanFilter};
pub use scan::{HeapFileScan, Records};

use std::sync::Arc;

use tracing::debug;

use crate::common::Result;
use crate::storage::page::{DataPage, HeaderPage};
use crate::storage::PagedFile;
use crate::Database;

/// Create an empty heap file: a header page and one empty data page.
///
/// # Errors
/// - `Error::FileExists` if a file with this name already exists
/// - `Error::InvalidName` if the name is empty or too long
pub fn create_heap_file(db: &Database, name: &str) -> Result<()> {
    db.create_file(name)?;
    let file = db.open_file(name)?;

    let formatted = format_heap_file(db, &file, name);
    let closed = db.close_file(&file);
    formatted.and(closed)?;

    debug!(file = name, "created heap file");
    Ok(())
}

fn format_heap_file(db: &Database, file: &Arc<PagedFile>, name: &str) -> Result<()> {
    let bufs = db.buffers();

    let mut header = bufs.new_page(file)?;
    HeaderPage::new(&mut *header).init(name)?;

    let mut data = bufs.new_page(file)?;
    let data_no = data.page_id();
    DataPage::new(&mut *data).init(data_no);

    let mut header_page = HeaderPage::new(&mut *header);
    header_page.set_first_page(data_no);
    header_page.set_last_page(data_no);
    header_page.set_page_count(2);
    Ok(())
}

/// Remove a heap file from disk.
///
/// # Errors
/// - `Error::FileOpen` if the file is still open
/// - `Error::FileNotFound` if there is no such file
pub fn destroy_heap_file(db: &Database, name: &str) -> Result<()> {
    db.destroy_file(name)
}
