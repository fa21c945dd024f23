//! heapstore - a buffer-managed heap-file record store.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           heapstore                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Query Glue (query/)                         │   │
//! │  │            insert · delete · select                      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Heap Files (heap/)                          │   │
//! │  │   HeapFile + HeapFileScan + InsertFileScan + predicates  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Buffer Manager (buffer/)                    │   │
//! │  │   frame table + frame index + CLOCK replacer + stats     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │  FileManager + PagedFile + Page/DataPage/HeaderPage      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, FileId, Rid, Error, config)
//! - [`storage`] - Page files and page formats
//! - [`buffer`] - Buffer management and the CLOCK replacer
//! - [`heap`] - Heap files, scans and inserts
//! - [`query`] - Insert/delete/select entry points
//!
//! # Quick Start
//! ```no_run
//! use heapstore::heap::{create_heap_file, Datatype, HeapFile, Operator};
//! use heapstore::{Database, DbConfig};
//!
//! let db = Database::open(DbConfig::new("/tmp/heapstore")).unwrap();
//! create_heap_file(&db, "numbers").unwrap();
//!
//! let mut heap = HeapFile::open(&db, "numbers").unwrap();
//! for n in 1..=100i32 {
//!     heap.inserter().insert_record(&n.to_le_bytes()).unwrap();
//! }
//!
//! let mut scan = heap.scan().unwrap();
//! scan.start_scan(0, 4, Datatype::Integer, Some(&50i32.to_le_bytes()), Operator::Gt)
//!     .unwrap();
//! assert_eq!(scan.records().count(), 50);
//! ```

pub mod buffer;
pub mod common;
mod database;
pub mod heap;
pub mod query;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DbConfig, PAGE_SIZE};
pub use common::{Error, FileId, FrameId, PageId, Result, Rid};
pub use database::Database;

pub use buffer::{BufferManager, BufferStats, FrameState, StatsSnapshot};
pub use heap::{HeapFile, HeapFileScan, InsertFileScan};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{FileManager, PagedFile};
