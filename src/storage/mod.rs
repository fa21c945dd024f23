//! Storage layer - the persistent page store and page formats.
//!
//! This module handles persistent storage:
//! - [`PagedFile`] - Fixed-size page I/O for one OS file
//! - [`FileManager`] - File creation, destruction and the open-file table
//! - [`page`] - Page types and layouts

mod file_manager;
pub mod page;
mod paged_file;

pub use file_manager::FileManager;
pub use paged_file::PagedFile;
