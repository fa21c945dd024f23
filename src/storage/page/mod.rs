//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`PageHeader`] - Type byte and checksum at the start of every page
//! - [`PageType`] - Discriminator for different page formats
//! - [`DataPage`] - Slotted record store of one heap-file data page
//! - [`HeaderPage`] - Heap-file header page view

mod data_page;
mod header_page;
#[allow(clippy::module_inception)]
mod page;
mod page_header;

pub use data_page::{DataPage, DATA_HEADER_SIZE, DP_FIXED, MAX_RECORD_LEN, SLOT_SIZE};
pub use header_page::HeaderPage;
pub use page::Page;
pub use page_header::{PageHeader, PageType};
