//! Buffer management.
//!
//! The buffer manager is the in-memory cache layer between heap files and
//! page files. It manages a fixed pool of frames, each holding one page of
//! some open file.
//!
//! # Components
//! - [`BufferManager`] - The page cache
//! - [`FrameDescriptor`] / [`FrameState`] - Per-frame bookkeeping
//! - [`FrameIndex`] - (file, page) to frame lookup
//! - [`PageGuard`] - Scoped pin, as [`PageReadGuard`] or [`PageWriteGuard`]
//! - [`BufferStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod buffer_manager;
mod frame;
mod frame_index;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_manager::BufferManager;
pub use frame::{FrameDescriptor, FrameInfo, FrameState};
pub use frame_index::FrameIndex;
pub use page_guard::{PageGuard, PageReadGuard, PageWriteGuard};
pub use stats::{BufferStats, StatsSnapshot};
