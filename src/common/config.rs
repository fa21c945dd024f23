//! Configuration constants and runtime settings for heapstore.

use std::path::PathBuf;

/// Size of a page in bytes (4KB).
///
/// This is the unit of I/O between the page store and the buffer manager,
/// and the capacity of one heap-file data page.
pub const PAGE_SIZE: usize = 4096;

/// Length of the fixed file-name field in a heap file's header page.
pub const MAX_NAME_LEN: usize = 50;

/// Number of frames used when no pool size is configured.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// What `BufferManager::dispose_page` does with a page that is still pinned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisposePolicy {
    /// Drop the frame regardless of its pin count.
    #[default]
    Unconditional,
    /// Refuse with `Error::PagePinned`.
    RejectPinned,
}

/// How `HeapFile::get_record` releases the page it leaves behind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Release the previous page dirty, even on a pure read.
    #[default]
    DirtyOnSwitch,
    /// Release the previous page with its accumulated dirty flag.
    CleanOnSwitch,
}

/// What a scan does when its filter window runs past the end of a record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Treat the record as a non-match.
    #[default]
    NoMatch,
    /// Fail the scan with `Error::FilterOutOfRange`.
    Error,
}

/// Settings for a [`Database`](crate::Database) instance.
///
/// # Example
/// ```
/// use heapstore::common::config::{DbConfig, DisposePolicy};
///
/// let config = DbConfig::new("/tmp/db")
///     .with_pool_size(16)
///     .with_dispose_policy(DisposePolicy::RejectPinned);
/// assert_eq!(config.pool_size, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Directory holding one OS file per heap file.
    pub dir: PathBuf,
    /// Number of frames in the buffer pool.
    pub pool_size: usize,
    pub dispose_policy: DisposePolicy,
    pub read_policy: ReadPolicy,
    pub window_policy: WindowPolicy,
}

impl DbConfig {
    /// Default settings rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pool_size: DEFAULT_POOL_SIZE,
            dispose_policy: DisposePolicy::default(),
            read_policy: ReadPolicy::default(),
            window_policy: WindowPolicy::default(),
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_dispose_policy(mut self, policy: DisposePolicy) -> Self {
        self.dispose_policy = policy;
        self
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn with_window_policy(mut self, policy: WindowPolicy) -> Self {
        self.window_policy = policy;
        self
    }
}
