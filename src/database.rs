//! Database - the explicit owner of the file table and buffer pool.

use std::sync::Arc;

use tracing::debug;

use crate::buffer::BufferManager;
use crate::common::config::DbConfig;
use crate::common::Result;
use crate::storage::{FileManager, PagedFile};

/// One isolated storage instance: a directory of page files, the open-file
/// table over it, and a buffer pool shared by every open file.
///
/// Nothing here is global; tests routinely run several instances side by
/// side.
///
/// # Example
/// ```no_run
/// use heapstore::{Database, DbConfig};
///
/// let db = Database::open(DbConfig::new("/tmp/heapstore").with_pool_size(32)).unwrap();
/// heapstore::heap::create_heap_file(&db, "emp").unwrap();
/// ```
pub struct Database {
    config: DbConfig,
    files: FileManager,
    buffers: BufferManager,
}

impl Database {
    /// Open (creating if needed) the directory named in `config`.
    ///
    /// # Panics
    /// Panics if `config.pool_size` is 0.
    pub fn open(config: DbConfig) -> Result<Self> {
        let files = FileManager::new(&config.dir)?;
        let buffers = BufferManager::with_policy(config.pool_size, config.dispose_policy);
        debug!(dir = %config.dir.display(), frames = config.pool_size, "opened database");
        Ok(Self {
            config,
            files,
            buffers,
        })
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn files(&self) -> &FileManager {
        &self.files
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    pub fn create_file(&self, name: &str) -> Result<()> {
        self.files.create_file(name)
    }

    pub fn destroy_file(&self, name: &str) -> Result<()> {
        self.files.destroy_file(name)
    }

    pub fn open_file(&self, name: &str) -> Result<Arc<PagedFile>> {
        self.files.open_file(name)
    }

    /// Close one handle on `file`.
    ///
    /// Closing the last handle flushes the file's pages out of the buffer
    /// pool and syncs it. The handle is closed even if that flush fails
    /// (a page is still pinned); the error is returned and pages left in
    /// the pool are written back through their own handle on eviction.
    pub fn close_file(&self, file: &PagedFile) -> Result<()> {
        let flushed = match self.files.open_count(file.name()) {
            1 => self.buffers.flush_file(file).and_then(|()| file.sync()),
            _ => Ok(()),
        };
        self.files.close_file(file)?;
        flushed
    }
}
