//! File manager - names, creation and the open-file table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::config::MAX_NAME_LEN;
use crate::common::{Error, FileId, Result};
use crate::storage::PagedFile;

struct OpenEntry {
    file: Arc<PagedFile>,
    opens: usize,
}

/// Maps file names to page files inside one directory.
///
/// Opening a file that is already open returns the same [`PagedFile`] and
/// bumps its open count, so every handle on a file shares one [`FileId`]
/// and therefore one set of cached pages.
pub struct FileManager {
    dir: PathBuf,
    open_files: Mutex<HashMap<String, OpenEntry>>,
    next_id: AtomicU32,
}

impl FileManager {
    /// Manage files under `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            open_files: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let bad = name.is_empty()
            || name.len() > MAX_NAME_LEN
            || name.contains(['/', '\\'])
            || name == "."
            || name == "..";
        if bad {
            return Err(Error::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    fn next_id(&self) -> FileId {
        FileId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Create an empty page file.
    ///
    /// # Errors
    /// `Error::FileExists` if a file with this name is already present.
    pub fn create_file(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if path.exists() {
            return Err(Error::FileExists(name.to_string()));
        }
        PagedFile::create(&path, self.next_id(), name)?;
        debug!(file = name, "created file");
        Ok(())
    }

    /// Delete a page file from disk.
    ///
    /// # Errors
    /// - `Error::FileOpen` if any handle on the file is still open
    /// - `Error::FileNotFound` if there is no such file
    pub fn destroy_file(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if self.open_files.lock().contains_key(name) {
            return Err(Error::FileOpen(name.to_string()));
        }
        if !path.exists() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        std::fs::remove_file(path)?;
        debug!(file = name, "destroyed file");
        Ok(())
    }

    /// Open a page file, sharing the existing handle if already open.
    ///
    /// # Errors
    /// `Error::FileNotFound` if there is no such file.
    pub fn open_file(&self, name: &str) -> Result<Arc<PagedFile>> {
        let path = self.path_for(name)?;
        let mut open_files = self.open_files.lock();

        if let Some(entry) = open_files.get_mut(name) {
            entry.opens += 1;
            return Ok(Arc::clone(&entry.file));
        }
        if !path.exists() {
            return Err(Error::FileNotFound(name.to_string()));
        }

        let file = Arc::new(PagedFile::open(&path, self.next_id(), name)?);
        open_files.insert(
            name.to_string(),
            OpenEntry {
                file: Arc::clone(&file),
                opens: 1,
            },
        );
        Ok(file)
    }

    /// Drop one open of `file`. Returns true if that was the last one.
    ///
    /// Flushing cached pages is the caller's job; see
    /// [`Database::close_file`](crate::Database::close_file).
    pub fn close_file(&self, file: &PagedFile) -> Result<bool> {
        let mut open_files = self.open_files.lock();
        let entry = open_files
            .get_mut(file.name())
            .filter(|e| e.file.id() == file.id())
            .ok_or_else(|| Error::FileNotFound(file.name().to_string()))?;

        entry.opens -= 1;
        if entry.opens == 0 {
            open_files.remove(file.name());
            return Ok(true);
        }
        Ok(false)
    }

    /// Number of outstanding opens of `name`.
    pub fn open_count(&self, name: &str) -> usize {
        self.open_files.lock().get(name).map_or(0, |e| e.opens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_open_close() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path()).unwrap();

        fm.create_file("rel").unwrap();
        assert!(fm.exists("rel"));

        let file = fm.open_file("rel").unwrap();
        assert_eq!(fm.open_count("rel"), 1);
        assert!(fm.close_file(&file).unwrap());
        assert_eq!(fm.open_count("rel"), 0);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path()).unwrap();
        fm.create_file("rel").unwrap();
        assert!(matches!(fm.create_file("rel"), Err(Error::FileExists(_))));
    }

    #[test]
    fn test_reopen_shares_handle() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path()).unwrap();
        fm.create_file("rel").unwrap();

        let a = fm.open_file("rel").unwrap();
        let b = fm.open_file("rel").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(fm.open_count("rel"), 2);

        assert!(!fm.close_file(&a).unwrap());
        assert!(fm.close_file(&b).unwrap());
        assert!(fm.close_file(&b).is_err());
    }

    #[test]
    fn test_fresh_open_gets_new_id() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path()).unwrap();
        fm.create_file("rel").unwrap();

        let first = fm.open_file("rel").unwrap();
        let first_id = first.id();
        fm.close_file(&first).unwrap();

        let second = fm.open_file("rel").unwrap();
        assert_ne!(second.id(), first_id);
    }

    #[test]
    fn test_destroy() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path()).unwrap();
        fm.create_file("rel").unwrap();

        let file = fm.open_file("rel").unwrap();
        assert!(matches!(fm.destroy_file("rel"), Err(Error::FileOpen(_))));
        fm.close_file(&file).unwrap();

        fm.destroy_file("rel").unwrap();
        assert!(!fm.exists("rel"));
        assert!(matches!(fm.destroy_file("rel"), Err(Error::FileNotFound(_))));
        assert!(matches!(fm.open_file("rel"), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_names() {
        let dir = tempdir().unwrap();
        let fm = FileManager::new(dir.path()).unwrap();
        for name in ["", "a/b", "..", &"x".repeat(MAX_NAME_LEN + 1)] {
            assert!(matches!(fm.create_file(name), Err(Error::InvalidName(_))));
        }
    }
}
