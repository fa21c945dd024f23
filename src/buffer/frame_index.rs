//! Frame index - maps resident (file, page) pairs to frames.

use std::collections::HashMap;

use crate::common::{Error, FileId, FrameId, PageId, Result};

/// Lookup table from `(FileId, PageId)` to the frame holding that page.
///
/// Sized at construction to roughly 1.2x the frame count; an insert beyond
/// that bound, or of a key already present, is rejected so the table stays a
/// bijection with the valid frames.
#[derive(Debug)]
pub struct FrameIndex {
    map: HashMap<(FileId, PageId), FrameId>,
    capacity: usize,
}

impl FrameIndex {
    /// Index for a pool of `frames` frames.
    pub fn new(frames: usize) -> Self {
        let capacity = frames * 6 / 5 + 1;
        Self {
            map: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// # Errors
    /// `Error::HashTable` if the key is already present or the index is full.
    pub fn insert(&mut self, file: FileId, page: PageId, frame: FrameId) -> Result<()> {
        let key = (file, page);
        if self.map.len() >= self.capacity || self.map.contains_key(&key) {
            return Err(Error::HashTable { file, page });
        }
        self.map.insert(key, frame);
        Ok(())
    }

    /// # Errors
    /// `Error::NotFound` if the page is not resident.
    pub fn lookup(&self, file: FileId, page: PageId) -> Result<FrameId> {
        self.map
            .get(&(file, page))
            .copied()
            .ok_or(Error::NotFound { file, page })
    }

    /// Remove an entry; absent keys are ignored.
    pub fn remove(&mut self, file: FileId, page: PageId) -> Option<FrameId> {
        self.map.remove(&(file, page))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, PageId, FrameId)> + '_ {
        self.map.iter().map(|(&(file, page), &frame)| (file, page, frame))
    }
}
