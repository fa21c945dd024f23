//! Frame identifier type.

use std::fmt;

/// Index of a frame in the buffer pool.
///
/// Frames and their descriptors live in two parallel vectors of the same
/// length, so `frame_id.0` indexes both directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }

    /// The frame after this one on a clock face of `capacity` frames.
    #[inline]
    pub fn next(self, capacity: usize) -> Self {
        FrameId((self.0 + 1) % capacity)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
