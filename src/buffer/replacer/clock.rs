//! CLOCK (second chance) replacement policy.

use tracing::trace;

use crate::buffer::{FrameDescriptor, FrameState};
use crate::common::FrameId;

/// Rotating hand over the frame table.
///
/// The hand starts one before frame 0, so the first sweep begins at frame 0,
/// and keeps its position between calls.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: FrameId,
    capacity: usize,
}

impl ClockReplacer {
    /// Create a clock over `capacity` frames.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            hand: FrameId::new(capacity - 1),
            capacity,
        }
    }

    /// Current hand position.
    pub fn hand(&self) -> FrameId {
        self.hand
    }

    /// Sweep the table for a victim frame, at most two full turns.
    ///
    /// A free frame is taken at once. A referenced frame loses its reference
    /// bit and is passed over; a pinned frame is passed over. The first
    /// evictable frame is returned. The caller does the write-back and
    /// unbinding. Returns `None` if every frame stayed pinned.
    pub fn victim(&mut self, table: &mut [FrameDescriptor]) -> Option<FrameId> {
        debug_assert_eq!(table.len(), self.capacity);

        for _ in 0..2 * self.capacity {
            self.hand = self.hand.next(self.capacity);
            let desc = &mut table[self.hand.0];

            match desc.state() {
                FrameState::Free | FrameState::Evictable { .. } => {
                    trace!(frame = %self.hand, "clock victim");
                    return Some(self.hand);
                }
                FrameState::Referenced => desc.clear_reference(),
                FrameState::Pinned => {}
            }
        }
        None
    }
}
