//! Eviction policy implementations (replacers).
//!
//! Currently implements:
//! - [`ClockReplacer`] - CLOCK (second chance), bounded to two sweeps

mod clock;

pub use clock::ClockReplacer;
