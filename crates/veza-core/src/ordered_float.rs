//! Ordered float wrapper for use in `BinaryHeap`.
//!
//! Provides IEEE 754 total ordering for f32 values, including proper NaN
//! handling. Uses `f32::total_cmp`, which defines
//! -NaN < -∞ < ... < -0 < +0 < ... < +∞ < +NaN, so Ord/Eq/PartialEq stay
//! consistent and heap invariants hold even on degenerate inputs.

use std::cmp::Ordering;

/// Wrapper for f32 to implement `Ord` for `BinaryHeap`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderedFloat(pub f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        // Bit comparison for consistency with total_cmp.
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
