//! Squared-L2 distance for query/candidate comparison.
//!
//! The whole search path compares squared distances: sqrt is monotonic, so
//! ranking by `d²` ranks by `d`, and skipping the root saves one FP op per
//! distance evaluation on the hot path.

use crate::error::{Error, Result};

/// Computes the squared Euclidean distance between two vectors.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the vectors differ in length.
/// A mismatch mid-query means the store and the graph disagree on the
/// deployment dimension, which is fatal for the query.
#[inline]
pub fn l2_sq(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(l2_sq_unchecked(a, b))
}

/// Squared Euclidean distance without the length check.
///
/// For callers that already guarantee equal dimensions (the builder index
/// validates every vector at insert time).
#[inline]
pub(crate) fn l2_sq_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
