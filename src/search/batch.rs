//! Batch partitioning of a candidate space.

use std::ops::Range;

/// Default number of candidates per dispatched batch.
pub const DEFAULT_BATCH_SIZE: u64 = 500_000;

/// Number of batches needed to cover `total` ordinals.
#[inline]
pub fn batch_count(total: u64, batch_size: u64) -> u64 {
    (total + batch_size - 1) / batch_size
}

/// Split `[0, total)` into ascending contiguous ranges of at most
/// `batch_size` ordinals. Ranges are disjoint and their union is exact; no
/// ordinal is skipped or duplicated.
pub fn partition(total: u64, batch_size: u64) -> impl Iterator<Item = Range<u64>> {
    debug_assert!(batch_size > 0);
    (0..batch_count(total, batch_size)).map(move |i| {
        let start = i * batch_size;
        let end = (start + batch_size).min(total);
        start..end
    })
}
