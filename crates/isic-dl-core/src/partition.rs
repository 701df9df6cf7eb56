//! Static work partitioning for batch phases.
//!
//! Splits `len` items into contiguous, ordered, disjoint ranges, one per worker.

use std::ops::Range;

/// A single worker partition: item indices [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRange {
    /// First item index (inclusive).
    pub start: usize,
    /// Last item index (exclusive).
    pub end: usize,
}

impl WorkerRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Builds the partition plan for `len` items over `workers` workers.
///
/// Worker `i` gets `[i*len/workers, (i+1)*len/workers)` with floor division, so
/// uneven remainders land in the later ranges. Returns an empty vec if
/// `workers` is 0; individual ranges may be empty when `len < workers`.
pub fn plan_partitions(len: usize, workers: usize) -> Vec<WorkerRange> {
    if workers == 0 {
        return Vec::new();
    }

    (0..workers)
        .map(|i| WorkerRange {
            start: boundary(i, len, workers),
            end: boundary(i + 1, len, workers),
        })
        .collect()
}

fn boundary(i: usize, len: usize, workers: usize) -> usize {
    // u128 keeps i*len from overflowing for huge inputs.
    ((i as u128 * len as u128) / workers as u128) as usize
}
