//! Shared atomic counter for aggregate read progress.

use std::sync::atomic::{AtomicI64, Ordering};

/// Accumulates bytes delivered across all counting regions of a plan.
///
/// One counter is shared by a [`ChunkPlan`](crate::ChunkPlan) and every
/// counting [`RegionReader`](crate::RegionReader) derived from it; it is
/// reset each time a new generation of readers is produced. All operations
/// are atomic and safe for unsynchronized concurrent use, with no ordering
/// guaranteed between an update from one region and a concurrent read from
/// an observer beyond the atomicity of each call.
#[derive(Debug, Default)]
pub struct ProgressCounter(AtomicI64);

impl ProgressCounter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self(AtomicI64::new(0))
    }

    /// Adds `n` and returns the updated value.
    pub fn increment(&self, n: i64) -> i64 {
        self.0.fetch_add(n, Ordering::SeqCst) + n
    }

    /// Subtracts `n` and returns the updated value.
    pub fn decrement(&self, n: i64) -> i64 {
        self.0.fetch_sub(n, Ordering::SeqCst) - n
    }

    /// Returns the current value.
    pub fn get(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Resets the counter to zero.
    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst)
    }
}
