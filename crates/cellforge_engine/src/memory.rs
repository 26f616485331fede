//! Buffer allocation capability.
//!
//! Grid and count buffers are acquired through a [`MemoryProvider`] so a host
//! can observe or pool the large allocations. Buffers are re-acquired
//! wholesale when dimensions or range change, never grown in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub allocations: u64,
    pub bytes: u64,
}

/// Source of large zeroed buffers.
pub trait MemoryProvider: Send + Sync {
    /// A zeroed byte buffer of `count` elements. `name` labels the buffer
    /// for diagnostics.
    fn allocate_bytes(&self, count: usize, name: &str) -> Vec<u8>;

    /// A zeroed word buffer of `count` elements.
    fn allocate_words(&self, count: usize, name: &str) -> Vec<u32>;

    /// Counters over every allocation served so far.
    fn stats(&self) -> MemoryStats;
}

/// Default provider: plain heap allocations with atomic counters.
#[derive(Debug, Default)]
pub struct TrackingPool {
    allocations: AtomicU64,
    bytes: AtomicU64,
}

impl TrackingPool {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, bytes: usize, name: &str) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        tracing::debug!(buffer = name, bytes, "allocated buffer");
    }
}

impl MemoryProvider for TrackingPool {
    fn allocate_bytes(&self, count: usize, name: &str) -> Vec<u8> {
        self.record(count, name);
        vec![0; count]
    }

    fn allocate_words(&self, count: usize, name: &str) -> Vec<u32> {
        self.record(count * std::mem::size_of::<u32>(), name);
        vec![0; count]
    }

    fn stats(&self) -> MemoryStats {
        MemoryStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_pool_counts_allocations() {
        let pool = TrackingPool::new();
        let bytes = pool.allocate_bytes(64, "cells");
        let words = pool.allocate_words(16, "counts");
        assert_eq!(bytes.len(), 64);
        assert_eq!(words.len(), 16);
        assert!(bytes.iter().all(|&b| b == 0));
        let stats = pool.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.bytes, 64 + 16 * 4);
    }
}
