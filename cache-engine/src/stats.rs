//! # Statistics Collector
//!
//! Monotonic counters and derived gauges describing engine behavior, the
//! same accumulator pattern as `hkv-server`'s `Metrics`: plain `AtomicU64`
//! fields updated with `Ordering::Relaxed` (no cross-field ordering is
//! required, only eventual consistency) and a cheap point-in-time snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Thread-safe counters, shared by every shard and the reaper.
#[derive(Debug)]
pub struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    start_time: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        StatsCollector {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` expirations in one update, for the reaper's batched
    /// sweeps where incrementing one at a time would mean one extra atomic
    /// op per reaped entry for no benefit.
    pub(crate) fn record_expirations(&self, count: u64) {
        if count > 0 {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Builds a consistent snapshot, pairing the monotonic counters with the
    /// store's current size/bytes totals as observed by the caller.
    pub fn snapshot(&self, current_size: usize, current_bytes: usize) -> Statistics {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        Statistics {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            current_size,
            current_bytes,
            uptime: self.start_time.elapsed(),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of engine statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub current_size: usize,
    pub current_bytes: usize,
    pub uptime: Duration,
}

impl Statistics {
    /// `hits / max(1, hits + misses)`.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Estimated memory footprint in mebibytes, derived from `current_bytes`.
    pub fn memory_usage_mb(&self) -> f64 {
        self.current_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_is_zero_with_no_traffic() {
        let stats = StatsCollector::new();
        let snap = stats.snapshot(0, 0);
        assert_eq!(snap.hit_ratio(), 0.0);
    }

    #[test]
    fn hit_ratio_reflects_hits_and_misses() {
        let stats = StatsCollector::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        let snap = stats.snapshot(0, 0);
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert!((snap.hit_ratio() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn memory_usage_mb_converts_bytes() {
        let stats = StatsCollector::new();
        let snap = stats.snapshot(1, 2 * 1024 * 1024);
        assert_eq!(snap.memory_usage_mb(), 2.0);
        assert_eq!(snap.current_size, 1);
    }

    #[test]
    fn expirations_and_evictions_are_distinct_counters() {
        let stats = StatsCollector::new();
        stats.record_expiration();
        stats.record_eviction();
        stats.record_eviction();
        let snap = stats.snapshot(0, 0);
        assert_eq!(snap.expirations, 1);
        assert_eq!(snap.evictions, 2);
    }
}
