//! # Cache Entry
//!
//! The unit of storage: key, value, and the metadata eviction policies and
//! the reaper need (recency, frequency, expiry, size).
//!
//! Timestamps are `Instant`, not wall-clock (`SystemTime`): ordering and
//! expiry comparisons only ever need monotonic deltas, and `Instant` sidesteps
//! clock adjustments entirely.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

/// Fixed per-entry bookkeeping overhead folded into `size_bytes`, covering
/// the map slot, free-list slot, and index bookkeeping this entry occupies.
pub const DEFAULT_PER_ENTRY_OVERHEAD_BYTES: usize = 200;

/// A single stored key/value pair plus its eviction and expiry metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Indexing key. Shared (`Arc`) with the shard's lookup map to avoid a
    /// second copy of the key bytes.
    pub key: Arc<[u8]>,
    /// Stored value bytes.
    pub value: Bytes,
    /// Wall-clock-equivalent instant of first insertion.
    pub created_at: Instant,
    /// Instant of the most recent successful read or write.
    pub accessed_at: Instant,
    /// Monotonically increasing access counter; starts at 1 on insert.
    pub access_count: u64,
    /// Absolute expiry instant. `None` means the entry never expires.
    pub expires_at: Option<Instant>,
    /// Estimated in-memory footprint: key + value + per-entry overhead.
    pub size_bytes: usize,
}

impl Entry {
    /// Builds a brand new entry at `now`, with `access_count` starting at 1.
    pub fn new(
        key: Arc<[u8]>,
        value: Bytes,
        now: Instant,
        expires_at: Option<Instant>,
        overhead_bytes: usize,
    ) -> Self {
        let size_bytes = Self::estimate_size(&key, &value, overhead_bytes);
        Entry {
            key,
            value,
            created_at: now,
            accessed_at: now,
            access_count: 1,
            expires_at,
            size_bytes,
        }
    }

    /// Estimates the in-memory footprint of a key/value pair under the
    /// configured overhead constant. A budget, not a measurement: actual
    /// process RSS will drift from the running total this feeds.
    pub fn estimate_size(key: &[u8], value: &[u8], overhead_bytes: usize) -> usize {
        key.len() + value.len() + overhead_bytes
    }

    /// True when `now` is at or past this entry's expiry.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    /// Updates `accessed_at` and increments `access_count`, as on a read.
    #[inline]
    pub fn touch(&mut self, now: Instant) {
        self.accessed_at = now;
        self.access_count += 1;
    }
}
