//! # Eviction Index
//!
//! A policy-specific ordering over the entries currently held by one shard,
//! chosen once at engine construction and never switched at runtime.
//!
//! Eviction ordering is factored out behind the `EvictionIndex` trait, one
//! implementation per policy, so a shard owns a `Box<dyn EvictionIndex>`
//! rather than a single hardcoded list.

use std::time::Instant;

use crate::entry::Entry;

mod lfu;
mod lru;
mod size;
mod ttl;

pub use lfu::LfuIndex;
pub use lru::LruIndex;
pub use size::SizeIndex;
pub use ttl::TtlIndex;

use crate::config::EvictionPolicyKind;

/// A total order over the entries of one shard, under some eviction policy.
///
/// Implementations key off whatever ordering field their policy cares about
/// (recency, frequency, expiry, size) and should keep `insert`/`remove`/
/// `touch` at amortized O(1) or O(log n).
pub trait EvictionIndex: std::fmt::Debug + Send {
    /// Registers a newly inserted entry at slab slot `idx`.
    fn insert(&mut self, idx: usize, entry: &Entry);

    /// Deregisters slab slot `idx`. No-op if never inserted.
    fn remove(&mut self, idx: usize);

    /// Notifies the index that `idx`'s ordering-relevant metadata changed
    /// (after a read or an in-place update).
    fn touch(&mut self, idx: usize, entry: &Entry);

    /// Returns, without removing, the next eviction candidate.
    fn pick_victim(&mut self, now: Instant) -> Option<usize>;

    /// Number of entries currently registered.
    fn len(&self) -> usize;
}

/// Constructs a fresh, empty index for the given policy.
pub fn new_index(policy: EvictionPolicyKind) -> Box<dyn EvictionIndex> {
    match policy {
        EvictionPolicyKind::Lru => Box::new(LruIndex::new()),
        EvictionPolicyKind::Lfu => Box::new(LfuIndex::new()),
        EvictionPolicyKind::Ttl => Box::new(TtlIndex::new()),
        EvictionPolicyKind::Size => Box::new(SizeIndex::new()),
    }
}
