//! # Entry Store
//!
//! Sharded key-to-entry storage. Each shard pairs a hash map (key to slab
//! index) with a dense slab of entries and an `EvictionIndex`, the same
//! shape as `hkv-engine`'s `ShardInner`/`Node` arena, generalized from a
//! hardcoded LRU list to whichever policy the engine was built with.
//!
//! The store enforces no policy itself — it holds entries, keeps the
//! eviction index in sync, and reports cardinality and byte totals via a
//! pair of atomics shared across shards. `CacheEngine` is the only caller;
//! all locking and admission decisions live there.

use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::config::EvictionPolicyKind;
use crate::entry::Entry;
use crate::policy::{self, EvictionIndex};

/// Per-shard storage: a lookup map over a dense, free-list-recycled slab,
/// ordered for eviction by the shard's own `EvictionIndex`.
pub(crate) struct ShardInner {
    map: HashMap<Arc<[u8]>, usize, RandomState>,
    slots: Vec<Option<Entry>>,
    free: Vec<usize>,
    index: Box<dyn EvictionIndex>,
}

impl ShardInner {
    fn new(hash_state: RandomState, policy: EvictionPolicyKind) -> Self {
        ShardInner {
            map: HashMap::with_hasher(hash_state),
            slots: Vec::new(),
            free: Vec::new(),
            index: policy::new_index(policy),
        }
    }

    pub(crate) fn find(&self, key: &[u8]) -> Option<usize> {
        self.map.get(key).copied()
    }

    pub(crate) fn get(&self, idx: usize) -> &Entry {
        self.slots[idx].as_ref().expect("live slot")
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut Entry {
        self.slots[idx].as_mut().expect("live slot")
    }

    /// Inserts a brand-new entry and registers it with the eviction index.
    /// Returns the slab index it was assigned.
    pub(crate) fn insert_new(&mut self, key: Arc<[u8]>, entry: Entry) -> usize {
        let idx = self.free.pop().unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        });
        self.index.insert(idx, &entry);
        self.slots[idx] = Some(entry);
        self.map.insert(key, idx);
        idx
    }

    /// Notifies the index that slot `idx`'s ordering-relevant metadata
    /// changed (call after mutating the entry in place).
    pub(crate) fn touch(&mut self, idx: usize) {
        let entry = self.slots[idx].as_ref().expect("live slot");
        self.index.touch(idx, entry);
    }

    /// Removes slot `idx` entirely, returning the departing entry's size.
    pub(crate) fn remove_idx(&mut self, idx: usize) -> Option<usize> {
        let entry = self.slots[idx].take()?;
        self.map.remove(entry.key.as_ref());
        self.index.remove(idx);
        self.free.push(idx);
        Some(entry.size_bytes)
    }

    pub(crate) fn pick_victim(&mut self, now: Instant) -> Option<usize> {
        self.index.pick_victim(now)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Iterates over all live entries paired with their slab index, for
    /// `keys()` scans that need to remove expired entries they encounter.
    pub(crate) fn iter_indexed(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|entry| (idx, entry)))
    }
}

struct Shard {
    inner: RwLock<ShardInner>,
}

/// Sharded entry storage shared by the engine and its reaper.
pub(crate) struct Store {
    shards: Vec<Shard>,
    shard_mask: usize,
    hash_state: RandomState,
    policy: EvictionPolicyKind,
    current_size: AtomicUsize,
    current_bytes: AtomicUsize,
    eviction_cursor: AtomicUsize,
}

impl Store {
    pub(crate) fn new(shard_count: usize, policy: EvictionPolicyKind) -> Self {
        let shard_count = shard_count.max(1).next_power_of_two();
        let hash_state = RandomState::new();
        let shards = (0..shard_count)
            .map(|_| Shard {
                inner: RwLock::new(ShardInner::new(hash_state.clone(), policy)),
            })
            .collect();

        Store {
            shards,
            shard_mask: shard_count - 1,
            hash_state,
            policy,
            current_size: AtomicUsize::new(0),
            current_bytes: AtomicUsize::new(0),
            eviction_cursor: AtomicUsize::new(0),
        }
    }

    pub(crate) fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub(crate) fn policy(&self) -> EvictionPolicyKind {
        self.policy
    }

    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = self.hash_state.build_hasher();
        hasher.write(key);
        (hasher.finish() as usize) & self.shard_mask
    }

    /// Acquires the write lock of the shard that owns `key`.
    pub(crate) fn shard_for(&self, key: &[u8]) -> parking_lot::RwLockWriteGuard<'_, ShardInner> {
        self.shards[self.shard_index(key)].inner.write()
    }

    /// Acquires the write lock of shard `i` directly, for the reaper and for
    /// cross-shard eviction scans.
    pub(crate) fn shard_at(&self, i: usize) -> parking_lot::RwLockWriteGuard<'_, ShardInner> {
        self.shards[i].inner.write()
    }

    pub(crate) fn current_size(&self) -> usize {
        self.current_size.load(Ordering::Relaxed)
    }

    pub(crate) fn current_bytes(&self) -> usize {
        self.current_bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn add_accounting(&self, bytes: usize) {
        self.current_size.fetch_add(1, Ordering::Relaxed);
        self.current_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn remove_accounting(&self, bytes: usize) {
        self.current_size.fetch_sub(1, Ordering::Relaxed);
        self.current_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Decrements both totals for a batch of removals in one go (the reaper
    /// sweeps a whole shard before reporting back, rather than touching the
    /// atomics once per entry).
    pub(crate) fn bulk_remove_accounting(&self, count: usize, bytes: usize) {
        self.current_size.fetch_sub(count, Ordering::Relaxed);
        self.current_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }

    pub(crate) fn adjust_bytes(&self, old: usize, new: usize) {
        if new > old {
            self.current_bytes.fetch_add(new - old, Ordering::Relaxed);
        } else if old > new {
            self.current_bytes.fetch_sub(old - new, Ordering::Relaxed);
        }
    }

    /// Picks the next shard to consider for eviction, round-robin, so
    /// repeated capacity pressure doesn't concentrate on one shard.
    pub(crate) fn next_eviction_shard(&self) -> usize {
        self.eviction_cursor.fetch_add(1, Ordering::Relaxed) & self.shard_mask
    }

    /// Reaps expired entries from shard `i`, at most `batch_cap` removals.
    ///
    /// Under the TTL policy the shard's own index already orders entries by
    /// `expires_at`, so this drains its head while it is actually expired
    /// and stops the moment it isn't — a full sweep would re-scan entries
    /// the index has already told us aren't due. Other policies don't order
    /// by expiry, so this falls back to a bounded linear scan.
    ///
    /// Returns `(entries_removed, bytes_freed)`.
    pub(crate) fn reap_shard(&self, i: usize, now: Instant, batch_cap: usize) -> (usize, usize) {
        let mut inner = self.shards[i].inner.write();
        let mut removed = 0usize;
        let mut freed = 0usize;

        if self.policy == EvictionPolicyKind::Ttl {
            while removed < batch_cap {
                let idx = match inner.pick_victim(now) {
                    Some(idx) => idx,
                    None => break,
                };
                if !inner.get(idx).is_expired_at(now) {
                    break;
                }
                if let Some(size) = inner.remove_idx(idx) {
                    removed += 1;
                    freed += size;
                }
            }
        } else {
            let expired: Vec<usize> = inner
                .slots
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| {
                    slot.as_ref()
                        .filter(|entry| entry.is_expired_at(now))
                        .map(|_| idx)
                })
                .take(batch_cap)
                .collect();

            for idx in expired {
                if let Some(size) = inner.remove_idx(idx) {
                    removed += 1;
                    freed += size;
                }
            }
        }

        (removed, freed)
    }

    /// Removes every entry across every shard. Returns the count removed.
    pub(crate) fn clear(&self) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut inner = shard.inner.write();
            removed += inner.len();
            inner.map.clear();
            inner.slots.clear();
            inner.free.clear();
            inner.index = policy::new_index(self.policy);
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.current_bytes.store(0, Ordering::Relaxed);
        removed
    }
}
