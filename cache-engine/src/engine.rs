//! # Cache Engine
//!
//! The public operation set. Orchestrates the store, eviction index, and
//! statistics collector behind `get`/`set`/`delete`/`clear`/`keys`/`stats`,
//! owning admission and eviction the way `hkv-engine::MemoryEngine` owns
//! its `KVEngine` impl — except policy is pluggable and capacity is
//! enforced on both entry count and byte budget, not bytes alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;

use cache_common::{CacheError, CacheResult};

use crate::config::{CacheConfig, EvictionPolicyKind};
use crate::entry::Entry;
use crate::pattern::glob_match;
use crate::reaper::{self, ReaperHandle};
use crate::stats::{StatsCollector, Statistics};
use crate::store::Store;

/// Final statistics snapshot returned by `shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownStats {
    pub final_stats: Statistics,
}

/// The cache engine: a sharded store, one eviction index per shard, a
/// background reaper, and the statistics those three feed.
pub struct CacheEngine {
    store: Arc<Store>,
    stats: Arc<StatsCollector>,
    config: CacheConfig,
    shutting_down: Arc<AtomicBool>,
    reaper: Option<ReaperHandle>,
}

impl CacheEngine {
    /// Builds a new engine and starts its background reaper.
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(Store::new(config.shard_count, config.policy));
        let stats = Arc::new(StatsCollector::new());
        let shutting_down = Arc::new(AtomicBool::new(false));

        let reaper = reaper::spawn(
            Arc::clone(&store),
            Arc::clone(&stats),
            config.cleanup_interval,
            config.reap_batch_size,
            Arc::clone(&shutting_down),
        );

        CacheEngine {
            store,
            stats,
            config,
            shutting_down,
            reaper: Some(reaper),
        }
    }

    fn check_open(&self) -> CacheResult<()> {
        if self.shutting_down.load(Ordering::Acquire) {
            Err(CacheError::ShuttingDown)
        } else {
            Ok(())
        }
    }

    fn validate_key(&self, key: &[u8]) -> CacheResult<()> {
        if key.is_empty() || key.len() > self.config.max_key_bytes {
            Err(CacheError::InvalidKey {
                len: key.len(),
                max_len: self.config.max_key_bytes,
            })
        } else {
            Ok(())
        }
    }

    /// Looks up `key`, touching recency/frequency metadata on a hit.
    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    pub fn get(&self, key: &[u8]) -> CacheResult<Bytes> {
        self.check_open()?;
        self.validate_key(key)?;

        let now = Instant::now();
        let mut shard = self.store.shard_for(key);

        let idx = match shard.find(key) {
            Some(idx) => idx,
            None => {
                drop(shard);
                self.stats.record_miss();
                return Err(CacheError::NotFound);
            }
        };

        if shard.get(idx).is_expired_at(now) {
            let freed = shard.remove_idx(idx).unwrap_or(0);
            drop(shard);
            self.store.remove_accounting(freed);
            self.stats.record_expiration();
            return Err(CacheError::NotFound);
        }

        shard.get_mut(idx).touch(now);
        shard.touch(idx);
        let value = shard.get(idx).value.clone();
        drop(shard);

        self.stats.record_hit();
        Ok(value)
    }

    /// Inserts or replaces `key`. On a brand-new insert, an omitted `ttl`
    /// falls back to `CacheConfig::default_ttl` (`None` on both means no
    /// expiry). On an update of an existing key, an omitted `ttl` clears any
    /// prior expiry outright — the configured default only seeds new
    /// entries, it never reinstates itself on a bare overwrite.
    #[tracing::instrument(skip(self, key, value), fields(key_len = key.len(), value_len = value.len()))]
    pub fn set(&self, key: &[u8], value: Bytes, ttl: Option<Duration>) -> CacheResult<()> {
        self.check_open()?;
        self.validate_key(key)?;
        if let Some(ttl) = ttl {
            if ttl.is_zero() {
                return Err(CacheError::InvalidTtl);
            }
        }

        let now = Instant::now();
        let size_bytes = Entry::estimate_size(key, &value, self.config.per_entry_overhead_bytes);
        if size_bytes > self.config.max_bytes {
            return Err(CacheError::EntryTooLarge {
                size_bytes,
                max_bytes: self.config.max_bytes,
            });
        }

        let mut shard = self.store.shard_for(key);
        if let Some(idx) = shard.find(key) {
            // A missing ttl on an update clears any prior expiry outright; the
            // configured default_ttl only seeds brand-new inserts below, it
            // does not resurrect on a bare overwrite.
            let expires_at = ttl.map(|d| now + d);
            let old_size = shard.get(idx).size_bytes;
            {
                let entry = shard.get_mut(idx);
                entry.value = value;
                entry.accessed_at = now;
                entry.access_count = 1;
                entry.expires_at = expires_at;
                entry.size_bytes = size_bytes;
            }
            shard.touch(idx);
            drop(shard);
            self.store.adjust_bytes(old_size, size_bytes);
            // Growing an existing entry in place can push current_bytes past
            // max_bytes just as surely as admitting a new one can; run the
            // same eviction loop so invariant 4 (current_bytes <= max_bytes)
            // holds after this operation too, not just on fresh inserts.
            self.enforce_capacity()?;
            self.stats.record_set();
            return Ok(());
        }
        drop(shard);

        let expires_at = ttl.or(self.config.default_ttl).map(|d| now + d);
        let key_arc: Arc<[u8]> = Arc::from(key);
        let entry = Entry::new(Arc::clone(&key_arc), value, now, expires_at, size_bytes);
        self.admit_and_insert(key_arc, entry)?;
        self.stats.record_set();
        Ok(())
    }

    /// Evicts until the new entry fits, then inserts it.
    fn admit_and_insert(&self, key: Arc<[u8]>, entry: Entry) -> CacheResult<()> {
        let size_bytes = entry.size_bytes;
        loop {
            let fits = self.store.current_size() + 1 <= self.config.max_size
                && self.store.current_bytes() + size_bytes <= self.config.max_bytes;
            if fits {
                break;
            }
            if !self.evict_one() {
                tracing::warn!(
                    size_bytes,
                    max_size = self.config.max_size,
                    max_bytes = self.config.max_bytes,
                    "capacity exceeded: eviction could not admit entry"
                );
                return Err(CacheError::CapacityExceeded);
            }
        }

        let mut shard = self.store.shard_for(&key);
        shard.insert_new(key, entry);
        drop(shard);
        self.store.add_accounting(size_bytes);
        Ok(())
    }

    /// Evicts until the store's actual totals are back within budget.
    /// Unlike `admit_and_insert`'s loop, which checks against a pending
    /// entry not yet counted, this checks the totals as they stand right
    /// now — the shape an in-place update needs after it has already grown
    /// an existing entry's `size_bytes`.
    fn enforce_capacity(&self) -> CacheResult<()> {
        while self.store.current_size() > self.config.max_size
            || self.store.current_bytes() > self.config.max_bytes
        {
            if !self.evict_one() {
                tracing::warn!(
                    current_size = self.store.current_size(),
                    current_bytes = self.store.current_bytes(),
                    max_size = self.config.max_size,
                    max_bytes = self.config.max_bytes,
                    "capacity exceeded: eviction could not restore budget after update"
                );
                return Err(CacheError::CapacityExceeded);
            }
        }
        Ok(())
    }

    /// One eviction step: drains expired entries opportunistically under
    /// the TTL policy, then removes the shard's current victim. Tries each
    /// shard in round-robin order and returns `false` only once every shard
    /// has nothing left to give up.
    fn evict_one(&self) -> bool {
        let now = Instant::now();
        let shard_count = self.store.shard_count();
        let start = self.store.next_eviction_shard();

        for offset in 0..shard_count {
            let i = (start + offset) % shard_count;
            let mut shard = self.store.shard_at(i);

            if self.store.policy() == EvictionPolicyKind::Ttl {
                while let Some(idx) = shard.pick_victim(now) {
                    if shard.get(idx).is_expired_at(now) {
                        if let Some(freed) = shard.remove_idx(idx) {
                            self.store.remove_accounting(freed);
                            self.stats.record_expiration();
                        }
                    } else {
                        break;
                    }
                }
            }

            if let Some(idx) = shard.pick_victim(now) {
                if let Some(freed) = shard.remove_idx(idx) {
                    drop(shard);
                    self.store.remove_accounting(freed);
                    self.stats.record_eviction();
                    return true;
                }
            }
        }

        false
    }

    /// Removes `key` if present. Returns whether an entry was removed.
    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    pub fn delete(&self, key: &[u8]) -> CacheResult<bool> {
        self.check_open()?;
        self.validate_key(key)?;

        let mut shard = self.store.shard_for(key);
        match shard.find(key) {
            None => Ok(false),
            Some(idx) => {
                let freed = shard.remove_idx(idx).unwrap_or(0);
                drop(shard);
                self.store.remove_accounting(freed);
                self.stats.record_delete();
                Ok(true)
            }
        }
    }

    /// Removes every entry. Statistics counters (besides size/bytes) are
    /// left untouched. Returns the number of entries removed.
    #[tracing::instrument(skip(self))]
    pub fn clear(&self) -> CacheResult<usize> {
        self.check_open()?;
        Ok(self.store.clear())
    }

    /// Lists live keys, optionally filtered by an anchored glob `pattern`
    /// (`*`/`?`), truncated to `limit` (default from
    /// `CacheConfig::keys_default_limit`). Expired entries encountered
    /// during the scan are removed and counted as expirations rather than
    /// returned.
    #[tracing::instrument(skip(self, pattern))]
    pub fn keys(
        &self,
        pattern: Option<&[u8]>,
        limit: Option<usize>,
    ) -> CacheResult<Vec<Arc<[u8]>>> {
        self.check_open()?;
        let limit = limit.unwrap_or(self.config.keys_default_limit);
        let now = Instant::now();
        let mut out = Vec::new();

        for i in 0..self.store.shard_count() {
            let mut shard = self.store.shard_at(i);
            let mut expired_idxs = Vec::new();

            for (idx, entry) in shard.iter_indexed() {
                if entry.is_expired_at(now) {
                    expired_idxs.push(idx);
                    continue;
                }
                if out.len() < limit && pattern.map_or(true, |p| glob_match(p, &entry.key)) {
                    out.push(Arc::clone(&entry.key));
                }
            }

            let expired_count = expired_idxs.len();
            let mut freed_total = 0;
            for idx in expired_idxs {
                if let Some(freed) = shard.remove_idx(idx) {
                    freed_total += freed;
                }
            }
            drop(shard);

            if expired_count > 0 {
                self.store.bulk_remove_accounting(expired_count, freed_total);
                self.stats.record_expirations(expired_count as u64);
            }

            if out.len() >= limit {
                break;
            }
        }

        Ok(out)
    }

    /// A point-in-time statistics snapshot. Always available, even while
    /// shutting down.
    pub fn stats(&self) -> Statistics {
        self.stats
            .snapshot(self.store.current_size(), self.store.current_bytes())
    }

    /// Stops accepting new operations, waits for the reaper to exit after
    /// its current batch, and returns the final statistics snapshot.
    /// In-flight calls that already passed the `check_open` guard still
    /// complete; this only blocks new ones.
    pub fn shutdown(mut self) -> ShutdownStats {
        self.shutting_down.store(true, Ordering::Release);
        if let Some(mut reaper) = self.reaper.take() {
            reaper.join();
        }
        ShutdownStats {
            final_stats: self.stats(),
        }
    }
}
