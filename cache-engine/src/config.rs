//! # Engine Configuration
//!
//! Construction-time configuration surface. Consumed once, by
//! `CacheEngine::new`, and never mutated afterward — switching policies or
//! capacity at runtime is not supported.
//!
//! Loading these values from the environment, a config file, or request
//! headers is the surrounding HTTP layer's job, not this crate's; callers
//! build a `CacheConfig` explicitly and hand it to the engine.

use std::time::Duration;

use crate::entry::DEFAULT_PER_ENTRY_OVERHEAD_BYTES;

/// 512 MiB, the default byte budget.
pub const DEFAULT_MAX_BYTES: usize = 512 * 1024 * 1024;

/// Default maximum number of entries.
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Default proactive-reap interval.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Default batch size for a single proactive-reap acquisition.
pub const DEFAULT_REAP_BATCH_SIZE: usize = 1024;

/// Default maximum key length in bytes.
pub const DEFAULT_MAX_KEY_BYTES: usize = 1024;

/// Default `keys()` result limit.
pub const DEFAULT_KEYS_LIMIT: usize = 1000;

/// Which eviction policy orders the engine's eviction index.
///
/// Fixed at construction; runtime policy switching is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionPolicyKind {
    /// Evict the least-recently-accessed entry.
    Lru,
    /// Evict the least-frequently-accessed entry.
    Lfu,
    /// Evict the entry closest to expiry (no-expiry entries evicted last).
    Ttl,
    /// Evict the largest entry by estimated size.
    Size,
}

impl Default for EvictionPolicyKind {
    fn default() -> Self {
        EvictionPolicyKind::Lru
    }
}

/// Construction-time configuration for a `CacheEngine`.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries before eviction kicks in.
    pub max_size: usize,
    /// Maximum total estimated bytes before eviction kicks in.
    pub max_bytes: usize,
    /// Eviction policy, fixed for the engine's lifetime.
    pub policy: EvictionPolicyKind,
    /// Interval between proactive reaper sweeps.
    pub cleanup_interval: Duration,
    /// Per-entry size overhead folded into `size_bytes`.
    pub per_entry_overhead_bytes: usize,
    /// TTL applied to `set` calls that omit an explicit ttl. `None` means
    /// such entries never expire.
    pub default_ttl: Option<Duration>,
    /// Maximum accepted key length in bytes.
    pub max_key_bytes: usize,
    /// Default `keys()` result limit when the caller doesn't specify one.
    pub keys_default_limit: usize,
    /// Maximum batch size a single proactive-reap acquisition processes
    /// before releasing its lock and yielding to foreground operations.
    pub reap_batch_size: usize,
    /// Number of independent shards backing the entry store. Defaults to 1
    /// (exact, globally-ordered eviction); raise for throughput at the cost
    /// of only per-shard eviction ordering guarantees.
    pub shard_count: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_size: DEFAULT_MAX_SIZE,
            max_bytes: DEFAULT_MAX_BYTES,
            policy: EvictionPolicyKind::default(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            per_entry_overhead_bytes: DEFAULT_PER_ENTRY_OVERHEAD_BYTES,
            default_ttl: None,
            max_key_bytes: DEFAULT_MAX_KEY_BYTES,
            keys_default_limit: DEFAULT_KEYS_LIMIT,
            reap_batch_size: DEFAULT_REAP_BATCH_SIZE,
            shard_count: 1,
        }
    }
}

impl CacheConfig {
    /// Starts from the defaults with an explicit policy; the common
    /// construction path in tests and examples.
    pub fn with_policy(policy: EvictionPolicyKind) -> Self {
        CacheConfig {
            policy,
            ..CacheConfig::default()
        }
    }
}
