//! # Error Taxonomy
//!
//! Purpose: Define the error surface the engine returns to its caller, one
//! variant per outcome the HTTP adapter needs to map onto a status code.
//!
//! ## Design Principles
//!
//! 1. **No Retries Here**: the engine performs no internal retries; callers
//!    see the first failure and decide whether to retry.
//! 2. **Adapter-Friendly**: each variant corresponds 1:1 to a documented
//!    HTTP status in the surrounding (out-of-scope) adapter.
//! 3. **Cheap to Construct**: no heap allocation on the hot miss/evict paths.

use thiserror::Error;

/// Errors returned by `cache-engine` public operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent or expired at read time.
    #[error("key not found")]
    NotFound,

    /// A single value's estimated size exceeds the configured byte budget.
    #[error("entry size {size_bytes} exceeds max_bytes {max_bytes}")]
    EntryTooLarge { size_bytes: usize, max_bytes: usize },

    /// Eviction could not free enough space to admit a new entry.
    #[error("capacity exceeded: cannot admit entry within configured limits")]
    CapacityExceeded,

    /// Key is empty or exceeds the configured maximum key length.
    #[error("invalid key: length {len} (must be 1..={max_len})")]
    InvalidKey { len: usize, max_len: usize },

    /// TTL is zero, negative, or otherwise not a positive integer of seconds.
    #[error("invalid ttl: must be a positive integer number of seconds")]
    InvalidTtl,

    /// The engine is shutting down and rejects new operations.
    #[error("engine is shutting down")]
    ShuttingDown,
}

/// Convenience alias used throughout `cache-engine`.
pub type CacheResult<T> = Result<T, CacheError>;
