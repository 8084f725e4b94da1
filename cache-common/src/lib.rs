//! # cache-common
//!
//! Shared error types and small plain-old-data types used across the cache
//! engine crate boundary. No locking, no I/O — just the vocabulary the
//! engine and (eventually) an HTTP adapter agree on.

pub mod error;

pub use error::{CacheError, CacheResult};
