//! Literal boundary scenarios, LRU policy, max_size=3, max_bytes=10_000_000,
//! overhead=200 bytes, run against the full admission/eviction path rather
//! than a single storage primitive.

use std::sync::Once;
use std::time::Duration;

use bytes::Bytes;
use cache_engine::{CacheConfig, CacheEngine, CacheError, EvictionPolicyKind};

static TRACING_INIT: Once = Once::new();

/// Installs a process-wide subscriber so the engine's `#[instrument]`ed
/// operations are observable while these tests run, matching how a binary
/// embedding the engine is expected to wire up `tracing-subscriber`.
/// `Once`-guarded since every `#[test]` in this binary calls it.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

fn lru_engine() -> CacheEngine {
    init_tracing();
    CacheEngine::new(CacheConfig {
        max_size: 3,
        max_bytes: 10_000_000,
        policy: EvictionPolicyKind::Lru,
        per_entry_overhead_bytes: 200,
        ..CacheConfig::default()
    })
}

fn v(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

#[test]
fn scenario_1_read_before_insert_saves_from_eviction() {
    let engine = lru_engine();
    engine.set(b"a", v("1"), None).unwrap();
    engine.set(b"b", v("2"), None).unwrap();
    engine.set(b"c", v("3"), None).unwrap();
    engine.get(b"a").unwrap();
    engine.set(b"d", v("4"), None).unwrap();

    assert!(engine.get(b"b").is_err());
    assert!(engine.get(b"a").is_ok());
    assert!(engine.get(b"c").is_ok());
    assert!(engine.get(b"d").is_ok());

    let mut keys: Vec<Vec<u8>> = engine
        .keys(None, None)
        .unwrap()
        .into_iter()
        .map(|k| k.to_vec())
        .collect();
    keys.sort();
    assert_eq!(keys, vec![b"a".to_vec(), b"c".to_vec(), b"d".to_vec()]);
}

#[test]
fn scenario_2_expiry_reports_miss_and_counts_expiration() {
    let engine = lru_engine();
    engine
        .set(b"x", v("v"), Some(Duration::from_millis(30)))
        .unwrap();
    std::thread::sleep(Duration::from_millis(80));

    assert_eq!(engine.get(b"x"), Err(CacheError::NotFound));
    assert_eq!(engine.stats().expirations, 1);
}

#[test]
fn scenario_3_update_resets_value_and_counts_second_set() {
    let engine = lru_engine();
    engine.set(b"k", v("small"), None).unwrap();
    engine.set(b"k", v("replaced"), None).unwrap();

    assert_eq!(engine.stats().current_size, 1);
    assert_eq!(engine.get(b"k").unwrap(), v("replaced"));
    assert_eq!(engine.stats().sets, 2);
}

#[test]
fn scenario_4_no_reads_evicts_first_inserted() {
    let engine = lru_engine();
    engine.set(b"a", v("1"), None).unwrap();
    engine.set(b"b", v("2"), None).unwrap();
    engine.set(b"c", v("3"), None).unwrap();
    engine.set(b"d", v("4"), None).unwrap();

    assert!(engine.get(b"a").is_err());
    assert_eq!(engine.stats().evictions, 1);
}

#[test]
fn scenario_5_clear_returns_count_and_keeps_eviction_counter() {
    let engine = lru_engine();
    engine.set(b"a", v("1"), None).unwrap();
    engine.set(b"b", v("2"), None).unwrap();
    engine.set(b"c", v("3"), None).unwrap();
    engine.set(b"d", v("4"), None).unwrap();
    assert_eq!(engine.stats().evictions, 1);

    let removed = engine.clear().unwrap();
    assert_eq!(removed, 3);
    assert_eq!(engine.stats().current_size, 0);
    assert_eq!(engine.stats().evictions, 1);
}

#[test]
fn scenario_6_oversized_entry_rejected_without_mutating_store() {
    let engine = lru_engine();
    engine.set(b"a", v("1"), None).unwrap();

    let oversized = Bytes::from(vec![0u8; 10_000_000]);
    let result = engine.set(b"huge", oversized, None);
    assert!(matches!(result, Err(CacheError::EntryTooLarge { .. })));
    assert_eq!(engine.stats().current_size, 1);
    assert!(engine.get(b"huge").is_err());
}

#[test]
fn update_with_omitted_ttl_clears_prior_expiry_even_with_a_configured_default() {
    let engine = CacheEngine::new(CacheConfig {
        max_size: 3,
        max_bytes: 10_000_000,
        policy: EvictionPolicyKind::Lru,
        per_entry_overhead_bytes: 200,
        default_ttl: Some(Duration::from_secs(3600)),
        ..CacheConfig::default()
    });

    engine
        .set(b"k", v("first"), Some(Duration::from_millis(30)))
        .unwrap();
    // Overwrite without a ttl: must clear the prior expiry outright, not
    // fall back to the configured default_ttl (that only seeds new inserts).
    engine.set(b"k", v("second"), None).unwrap();

    std::thread::sleep(Duration::from_millis(80));
    assert_eq!(engine.get(b"k").unwrap(), v("second"));
}

#[test]
fn new_insert_with_omitted_ttl_uses_configured_default() {
    let engine = CacheEngine::new(CacheConfig {
        max_size: 3,
        max_bytes: 10_000_000,
        policy: EvictionPolicyKind::Lru,
        per_entry_overhead_bytes: 200,
        default_ttl: Some(Duration::from_millis(30)),
        ..CacheConfig::default()
    });

    engine.set(b"k", v("value"), None).unwrap();
    std::thread::sleep(Duration::from_millis(80));
    assert_eq!(engine.get(b"k"), Err(CacheError::NotFound));
}
