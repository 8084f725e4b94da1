//! Eviction correctness per policy, and the cross-policy invariants from
//! the testable-properties checklist: size/bytes consistency, capacity
//! bounds, and hit/miss accounting.

use std::time::Duration;

use bytes::Bytes;
use cache_engine::{CacheConfig, CacheEngine, EvictionPolicyKind};

fn engine_with(policy: EvictionPolicyKind, max_size: usize) -> CacheEngine {
    CacheEngine::new(CacheConfig {
        max_size,
        max_bytes: 10_000_000,
        ..CacheConfig::with_policy(policy)
    })
}

fn v(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

#[test]
fn lru_evicts_first_inserted_with_no_reads() {
    let engine = engine_with(EvictionPolicyKind::Lru, 4);
    for k in ["a", "b", "c", "d"] {
        engine.set(k.as_bytes(), v("x"), None).unwrap();
    }
    engine.set(b"e", v("x"), None).unwrap();

    assert!(engine.get(b"a").is_err());
    for k in ["b", "c", "d", "e"] {
        assert!(engine.get(k.as_bytes()).is_ok());
    }
}

#[test]
fn lfu_never_evicts_the_twice_read_key() {
    let engine = engine_with(EvictionPolicyKind::Lfu, 4);
    for k in ["k1", "k2", "k3", "k4"] {
        engine.set(k.as_bytes(), v("x"), None).unwrap();
    }
    engine.get(b"k1").unwrap();
    engine.get(b"k1").unwrap();

    engine.set(b"k5", v("x"), None).unwrap();

    assert!(engine.get(b"k1").is_ok());
}

#[test]
fn ttl_evicts_smallest_expiry_first() {
    let engine = engine_with(EvictionPolicyKind::Ttl, 3);
    engine
        .set(b"long", v("x"), Some(Duration::from_secs(3600)))
        .unwrap();
    engine
        .set(b"short", v("x"), Some(Duration::from_secs(60)))
        .unwrap();
    engine
        .set(b"medium", v("x"), Some(Duration::from_secs(600)))
        .unwrap();

    engine.set(b"overflow", v("x"), None).unwrap();

    assert!(engine.get(b"short").is_err());
    assert!(engine.get(b"long").is_ok());
    assert!(engine.get(b"medium").is_ok());
    assert!(engine.get(b"overflow").is_ok());
}

#[test]
fn size_evicts_largest_value_first() {
    let engine = engine_with(EvictionPolicyKind::Size, 3);
    engine.set(b"small", v("x"), None).unwrap();
    engine
        .set(b"large", Bytes::from(vec![0u8; 5000]), None)
        .unwrap();
    engine.set(b"medium", Bytes::from(vec![0u8; 500]), None).unwrap();

    engine.set(b"new", v("x"), None).unwrap();

    assert!(engine.get(b"large").is_err());
    assert!(engine.get(b"small").is_ok());
    assert!(engine.get(b"medium").is_ok());
    assert!(engine.get(b"new").is_ok());
}

#[test]
fn size_and_count_stay_consistent_across_a_mixed_sequence() {
    let engine = engine_with(EvictionPolicyKind::Lru, 10);
    for i in 0..30u32 {
        let key = format!("key-{i}");
        engine.set(key.as_bytes(), v("payload"), None).unwrap();
        let stats = engine.stats();
        assert!(stats.current_size <= 10);
        assert!(stats.current_bytes <= 10_000_000);
    }

    for i in 20..30u32 {
        let key = format!("key-{i}");
        engine.delete(key.as_bytes()).unwrap();
    }
    assert_eq!(engine.stats().current_size, 0);
    assert_eq!(engine.stats().current_bytes, 0);
}

#[test]
fn update_that_grows_an_entry_evicts_to_stay_within_max_bytes() {
    let engine = CacheEngine::new(CacheConfig {
        max_size: 10,
        max_bytes: 1000,
        per_entry_overhead_bytes: 200,
        ..CacheConfig::with_policy(EvictionPolicyKind::Lru)
    });

    engine.set(b"a", Bytes::from(vec![0u8; 300]), None).unwrap();
    engine.set(b"b", Bytes::from(vec![0u8; 200]), None).unwrap();
    assert_eq!(engine.stats().current_bytes, 902);

    // Growing "a" in place would push current_bytes to 1002; the update
    // path must evict "b" to bring the store back within max_bytes.
    engine.set(b"a", Bytes::from(vec![0u8; 400]), None).unwrap();

    let stats = engine.stats();
    assert!(stats.current_bytes <= 1000);
    assert!(engine.get(b"b").is_err());
    assert_eq!(engine.get(b"a").unwrap().len(), 400);
}

#[test]
fn hits_plus_misses_equals_get_call_count() {
    let engine = engine_with(EvictionPolicyKind::Lru, 10);
    engine.set(b"present", v("x"), None).unwrap();

    let mut get_calls = 0u64;
    for key in ["present", "absent", "present", "absent", "absent"] {
        let _ = engine.get(key.as_bytes());
        get_calls += 1;
    }

    let stats = engine.stats();
    assert_eq!(stats.hits + stats.misses, get_calls);
}

#[test]
fn round_trip_before_expiry() {
    let engine = engine_with(EvictionPolicyKind::Lru, 10);
    engine
        .set(b"k", v("value"), Some(Duration::from_secs(60)))
        .unwrap();
    assert_eq!(engine.get(b"k").unwrap(), v("value"));
}
