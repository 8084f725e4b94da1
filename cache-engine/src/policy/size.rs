//! Largest-entry-first eviction index.
//!
//! A max-heap keyed by `size_bytes`, with ties broken toward the entry that
//! was accessed longest ago (smaller `accessed_at`). Same lazy-deletion
//! shape as `TtlIndex`: a heap entry is only trustworthy if it still
//! matches the current source-of-truth record for its slot, so `pick_victim`
//! discards stale entries until it finds (or exhausts) a live one.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use super::EvictionIndex;
use crate::entry::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Key {
    size_bytes: usize,
    accessed_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    key: Key,
    idx: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .size_bytes
            .cmp(&other.key.size_bytes)
            // Older accessed_at should sort as "larger" so it surfaces first
            // among equal sizes, since BinaryHeap is a max-heap.
            .then_with(|| other.key.accessed_at.cmp(&self.key.accessed_at))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct SizeIndex {
    heap: BinaryHeap<HeapEntry>,
    current: HashMap<usize, Key>,
}

impl SizeIndex {
    pub fn new() -> Self {
        SizeIndex {
            heap: BinaryHeap::new(),
            current: HashMap::new(),
        }
    }

    fn key_of(entry: &Entry) -> Key {
        Key {
            size_bytes: entry.size_bytes,
            accessed_at: entry.accessed_at,
        }
    }
}

impl EvictionIndex for SizeIndex {
    fn insert(&mut self, idx: usize, entry: &Entry) {
        let key = Self::key_of(entry);
        self.current.insert(idx, key);
        self.heap.push(HeapEntry { key, idx });
    }

    fn remove(&mut self, idx: usize) {
        self.current.remove(&idx);
    }

    fn touch(&mut self, idx: usize, entry: &Entry) {
        self.insert(idx, entry);
    }

    fn pick_victim(&mut self, _now: Instant) -> Option<usize> {
        loop {
            let candidate = *self.heap.peek()?;
            match self.current.get(&candidate.idx) {
                Some(&key) if key == candidate.key => return Some(candidate.idx),
                _ => {
                    self.heap.pop();
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.current.len()
    }
}
