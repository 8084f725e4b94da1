//! Time-to-live eviction index.
//!
//! A min-heap keyed by `expires_at`. Entries with no expiry
//! are held in a separate reserve and are only eligible for eviction once
//! the heap is empty. Heap entries become stale when an entry's `expires_at`
//! changes (an update via `touch`) or it is removed; staleness is resolved
//! lazily at `pick_victim` time by checking the popped candidate against the
//! current source of truth (`current_expiry`) rather than eagerly
//! rebuilding the heap.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use super::EvictionIndex;
use crate::entry::Entry;

#[derive(Debug, Default)]
pub struct TtlIndex {
    heap: BinaryHeap<Reverse<(Instant, usize)>>,
    current_expiry: HashMap<usize, Instant>,
    no_expiry: HashSet<usize>,
}

impl TtlIndex {
    pub fn new() -> Self {
        TtlIndex {
            heap: BinaryHeap::new(),
            current_expiry: HashMap::new(),
            no_expiry: HashSet::new(),
        }
    }

    fn detach(&mut self, idx: usize) {
        self.current_expiry.remove(&idx);
        self.no_expiry.remove(&idx);
    }

    fn attach(&mut self, idx: usize, entry: &Entry) {
        match entry.expires_at {
            Some(deadline) => {
                self.current_expiry.insert(idx, deadline);
                self.heap.push(Reverse((deadline, idx)));
            }
            None => {
                self.no_expiry.insert(idx);
            }
        }
    }
}

impl EvictionIndex for TtlIndex {
    fn insert(&mut self, idx: usize, entry: &Entry) {
        self.attach(idx, entry);
    }

    fn remove(&mut self, idx: usize) {
        self.detach(idx);
    }

    fn touch(&mut self, idx: usize, entry: &Entry) {
        self.detach(idx);
        self.attach(idx, entry);
    }

    fn pick_victim(&mut self, _now: Instant) -> Option<usize> {
        loop {
            match self.heap.peek() {
                Some(&Reverse((deadline, idx))) => {
                    match self.current_expiry.get(&idx) {
                        Some(&current) if current == deadline => return Some(idx),
                        _ => {
                            // Stale entry (removed, or superseded by a later touch).
                            self.heap.pop();
                        }
                    }
                }
                None => break,
            }
        }
        self.no_expiry.iter().next().copied()
    }

    fn len(&self) -> usize {
        self.current_expiry.len() + self.no_expiry.len()
    }
}
