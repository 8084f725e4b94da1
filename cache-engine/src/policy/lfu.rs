//! Least-frequently-used eviction index.
//!
//! A bucketed-by-frequency scheme: entries are grouped into FIFO queues
//! keyed by `access_count`, and the queues themselves are kept in a
//! `BTreeMap` ordered by frequency. Picking a victim is "smallest key in
//! the map, front of its queue" — the queue's FIFO order breaks ties by
//! older `accessed_at` for free, since a `touch` always re-appends to the
//! back of its (possibly new) bucket.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Instant;

use super::EvictionIndex;
use crate::entry::Entry;

#[derive(Debug, Default)]
pub struct LfuIndex {
    buckets: BTreeMap<u64, VecDeque<usize>>,
    freq_of: HashMap<usize, u64>,
}

impl LfuIndex {
    pub fn new() -> Self {
        LfuIndex {
            buckets: BTreeMap::new(),
            freq_of: HashMap::new(),
        }
    }

    fn detach(&mut self, idx: usize) {
        if let Some(freq) = self.freq_of.remove(&idx) {
            if let Some(queue) = self.buckets.get_mut(&freq) {
                if let Some(pos) = queue.iter().position(|&i| i == idx) {
                    queue.remove(pos);
                }
                if queue.is_empty() {
                    self.buckets.remove(&freq);
                }
            }
        }
    }

    fn attach(&mut self, idx: usize, freq: u64) {
        self.buckets.entry(freq).or_default().push_back(idx);
        self.freq_of.insert(idx, freq);
    }
}

impl EvictionIndex for LfuIndex {
    fn insert(&mut self, idx: usize, entry: &Entry) {
        self.attach(idx, entry.access_count);
    }

    fn remove(&mut self, idx: usize) {
        self.detach(idx);
    }

    fn touch(&mut self, idx: usize, entry: &Entry) {
        self.detach(idx);
        self.attach(idx, entry.access_count);
    }

    fn pick_victim(&mut self, _now: Instant) -> Option<usize> {
        self.buckets
            .iter()
            .next()
            .and_then(|(_, queue)| queue.front().copied())
    }

    fn len(&self) -> usize {
        self.freq_of.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn entry_with_count(count: u64) -> Entry {
        let mut e = Entry::new(Arc::from(b"k".as_slice()), bytes::Bytes::new(), Instant::now(), None, 0);
        e.access_count = count;
        e
    }

    #[test]
    fn evicts_lowest_frequency() {
        let mut idx = LfuIndex::new();
        idx.insert(1, &entry_with_count(1));
        idx.insert(2, &entry_with_count(1));
        idx.touch(1, &entry_with_count(2));
        // idx 2 still at frequency 1, idx 1 moved to frequency 2
        assert_eq!(idx.pick_victim(Instant::now()), Some(2));
    }

    #[test]
    fn ties_broken_fifo_within_bucket() {
        let mut idx = LfuIndex::new();
        idx.insert(1, &entry_with_count(1));
        idx.insert(2, &entry_with_count(1));
        idx.insert(3, &entry_with_count(1));
        assert_eq!(idx.pick_victim(Instant::now()), Some(1));
    }

    #[test]
    fn remove_clears_bucket() {
        let mut idx = LfuIndex::new();
        idx.insert(1, &entry_with_count(1));
        idx.remove(1);
        assert_eq!(idx.pick_victim(Instant::now()), None);
        assert_eq!(idx.len(), 0);
    }
}
