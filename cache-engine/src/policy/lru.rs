//! Least-recently-used eviction index.
//!
//! An intrusive doubly linked list over slab indices, the same shape as
//! `hkv-engine`'s `ShardInner` LRU links, generalized to live behind
//! `EvictionIndex` instead of being wired directly into the shard. List
//! position alone defines the order, so no timestamp comparison is needed
//! at eviction time: the head is always the least recently used entry, and
//! ties between never-touched entries are broken by insertion order for
//! free since nothing ever reorders them apart.

use std::collections::HashMap;
use std::time::Instant;

use super::EvictionIndex;
use crate::entry::Entry;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked list of slab indices, ordered least-recently-used (head)
/// to most-recently-used (tail).
#[derive(Debug, Default)]
pub struct LruIndex {
    links: HashMap<usize, Link>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruIndex {
    pub fn new() -> Self {
        LruIndex {
            links: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let Link { prev, next } = match self.links.get(&idx) {
            Some(&link) => link,
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(link) = self.links.get_mut(&prev_idx) {
                    link.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(link) = self.links.get_mut(&next_idx) {
                    link.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn push_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        self.links.insert(
            idx,
            Link {
                prev: old_tail,
                next: None,
            },
        );

        match old_tail {
            Some(tail_idx) => {
                if let Some(link) = self.links.get_mut(&tail_idx) {
                    link.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

impl EvictionIndex for LruIndex {
    fn insert(&mut self, idx: usize, _entry: &Entry) {
        self.push_back(idx);
    }

    fn remove(&mut self, idx: usize) {
        self.unlink(idx);
        self.links.remove(&idx);
    }

    fn touch(&mut self, idx: usize, _entry: &Entry) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_back(idx);
    }

    fn pick_victim(&mut self, _now: Instant) -> Option<usize> {
        self.head
    }

    fn len(&self) -> usize {
        self.links.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn dummy_entry() -> Entry {
        Entry::new(Arc::from(b"k".as_slice()), bytes::Bytes::new(), Instant::now(), None, 0)
    }

    #[test]
    fn evicts_oldest_first() {
        let mut idx = LruIndex::new();
        let e = dummy_entry();
        idx.insert(1, &e);
        idx.insert(2, &e);
        idx.insert(3, &e);
        assert_eq!(idx.pick_victim(Instant::now()), Some(1));
    }

    #[test]
    fn touch_moves_to_back() {
        let mut idx = LruIndex::new();
        let e = dummy_entry();
        idx.insert(1, &e);
        idx.insert(2, &e);
        idx.insert(3, &e);
        idx.touch(1, &e);
        assert_eq!(idx.pick_victim(Instant::now()), Some(2));
    }

    #[test]
    fn remove_unlinks() {
        let mut idx = LruIndex::new();
        let e = dummy_entry();
        idx.insert(1, &e);
        idx.insert(2, &e);
        idx.remove(1);
        assert_eq!(idx.pick_victim(Instant::now()), Some(2));
        assert_eq!(idx.len(), 1);
    }
}
