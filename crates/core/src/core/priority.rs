//! Priority queue for BPE merge candidates.
//!
//! Entries are never updated in place. A changed count pushes a fresh
//! entry and older entries for the same pair become stale; `pop` skips
//! them by comparing against the live count.

use crate::core::merges::Pair;
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of token IDs to merge
    pub pair: Pair,
    /// The frequency/count of this pair
    pub count: u64,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: Pair, count: u64) -> Self {
        Self { pair, count }
    }
}

// Higher count first; among equal counts the smaller pair wins.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Live count per pair; anything else in the heap is stale
    current_counts: AHashMap<Pair, u64>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current_counts: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current_counts: AHashMap::new(),
        }
    }

    /// Set the live count for a pair and push a matching entry.
    ///
    /// A count of zero removes the pair.
    pub fn update(&mut self, pair: Pair, count: u64) {
        if count == 0 {
            self.remove(pair);
            return;
        }
        self.current_counts.insert(pair, count);
        self.heap.push(MergeCandidate::new(pair, count));
    }

    /// Invalidate every entry for a pair.
    pub fn remove(&mut self, pair: Pair) {
        self.current_counts.remove(&pair);
    }

    /// Pop the highest priority live merge candidate.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if self.current_counts.get(&candidate.pair) == Some(&candidate.count) {
                self.current_counts.remove(&candidate.pair);
                return Some(candidate);
            }
        }
        None
    }

    /// Get the live count for a pair.
    pub fn get_count(&self, pair: Pair) -> Option<u64> {
        self.current_counts.get(&pair).copied()
    }

    /// Get the number of (potentially stale) entries in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut queue = PairPriorityQueue::new();

        queue.update((0, 1), 10);
        queue.update((1, 2), 20);
        queue.update((2, 3), 15);

        let first = queue.pop().unwrap();
        assert_eq!(first.pair, (1, 2));
        assert_eq!(first.count, 20);

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (2, 3));

        let third = queue.pop().unwrap();
        assert_eq!(third.pair, (0, 1));

        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_tie_break_prefers_smallest_pair() {
        let mut queue = PairPriorityQueue::new();

        queue.update((256, 97), 2);
        queue.update((97, 98), 2);
        queue.update((97, 99), 2);

        assert_eq!(queue.pop().unwrap().pair, (97, 98));
        assert_eq!(queue.pop().unwrap().pair, (97, 99));
        assert_eq!(queue.pop().unwrap().pair, (256, 97));
    }

    #[test]
    fn test_stale_entry_detection() {
        let mut queue = PairPriorityQueue::new();

        queue.update((0, 1), 10);
        queue.update((1, 2), 20);
        queue.update((0, 1), 15);

        assert_eq!(queue.pop().unwrap().pair, (1, 2));

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (0, 1));
        assert_eq!(second.count, 15);

        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_count_returning_to_old_value() {
        let mut queue = PairPriorityQueue::new();

        queue.update((0, 1), 5);
        queue.update((0, 1), 3);
        queue.update((0, 1), 5);

        assert_eq!(queue.pop(), Some(MergeCandidate::new((0, 1), 5)));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_remove() {
        let mut queue = PairPriorityQueue::new();

        queue.update((0, 1), 10);
        queue.update((1, 2), 5);
        queue.remove((0, 1));
        queue.update((2, 3), 0);

        assert_eq!(queue.get_count((0, 1)), None);
        assert_eq!(queue.pop().unwrap().pair, (1, 2));
        assert!(queue.pop().is_none());
    }
}
