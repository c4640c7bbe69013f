//! Pair counting for BPE training.
//!
//! Chunks are deduplicated on the way in, so a chunk that occurs a
//! thousand times is stored once with a weight of 1000. Pairs are only
//! counted inside a chunk, never across two chunks.

use ahash::AHashMap;
use bytemerge_core::{byte_symbols, Pair};
use rayon::prelude::*;

/// Counter for BPE pair frequencies.
#[derive(Debug, Clone, Default)]
pub struct PairCounter {
    /// Chunk bytes -> position in `words`
    index: AHashMap<Vec<u8>, usize>,
    /// Each distinct chunk as symbol ids
    words: Vec<Vec<u32>>,
    /// Occurrences of each distinct chunk
    word_counts: Vec<u64>,
}

impl PairCounter {
    /// Create a new pair counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of a chunk.
    pub fn add_chunk(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Some(&pos) = self.index.get(bytes) {
            self.word_counts[pos] += 1;
            return;
        }

        self.index.insert(bytes.to_vec(), self.words.len());
        self.words.push(byte_symbols(bytes));
        self.word_counts.push(1);
    }

    /// Add every chunk of an iterator.
    pub fn add_chunks<I, S>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        for chunk in chunks {
            self.add_chunk(chunk.as_ref());
        }
    }

    /// Count adjacent pairs in each sequence, one occurrence per sequence.
    pub fn count<S: AsRef<[u32]>>(sequences: &[S]) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for sequence in sequences {
            for window in sequence.as_ref().windows(2) {
                *pair_counts.entry((window[0], window[1])).or_insert(0) += 1;
            }
        }

        pair_counts
    }

    /// Count adjacent pairs with each word weighted by its count.
    pub fn count_weighted(words: &[Vec<u32>], weights: &[u64]) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for (word, &weight) in words.iter().zip(weights) {
            for window in word.windows(2) {
                *pair_counts.entry((window[0], window[1])).or_insert(0) += weight;
            }
        }

        pair_counts
    }

    /// Same as [`PairCounter::count_weighted`], as a parallel map-reduce.
    pub fn count_parallel(words: &[Vec<u32>], weights: &[u64]) -> AHashMap<Pair, u64> {
        words
            .par_iter()
            .zip(weights.par_iter())
            .fold(AHashMap::new, |mut acc: AHashMap<Pair, u64>, (word, &weight)| {
                for window in word.windows(2) {
                    *acc.entry((window[0], window[1])).or_insert(0) += weight;
                }
                acc
            })
            .reduce(AHashMap::new, |mut acc, pair_counts| {
                for (pair, count) in pair_counts {
                    *acc.entry(pair).or_insert(0) += count;
                }
                acc
            })
    }

    /// Count all pairs of the collected chunks sequentially.
    pub fn count_pairs_sequential(&self) -> AHashMap<Pair, u64> {
        Self::count_weighted(&self.words, &self.word_counts)
    }

    /// Count all pairs of the collected chunks in parallel.
    pub fn count_pairs_parallel(&self) -> AHashMap<Pair, u64> {
        Self::count_parallel(&self.words, &self.word_counts)
    }

    /// Get the number of unique chunks.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Get the total count of all chunk occurrences.
    pub fn total_word_occurrences(&self) -> u64 {
        self.word_counts.iter().sum()
    }

    /// Get a reference to the words.
    pub fn words(&self) -> &[Vec<u32>] {
        &self.words
    }

    /// Get a reference to the word counts.
    pub fn word_counts(&self) -> &[u64] {
        &self.word_counts
    }

    /// Consume the counter, returning the distinct words and their counts.
    pub fn into_parts(self) -> (Vec<Vec<u32>>, Vec<u64>) {
        (self.words, self.word_counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_chunk_dedups() {
        let mut counter = PairCounter::new();
        counter.add_chunks(["ab", "ab", "c", ""]);

        assert_eq!(counter.word_count(), 2);
        assert_eq!(counter.total_word_occurrences(), 3);
        assert_eq!(counter.words()[0], vec![97, 98]);
        assert_eq!(counter.word_counts(), &[2, 1]);
    }

    #[test]
    fn test_count_overlapping_windows() {
        let pairs = PairCounter::count(&[vec![97u32, 97, 97]]);
        assert_eq!(pairs.get(&(97, 97)), Some(&2));
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_count_never_crosses_sequences() {
        let pairs = PairCounter::count(&[vec![1u32, 2], vec![3, 4]]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.get(&(2, 3)), None);
    }

    #[test]
    fn test_count_pairs_with_frequency() {
        let mut counter = PairCounter::new();
        counter.add_chunks(["ab", "ab", "ab"]);

        let pairs = counter.count_pairs_sequential();
        assert_eq!(pairs.get(&(97, 98)), Some(&3));
    }

    #[test]
    fn test_count_pairs_parallel_matches_sequential() {
        let mut counter = PairCounter::new();
        counter.add_chunks(["abc", "bcd", "cde", "abc", "hello", "world"]);

        let sequential = counter.count_pairs_sequential();
        let parallel = counter.count_pairs_parallel();
        assert_eq!(sequential, parallel);

        assert_eq!(parallel.get(&(97, 98)), Some(&2)); // (a,b)
        assert_eq!(parallel.get(&(98, 99)), Some(&3)); // (b,c)
        assert_eq!(parallel.get(&(99, 100)), Some(&2)); // (c,d)
        assert_eq!(parallel.get(&(100, 101)), Some(&1)); // (d,e)
    }
}
