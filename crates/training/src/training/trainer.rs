//! BPE trainer implementation.
//!
//! The trainer learns merges over the 256 byte symbols. Every round picks
//! the most frequent adjacent pair (ties go to the smallest pair), assigns
//! it the next id and rewrites the chunks that contain it.

use super::counter::PairCounter;
use ahash::{AHashMap, AHashSet};
use bytemerge_core::{
    merge_pair_in_place, MergeTable, Pair, PairPriorityQueue, Result, TokenizerError, Vocabulary,
    BYTE_ALPHABET_SIZE,
};
use log::{debug, info};

/// Configuration for BPE training.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Target vocabulary size, byte symbols included
    pub vocab_size: usize,
    /// Minimum frequency for a pair to be merged
    pub min_frequency: u64,
    /// Whether to count the initial pairs in parallel
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 1_000,
            min_frequency: 2,
            parallel: false,
        }
    }
}

impl TrainingConfig {
    /// Check the configuration before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size < BYTE_ALPHABET_SIZE {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size must be at least {}, got {}",
                BYTE_ALPHABET_SIZE, self.vocab_size
            )));
        }
        Ok(())
    }

    /// Number of merges needed to reach the target size.
    pub fn num_merges(&self) -> usize {
        self.vocab_size.saturating_sub(BYTE_ALPHABET_SIZE)
    }
}

/// BPE trainer.
///
/// A trainer is reusable: all growing state lives in a [`TrainingState`]
/// created by each `train` call.
#[derive(Debug, Clone, Default)]
pub struct BpeTrainer {
    config: TrainingConfig,
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Create a trainer with the default configuration and a target size.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self::new(TrainingConfig {
            vocab_size,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on pre-split chunks.
    ///
    /// Pairs are only counted and merged inside a chunk. Pass the whole
    /// corpus as a single chunk to let merges span it freely.
    ///
    /// Returns the vocabulary and the merges in learned order.
    pub fn train<I, S>(&self, chunks: I) -> Result<(Vocabulary, MergeTable)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.config.validate()?;

        let mut counter = PairCounter::new();
        counter.add_chunks(chunks);

        let mut state = TrainingState::new(counter, &self.config);
        let num_merges = self.config.num_merges();
        let min_frequency = self.config.min_frequency.max(1);

        info!(
            "Starting BPE training: {} merges requested over {} unique chunks ({} total)",
            num_merges,
            state.words.len(),
            state.word_counts.iter().sum::<u64>()
        );

        // The target only bounds the merge count; size for what the corpus holds.
        let capacity = num_merges.min(state.pair_counts.len());
        let mut merges = MergeTable::with_capacity(capacity);
        let mut vocab = Vocabulary::with_capacity(BYTE_ALPHABET_SIZE + capacity);
        let mut last_log_percent = 0;

        while merges.len() < num_merges {
            let candidate = match state.queue.pop() {
                Some(c) => c,
                None => break,
            };
            if candidate.count < min_frequency {
                break;
            }

            let new_id = merges.push(candidate.pair)?;
            vocab.add_merge(candidate.pair)?;
            state.apply_merge(candidate.pair, new_id);

            debug!(
                "merge {}: {:?} -> {} (count {})",
                merges.len(),
                candidate.pair,
                new_id,
                candidate.count
            );

            let percent = merges.len() * 100 / num_merges;
            if percent >= last_log_percent + 10 {
                info!("Progress: {}% ({}/{})", percent, merges.len(), num_merges);
                last_log_percent = percent;
            }
        }

        info!(
            "Training finished: {} merges, vocabulary size {}",
            merges.len(),
            vocab.len()
        );

        Ok((vocab, merges))
    }
}

/// Mutable state of one training run.
///
/// Invariant: `pair_counts` always equals a full weighted recount of
/// `words`, and every pair with a non-zero count has a live entry in
/// `queue`.
pub struct TrainingState {
    /// Distinct chunks as symbol ids, rewritten in place
    words: Vec<Vec<u32>>,
    /// Occurrences of each distinct chunk
    word_counts: Vec<u64>,
    /// Live weighted pair frequencies
    pair_counts: AHashMap<Pair, u64>,
    /// Pair -> chunks that may contain it; may hold stale indices
    pair_index: AHashMap<Pair, AHashSet<usize>>,
    queue: PairPriorityQueue,
}

impl TrainingState {
    /// Count the initial pairs and seed the queue.
    pub fn new(counter: PairCounter, config: &TrainingConfig) -> Self {
        let pair_counts = if config.parallel {
            counter.count_pairs_parallel()
        } else {
            counter.count_pairs_sequential()
        };
        let (words, word_counts) = counter.into_parts();

        let mut pair_index: AHashMap<Pair, AHashSet<usize>> =
            AHashMap::with_capacity(pair_counts.len());
        for (i, word) in words.iter().enumerate() {
            for window in word.windows(2) {
                pair_index.entry((window[0], window[1])).or_default().insert(i);
            }
        }

        let mut queue = PairPriorityQueue::with_capacity(pair_counts.len());
        for (&pair, &count) in &pair_counts {
            queue.update(pair, count);
        }

        Self {
            words,
            word_counts,
            pair_counts,
            pair_index,
            queue,
        }
    }

    /// Live frequency of a pair.
    pub fn pair_count(&self, pair: Pair) -> u64 {
        self.pair_counts.get(&pair).copied().unwrap_or(0)
    }

    /// The current symbol ids of every distinct chunk.
    pub fn words(&self) -> &[Vec<u32>] {
        &self.words
    }

    /// Replace `pair` with `new_id` in every chunk and update the counts.
    ///
    /// Only chunks listed for `pair` are touched. For each one the pairs
    /// of the old sequence are subtracted and the pairs of the new one
    /// added, weighted by the chunk's occurrences.
    pub fn apply_merge(&mut self, pair: Pair, new_id: u32) {
        let affected = match self.pair_index.remove(&pair) {
            Some(affected) => affected,
            None => return,
        };

        let mut deltas: AHashMap<Pair, i64> = AHashMap::new();

        for idx in affected {
            let word = &mut self.words[idx];
            if !word.windows(2).any(|w| (w[0], w[1]) == pair) {
                continue;
            }
            let weight = self.word_counts[idx] as i64;

            for window in word.windows(2) {
                *deltas.entry((window[0], window[1])).or_insert(0) -= weight;
            }
            merge_pair_in_place(word, pair, new_id);
            for window in word.windows(2) {
                let p = (window[0], window[1]);
                *deltas.entry(p).or_insert(0) += weight;
                self.pair_index.entry(p).or_default().insert(idx);
            }
        }

        for (p, delta) in deltas {
            if delta == 0 {
                continue;
            }
            let current = self.pair_counts.get(&p).copied().unwrap_or(0) as i64;
            let updated = (current + delta).max(0) as u64;

            if updated == 0 {
                self.pair_counts.remove(&p);
            } else {
                self.pair_counts.insert(p, updated);
            }
            self.queue.update(p, updated);
        }
    }
}
