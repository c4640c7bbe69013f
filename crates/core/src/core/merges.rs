//! Merge table management for BPE.
//!
//! Merges are stored in the order they were learned. Position `k` always
//! produces id `256 + k`, so the resulting id doubles as the merge rank:
//! a smaller id means the merge was learned earlier and wins at encode time.

use super::alphabet::FIRST_MERGE_ID;
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;

/// A pair of token IDs that can be merged.
pub type Pair = (u32, u32);

/// Lookup index: pair -> id of the merged token.
pub type MergeMap = AHashMap<Pair, u32>;

/// Ordered collection of learned merges with O(1) pair lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    /// Merges in learned order: (pair, new_token_id)
    entries: Vec<(Pair, u32)>,
    /// pair -> new_token_id
    index: MergeMap,
}

impl MergeTable {
    /// Create a new empty merge table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new merge table with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: MergeMap::with_capacity(capacity),
        }
    }

    /// Build a table from pairs in learned order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Result<Self> {
        let mut table = Self::new();
        for pair in pairs {
            table.push(pair)?;
        }
        Ok(table)
    }

    /// The id the next pushed merge will receive.
    #[inline]
    pub fn next_id(&self) -> u32 {
        FIRST_MERGE_ID + self.entries.len() as u32
    }

    /// Append a merge and return the id assigned to it.
    ///
    /// Fails if the pair was already learned or references an id that
    /// does not exist yet.
    pub fn push(&mut self, pair: Pair) -> Result<u32> {
        let new_id = self.next_id();

        if pair.0 >= new_id || pair.1 >= new_id {
            return Err(TokenizerError::InvalidMerge(format!(
                "pair ({}, {}) references an id not defined before {}",
                pair.0, pair.1, new_id
            )));
        }
        if let Some(existing) = self.index.get(&pair) {
            return Err(TokenizerError::InvalidMerge(format!(
                "pair ({}, {}) already merged into {}",
                pair.0, pair.1, existing
            )));
        }

        self.entries.push((pair, new_id));
        self.index.insert(pair, new_id);

        Ok(new_id)
    }

    /// Get the id produced by merging `pair`, if it was learned.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<u32> {
        self.index.get(&pair).copied()
    }

    /// Get the pair that produced `id`, if `id` is a merged token.
    pub fn pair_for(&self, id: u32) -> Option<Pair> {
        let pos = id.checked_sub(FIRST_MERGE_ID)? as usize;
        self.entries.get(pos).map(|&(pair, _)| pair)
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (pair, new_token_id) in learned order.
    pub fn iter(&self) -> impl Iterator<Item = (Pair, u32)> + '_ {
        self.entries.iter().copied()
    }
}

impl PartialEq for MergeTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for MergeTable {}

/// Replace every non-overlapping occurrence of `pair` in `ids`, scanning
/// left to right, with `new_id`.
///
/// Returns the number of replacements made.
pub fn merge_pair_in_place(ids: &mut Vec<u32>, pair: Pair, new_id: u32) -> usize {
    let mut read = 0;
    let mut write = 0;
    let mut replaced = 0;

    while read < ids.len() {
        if read + 1 < ids.len() && ids[read] == pair.0 && ids[read + 1] == pair.1 {
            ids[write] = new_id;
            read += 2;
            replaced += 1;
        } else {
            ids[write] = ids[read];
            read += 1;
        }
        write += 1;
    }
    ids.truncate(write);

    replaced
}
