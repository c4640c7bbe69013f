//! Byte-level BPE encoding.
//!
//! A chunk starts as its raw UTF-8 bytes, one symbol per byte. Learned
//! merges are then applied lowest id first until no adjacent pair in the
//! chunk has a learned merge.

use crate::core::alphabet::byte_symbols;
use crate::core::merges::{merge_pair_in_place, MergeTable, Pair};
use std::sync::Arc;

/// Applies a merge table to byte sequences.
///
/// The merge table is shared, so cloning an encoder is cheap and clones
/// can be handed to worker threads.
#[derive(Debug, Clone)]
pub struct ByteLevelEncoder {
    merges: Arc<MergeTable>,
}

impl ByteLevelEncoder {
    /// Create an encoder over a shared merge table.
    pub fn new(merges: Arc<MergeTable>) -> Self {
        Self { merges }
    }

    /// The merge table this encoder applies.
    pub fn merges(&self) -> &Arc<MergeTable> {
        &self.merges
    }

    /// Encode one chunk of bytes.
    ///
    /// The result never depends on bytes outside `bytes`; callers split
    /// text into chunks first.
    pub fn encode_chunk(&self, bytes: &[u8]) -> Vec<u32> {
        let mut ids = byte_symbols(bytes);
        self.apply_merges(&mut ids);
        ids
    }

    /// Encode a chunk, appending the ids to `out`.
    pub fn encode_chunk_into(&self, bytes: &[u8], out: &mut Vec<u32>) {
        if bytes.len() == 1 {
            out.push(bytes[0] as u32);
            return;
        }
        out.extend(self.encode_chunk(bytes));
    }

    /// Repeatedly merge the present pair with the smallest merged id.
    ///
    /// Merged ids grow in learned order, so the smallest id is the
    /// earliest merge. Every occurrence of that pair is replaced in one
    /// left-to-right pass before the next pair is chosen.
    fn apply_merges(&self, ids: &mut Vec<u32>) {
        if self.merges.is_empty() {
            return;
        }

        while ids.len() >= 2 {
            let best = ids
                .windows(2)
                .filter_map(|w| {
                    let pair: Pair = (w[0], w[1]);
                    self.merges.get(pair).map(|new_id| (new_id, pair))
                })
                .min();

            match best {
                Some((new_id, pair)) => {
                    merge_pair_in_place(ids, pair, new_id);
                }
                None => break,
            }
        }
    }
}
