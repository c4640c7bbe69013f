//! The fixed 256-symbol byte alphabet.
//!
//! Ids `0..=255` stand for the byte of the same value and are never
//! remapped. Every id above that range is produced by a merge.

/// Number of single-byte symbols at the bottom of every vocabulary.
pub const BYTE_ALPHABET_SIZE: usize = 256;

/// First id handed out by training.
pub const FIRST_MERGE_ID: u32 = BYTE_ALPHABET_SIZE as u32;

/// Map raw bytes onto their symbol ids.
#[inline]
pub fn byte_symbols(bytes: &[u8]) -> Vec<u32> {
    bytes.iter().map(|&b| b as u32).collect()
}
