//! bytemerge-core - Core byte-level BPE data structures
//!
//! This crate provides the building blocks shared by training and
//! tokenization:
//!
//! - The fixed 256-symbol byte alphabet
//! - The ordered merge table and the vocabulary it implies
//! - The special-token table
//! - The priority queue used to pick merges during training
//! - Chunk encoding and id decoding
//!
//! # Example
//!
//! ```rust
//! use bytemerge_core::{ByteLevelEncoder, MergeTable, Vocabulary};
//! use std::sync::Arc;
//!
//! let merges = MergeTable::from_pairs([(104, 105)]).unwrap();
//! let vocab = Vocabulary::from_merges(&merges).unwrap();
//! assert_eq!(vocab.get_token(256), Some(&b"hi"[..]));
//!
//! let encoder = ByteLevelEncoder::new(Arc::new(merges));
//! assert_eq!(encoder.encode_chunk(b"hi!"), vec![256, 33]);
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod core;
pub use core::{
    byte_symbols, merge_pair_in_place, MergeCandidate, MergeMap, MergeTable, Pair,
    PairPriorityQueue, SpecialTokens, Vocabulary, BYTE_ALPHABET_SIZE, FIRST_MERGE_ID,
};

pub mod encoding;
pub use encoding::{ByteLevelDecoder, ByteLevelEncoder};
