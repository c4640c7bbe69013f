//! Core BPE data structures.
//!
//! This module contains the byte alphabet, the ordered merge table, the
//! vocabulary and special-token tables, and the priority queue used by
//! training.

pub mod alphabet;
pub mod merges;
pub mod priority;
pub mod vocab;

pub use alphabet::{byte_symbols, BYTE_ALPHABET_SIZE, FIRST_MERGE_ID};
pub use merges::{merge_pair_in_place, MergeMap, MergeTable, Pair};
pub use priority::{MergeCandidate, PairPriorityQueue};
pub use vocab::{SpecialTokens, Vocabulary};
