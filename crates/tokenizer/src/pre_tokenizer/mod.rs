//! Pre-tokenization.
//!
//! Text is cut into chunks before BPE runs; pairs are counted and merged
//! only inside a chunk. Special tokens are cut out before that.

pub mod special;
pub mod split;

pub use special::{Segment, SpecialSplitter};
pub use split::{
    RegexSplitter, WholeInput, DEFAULT_BACKTRACK_LIMIT, GPT2_SPLIT_PATTERN, GPT4_SPLIT_PATTERN,
};

use bytemerge_core::Result;
use std::fmt::Debug;

/// Lazy sequence of chunks borrowed from the input.
///
/// An `Err` item ends the sequence; the text after it is never emitted.
pub type Chunks<'a> = Box<dyn Iterator<Item = Result<&'a str>> + 'a>;

/// Splits text into non-overlapping chunks that cover it exactly, left
/// to right. Calling `split` again restarts from the beginning.
pub trait PreTokenizer: Debug + Send + Sync {
    fn split<'a>(&'a self, text: &'a str) -> Chunks<'a>;

    /// The pattern to persist with a model, `None` for no splitting.
    fn pattern(&self) -> Option<&str>;
}
