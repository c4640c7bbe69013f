//! bytemerge-tokenizer - High-level tokenizer API
//!
//! This crate ties pre-tokenization, training, encoding, decoding and
//! model files together behind one `Tokenizer` type.
//!
//! # Features
//!
//! - Builder-based configuration
//! - Basic (whole input) or regex (GPT-2 / GPT-4 style) pre-tokenization
//! - Special tokens with exact, longest-first matching
//! - Parallel batch encoding
//! - JSON and text model files plus a readable vocabulary listing
//!
//! # Example
//!
//! ```rust
//! use bytemerge_tokenizer::{SplitMode, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::builder()
//!     .vocab_size(259)
//!     .split_mode(SplitMode::Basic)
//!     .build()?;
//! tokenizer.train("aaabdaaabac")?;
//!
//! let ids = tokenizer.encode("aaabdaaabac")?;
//! assert_eq!(ids, vec![258, 100, 258, 97, 99]);
//! assert_eq!(tokenizer.decode(&ids)?, "aaabdaaabac");
//! # Ok::<(), bytemerge_tokenizer::TokenizerError>(())
//! ```

pub use bytemerge_core::{MergeTable, Result, SpecialTokens, TokenizerError, Vocabulary};

pub mod tokenizer;
pub use tokenizer::{AllowedSpecial, SplitMode, Tokenizer, TokenizerBuilder, TokenizerConfig};

pub mod io;
pub use io::{LoadedModel, ModelFormat, ModelLoader, ModelSaver};

pub mod pre_tokenizer;
pub use pre_tokenizer::{
    PreTokenizer, RegexSplitter, WholeInput, GPT2_SPLIT_PATTERN, GPT4_SPLIT_PATTERN,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
