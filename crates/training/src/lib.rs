//! bytemerge-training - BPE training
//!
//! This crate learns an ordered merge table over the byte alphabet from
//! pre-split chunks of training text.
//!
//! # Example
//!
//! ```rust
//! use bytemerge_training::{BpeTrainer, TrainingConfig};
//!
//! let trainer = BpeTrainer::new(TrainingConfig {
//!     vocab_size: 259,
//!     ..Default::default()
//! });
//! let (vocab, merges) = trainer.train(["aaabdaaabac"]).unwrap();
//!
//! assert_eq!(vocab.len(), 259);
//! assert_eq!(merges.get((97, 97)), Some(256));
//! ```

pub use bytemerge_core::{Result, TokenizerError};

pub mod training;
pub use training::{BpeTrainer, PairCounter, TrainingConfig, TrainingState};
