//! Training infrastructure for BPE tokenizers.
//!
//! - `counter`: deduplicated chunk storage and pair counting
//! - `trainer`: the merge loop and its per-run state

pub mod counter;
pub mod trainer;

pub use counter::PairCounter;
pub use trainer::{BpeTrainer, TrainingConfig, TrainingState};
