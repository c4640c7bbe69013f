//! Byte-level encoding and decoding.
//!
//! - `byte_level`: applies learned merges to raw bytes
//! - `decoder`: expands ids back to bytes and text

pub mod byte_level;
pub mod decoder;

pub use byte_level::ByteLevelEncoder;
pub use decoder::ByteLevelDecoder;
