//! Error types for the bytemerge libraries.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type shared by every bytemerge crate.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Decode was given an id with no vocabulary entry and no special token.
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// A special token id overlaps an id already used by the vocabulary
    /// or by another special token.
    #[error("Special token {token:?} uses id {id}, which is already taken")]
    InvalidSpecialTokenCollision { token: String, id: u32 },

    /// A persisted model could not be parsed or violates a table invariant.
    #[error("Malformed model file: {0}")]
    MalformedModelFile(String),

    /// The text contains a special token that the caller did not allow.
    #[error("Disallowed special token found in text: {0:?}")]
    DisallowedSpecialToken(String),

    /// Error saving a model
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The split pattern failed to compile
    #[error("Invalid split pattern: {0}")]
    InvalidPattern(String),

    /// Invalid merge rule
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),
}

impl TokenizerError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
