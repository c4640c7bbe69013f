//! Format definitions for model serialization.
//!
//! Two model formats are supported:
//!
//! - `Json`: a serde document with explicit ids
//! - `Text`: a line format with a header, the split pattern, the special
//!   tokens and one merge pair per line (ids implied by line order)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current version of both model formats.
pub const FORMAT_VERSION: u32 = 1;

/// First line of a text model file.
pub const TEXT_HEADER: &str = "bytemerge v1";

/// Extension of the model file written by `Tokenizer::save`.
pub const MODEL_EXTENSION: &str = "model";

/// Extension of the human-readable vocabulary listing.
pub const VOCAB_EXTENSION: &str = "vocab";

/// Model format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFormat {
    /// serde_json document
    #[default]
    Json,
    /// Line-oriented text
    Text,
}

impl ModelFormat {
    /// Guess the format of a model file from its content.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Text => f.write_str("text"),
        }
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("unknown model format {other:?}, expected json or text")),
        }
    }
}

/// One learned merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMerge {
    /// Left and right ids
    pub pair: [u32; 2],
    /// Id of the merged token
    pub id: u32,
}

/// One special token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedSpecialToken {
    pub token: String,
    pub id: u32,
}

/// Complete JSON model document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Format version
    pub version: u32,
    /// Split pattern, absent when the whole input is one chunk
    #[serde(default)]
    pub pattern: Option<String>,
    /// Special tokens ordered by id
    #[serde(default)]
    pub special_tokens: Vec<SerializedSpecialToken>,
    /// Merges in learned order
    pub merges: Vec<SerializedMerge>,
}
