//! Token id to text decoding.

use crate::core::vocab::{SpecialTokens, Vocabulary};
use crate::error::{Result, TokenizerError};
use std::sync::Arc;

/// Maps token ids back to bytes.
///
/// Special ids expand to their literal UTF-8 string; every other id
/// expands through the vocabulary.
#[derive(Debug, Clone)]
pub struct ByteLevelDecoder {
    vocab: Arc<Vocabulary>,
    special_tokens: Arc<SpecialTokens>,
}

impl ByteLevelDecoder {
    pub fn new(vocab: Arc<Vocabulary>, special_tokens: Arc<SpecialTokens>) -> Self {
        Self {
            vocab,
            special_tokens,
        }
    }

    /// Concatenate the byte expansion of every id.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 2);

        for &id in ids {
            if let Some(token) = self.special_tokens.get_token(id) {
                bytes.extend_from_slice(token.as_bytes());
                continue;
            }
            let token = self
                .vocab
                .get_token(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;
            bytes.extend_from_slice(token);
        }

        Ok(bytes)
    }

    /// Decode ids to text.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than rejected, since
    /// an arbitrary id slice may cut a multi-byte character in half.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let bytes = self.decode_bytes(ids)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}
