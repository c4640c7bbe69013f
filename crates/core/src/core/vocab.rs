//! Vocabulary storage and lookup.
//!
//! The vocabulary is dense: id `i` lives at index `i`. The first 256
//! entries are the single bytes, and every later entry is the
//! concatenation of the two tokens its merge joined.

use super::alphabet::BYTE_ALPHABET_SIZE;
use super::merges::{MergeTable, Pair};
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;

/// Byte expansion of every token id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// id -> bytes
    tokens: Vec<Vec<u8>>,
}

impl Vocabulary {
    /// Create a vocabulary holding only the 256 byte symbols.
    pub fn new() -> Self {
        Self::with_capacity(BYTE_ALPHABET_SIZE)
    }

    /// Create a byte vocabulary with room for `capacity` tokens.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut tokens = Vec::with_capacity(capacity.max(BYTE_ALPHABET_SIZE));
        tokens.extend((0..BYTE_ALPHABET_SIZE).map(|b| vec![b as u8]));
        Self { tokens }
    }

    /// Rebuild the vocabulary implied by a merge table.
    pub fn from_merges(merges: &MergeTable) -> Result<Self> {
        let mut vocab = Self::with_capacity(BYTE_ALPHABET_SIZE + merges.len());
        for (pair, id) in merges.iter() {
            let assigned = vocab.add_merge(pair)?;
            debug_assert_eq!(assigned, id);
        }
        Ok(vocab)
    }

    /// Append the token created by merging `pair`.
    ///
    /// Returns the ID assigned to the token.
    pub fn add_merge(&mut self, pair: Pair) -> Result<u32> {
        let id = self.tokens.len() as u32;
        let (left, right) = match (self.get_token(pair.0), self.get_token(pair.1)) {
            (Some(left), Some(right)) => (left, right),
            _ => {
                return Err(TokenizerError::InvalidMerge(format!(
                    "pair ({}, {}) references an id missing from the vocabulary",
                    pair.0, pair.1
                )))
            }
        };

        let mut merged = Vec::with_capacity(left.len() + right.len());
        merged.extend_from_slice(left);
        merged.extend_from_slice(right);
        self.tokens.push(merged);

        Ok(id)
    }

    /// Get the bytes for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&[u8]> {
        self.tokens.get(id as usize).map(Vec::as_slice)
    }

    /// Whether `id` has an entry.
    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        (id as usize) < self.tokens.len()
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false: the byte alphabet is never removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over (id, bytes) in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .map(|(id, bytes)| (id as u32, bytes.as_slice()))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

/// Table of special tokens: literal string <-> reserved id.
///
/// Special ids sit outside the merge-derived id range and are never
/// counted or merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialTokens {
    /// token string -> ID
    by_token: AHashMap<CompactString, u32>,
    /// ID -> token string
    by_id: AHashMap<u32, CompactString>,
}

impl SpecialTokens {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking every id against a vocabulary of
    /// `vocab_size` tokens and against the other entries. A token may
    /// appear twice only with the same id.
    pub fn from_pairs<S, I>(tokens: I, vocab_size: usize) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, u32)>,
    {
        let mut special = Self::new();
        for (token, id) in tokens {
            special.insert(token.as_ref(), id, vocab_size)?;
        }
        Ok(special)
    }

    fn insert(&mut self, token: &str, id: u32, vocab_size: usize) -> Result<()> {
        let collides = (id as usize) < vocab_size
            || self
                .by_id
                .get(&id)
                .is_some_and(|existing| existing.as_str() != token)
            || self
                .by_token
                .get(token)
                .is_some_and(|&existing| existing != id);
        if collides {
            return Err(TokenizerError::InvalidSpecialTokenCollision {
                token: token.to_string(),
                id,
            });
        }
        if token.is_empty() {
            return Err(TokenizerError::InvalidConfig(
                "special tokens cannot be empty".to_string(),
            ));
        }

        let token = CompactString::new(token);
        self.by_token.insert(token.clone(), id);
        self.by_id.insert(id, token);

        Ok(())
    }

    /// Re-check the table against a vocabulary of `vocab_size` tokens.
    pub fn validate(&self, vocab_size: usize) -> Result<()> {
        match self.sorted().into_iter().find(|&(_, id)| (id as usize) < vocab_size) {
            Some((token, id)) => Err(TokenizerError::InvalidSpecialTokenCollision {
                token: token.to_string(),
                id,
            }),
            None => Ok(()),
        }
    }

    /// Get the ID for a special token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.by_token.get(token).copied()
    }

    /// Get the special token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(CompactString::as_str)
    }

    /// Check if an ID is a special token.
    #[inline]
    pub fn is_special(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    /// All (token, id) entries ordered by id, for stable output.
    pub fn sorted(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .by_token
            .iter()
            .map(|(token, &id)| (token.as_str(), id))
            .collect();
        entries.sort_by_key(|&(token, id)| (id, token));
        entries
    }

    /// Iterate over the special token strings, in no particular order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_token.keys().map(CompactString::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_vocab() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.get_token(97), Some(&b"a"[..]));
        assert_eq!(vocab.get_token(255), Some(&[255u8][..]));
        assert_eq!(vocab.get_token(256), None);
    }

    #[test]
    fn test_add_merge() {
        let mut vocab = Vocabulary::new();
        let aa = vocab.add_merge((97, 97)).unwrap();
        let aab = vocab.add_merge((aa, 98)).unwrap();

        assert_eq!(aa, 256);
        assert_eq!(aab, 257);
        assert_eq!(vocab.get_token(aab), Some(&b"aab"[..]));
        assert_eq!(vocab.len(), 258);
    }

    #[test]
    fn test_add_merge_unknown_member() {
        let mut vocab = Vocabulary::new();
        assert!(vocab.add_merge((97, 400)).is_err());
        assert_eq!(vocab.len(), 256);
    }

    #[test]
    fn test_from_merges() {
        let merges = MergeTable::from_pairs([(97, 97), (97, 98), (256, 257)]).unwrap();
        let vocab = Vocabulary::from_merges(&merges).unwrap();

        assert_eq!(vocab.len(), 259);
        assert_eq!(vocab.get_token(258), Some(&b"aaab"[..]));
    }

    #[test]
    fn test_special_tokens() {
        let special = SpecialTokens::from_pairs([("<bos>", 1000), ("<eos>", 1001)], 300).unwrap();

        assert_eq!(special.get_id("<bos>"), Some(1000));
        assert_eq!(special.get_token(1001), Some("<eos>"));
        assert!(special.is_special(1000));
        assert!(!special.is_special(5));
        assert_eq!(special.sorted(), vec![("<bos>", 1000), ("<eos>", 1001)]);
    }

    #[test]
    fn test_special_token_collides_with_vocab() {
        let err = SpecialTokens::from_pairs([("<end>", 257)], 300).unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::InvalidSpecialTokenCollision { id: 257, .. }
        ));
    }

    #[test]
    fn test_special_token_collides_with_special() {
        let err = SpecialTokens::from_pairs([("<a>", 500), ("<b>", 500)], 256).unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::InvalidSpecialTokenCollision { id: 500, .. }
        ));
    }

    #[test]
    fn test_special_token_registered_twice() {
        let err = SpecialTokens::from_pairs([("<a>", 500), ("<a>", 501)], 256).unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::InvalidSpecialTokenCollision { id: 501, .. }
        ));

        let same = SpecialTokens::from_pairs([("<a>", 500), ("<a>", 500)], 256).unwrap();
        assert_eq!(same.len(), 1);
    }

    #[test]
    fn test_special_validate() {
        let special = SpecialTokens::from_pairs([("<end>", 300)], 256).unwrap();
        assert!(special.validate(300).is_ok());
        assert!(special.validate(301).is_err());
    }
}
