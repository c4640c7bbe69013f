//! Splitting text around special tokens.

use bytemerge_core::{Result, TokenizerError};
use regex::Regex;

/// A piece of text produced by [`SpecialSplitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Ordinary text, to be pre-tokenized and merged.
    Text(&'a str),
    /// An exact occurrence of a special token.
    Special(&'a str),
}

/// Finds exact, non-overlapping special-token occurrences.
///
/// Tokens are tried longest first, so `<|end|>` wins over `<|e` when both
/// match at the same position.
#[derive(Debug, Clone, Default)]
pub struct SpecialSplitter {
    regex: Option<Regex>,
}

impl SpecialSplitter {
    /// Build a splitter for the given tokens. No tokens means no splitting.
    pub fn new<'t, I>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let mut tokens: Vec<&str> = tokens.into_iter().filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Ok(Self::default());
        }
        tokens.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tokens.dedup();

        let alternation = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&alternation)
            .map_err(|e| TokenizerError::InvalidConfig(format!("special tokens: {e}")))?;

        Ok(Self { regex: Some(regex) })
    }

    /// Whether any special token is configured.
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }

    /// Split `text` into ordinary and special segments, in order.
    ///
    /// Empty text segments are skipped.
    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let Some(regex) = &self.regex else {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![Segment::Text(text)]
            };
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in regex.find_iter(text) {
            if m.start() > last {
                segments.push(Segment::Text(&text[last..m.start()]));
            }
            segments.push(Segment::Special(m.as_str()));
            last = m.end();
        }
        if last < text.len() {
            segments.push(Segment::Text(&text[last..]));
        }

        segments
    }

    /// The first special token occurring in `text`, if any.
    pub fn find_first<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.regex.as_ref()?.find(text).map(|m| m.as_str())
    }
}
