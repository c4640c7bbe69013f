//! Text splitting for pre-tokenization.
//!
//! Merges never cross a chunk boundary, so the splitter decides which
//! byte sequences can ever become a single token.

use super::{Chunks, PreTokenizer};
use bytemerge_core::{Result, TokenizerError};
use fancy_regex::{Regex, RegexBuilder};
use log::warn;

/// GPT-2 split pattern.
pub const GPT2_SPLIT_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// GPT-4 (cl100k) split pattern.
pub const GPT4_SPLIT_PATTERN: &str = r"'(?i:[sdmt]|ll|ve|re)|[^\r\n\p{L}\p{N}]?+\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]++[\r\n]*|\s*[\r\n]|\s+(?!\S)|\s+";

/// Backtracking steps allowed per match attempt.
///
/// `\s*[\r\n]` in the GPT patterns backtracks once per char of a
/// whitespace run, so the limit caps the longest run a splitter accepts.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 100_000_000;

/// Treats the whole input as a single chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeInput;

impl PreTokenizer for WholeInput {
    fn split<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        Box::new((!text.is_empty()).then_some(Ok(text)).into_iter())
    }

    fn pattern(&self) -> Option<&str> {
        None
    }
}

/// Splits text on the matches of a regex.
///
/// Text between matches is emitted as its own chunk, so the chunks always
/// concatenate back to the input. If the regex fails at run time (its
/// backtrack limit is hit), the iterator yields `InvalidPattern` and stops.
#[derive(Debug, Clone)]
pub struct RegexSplitter {
    regex: Regex,
}

impl RegexSplitter {
    /// Compile a splitter from a pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_backtrack_limit(pattern, DEFAULT_BACKTRACK_LIMIT)
    }

    /// Compile a splitter with a custom backtrack limit.
    pub fn with_backtrack_limit(pattern: &str, limit: usize) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .backtrack_limit(limit)
            .build()
            .map_err(|e| TokenizerError::InvalidPattern(format!("{pattern:?}: {e}")))?;
        Ok(Self { regex })
    }

    pub fn gpt4() -> Result<Self> {
        Self::new(GPT4_SPLIT_PATTERN)
    }

    pub fn gpt2() -> Result<Self> {
        Self::new(GPT2_SPLIT_PATTERN)
    }
}

impl PreTokenizer for RegexSplitter {
    fn split<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        Box::new(RegexChunks {
            regex: &self.regex,
            text,
            pos: 0,
            start: 0,
            pending: None,
            failed: false,
        })
    }

    fn pattern(&self) -> Option<&str> {
        Some(self.regex.as_str())
    }
}

/// Lazy chunk iterator for [`RegexSplitter`].
struct RegexChunks<'a> {
    regex: &'a Regex,
    text: &'a str,
    /// Where the next search starts
    pos: usize,
    /// Start of text not yet emitted
    start: usize,
    /// A match held back while the gap before it is emitted
    pending: Option<&'a str>,
    /// Set once an error has been yielded
    failed: bool,
}

impl<'a> RegexChunks<'a> {
    /// Emit everything not yet emitted and finish.
    fn rest(&mut self) -> Option<Result<&'a str>> {
        let text = self.text;
        let len = text.len();
        let rest = (self.start < len).then(|| &text[self.start..]);
        self.start = len;
        self.pos = len;
        rest.map(Ok)
    }
}

impl<'a> Iterator for RegexChunks<'a> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Result<&'a str>> {
        if self.failed {
            return None;
        }
        if let Some(chunk) = self.pending.take() {
            return Some(Ok(chunk));
        }

        let text = self.text;
        loop {
            if self.pos >= text.len() {
                return self.rest();
            }

            let found = match self.regex.find_from_pos(text, self.pos) {
                Ok(found) => found,
                Err(e) => {
                    warn!("split pattern failed at byte {}: {}", self.pos, e);
                    self.failed = true;
                    return Some(Err(TokenizerError::InvalidPattern(format!(
                        "{:?} failed at byte {}: {}",
                        self.regex.as_str(),
                        self.pos,
                        e
                    ))));
                }
            };
            let Some(m) = found else {
                return self.rest();
            };

            if m.start() == m.end() {
                // Step over one char; it stays in the next emitted chunk.
                let step = text[m.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.pos = m.start() + step;
                continue;
            }

            let gap_start = self.start;
            self.start = m.end();
            self.pos = m.end();

            if gap_start < m.start() {
                self.pending = Some(m.as_str());
                return Some(Ok(&text[gap_start..m.start()]));
            }
            return Some(Ok(m.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks<'a>(splitter: &'a impl PreTokenizer, text: &'a str) -> Vec<&'a str> {
        splitter.split(text).collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_whole_input() {
        let splitter = WholeInput;
        assert_eq!(chunks(&splitter, "hello world  test"), vec!["hello world  test"]);
        assert!(chunks(&splitter, "").is_empty());
        assert_eq!(splitter.pattern(), None);
    }

    #[test]
    fn test_gpt4_split() {
        let splitter = RegexSplitter::gpt4().unwrap();
        assert_eq!(
            chunks(&splitter, "Hello've world123 how's  are you!!!?"),
            vec!["Hello", "'ve", " world", "123", " how", "'s", " ", " are", " you", "!!!?"]
        );
    }

    #[test]
    fn test_gpt2_split() {
        let splitter = RegexSplitter::gpt2().unwrap();
        assert_eq!(
            chunks(&splitter, "aaa bbb  12345"),
            vec!["aaa", " bbb", " ", " 12345"]
        );
    }

    #[test]
    fn test_unmatched_text_is_emitted() {
        let splitter = RegexSplitter::new(r"\d+").unwrap();
        assert_eq!(chunks(&splitter, "ab12cd3"), vec!["ab", "12", "cd", "3"]);
        assert_eq!(chunks(&splitter, "xyz"), vec!["xyz"]);
    }

    #[test]
    fn test_zero_length_matches_terminate() {
        let splitter = RegexSplitter::new(r"b*").unwrap();
        let text = "abbéa";
        let parts = chunks(&splitter, text);

        assert_eq!(parts.concat(), text);
        assert_eq!(parts, vec!["a", "bb", "éa"]);
    }

    #[test]
    fn test_chunks_cover_input() {
        let splitter = RegexSplitter::gpt4().unwrap();
        let text = "Line one\r\n\tLine two… 👋🏽 ünïcödé  123456789 ";
        assert_eq!(chunks(&splitter, text).concat(), text);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RegexSplitter::new("(unclosed").unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidPattern(_)));
    }

    #[test]
    fn test_long_whitespace_run_keeps_chunks() {
        let splitter = RegexSplitter::gpt4().unwrap();
        let run = 1_200_000;
        let text = format!("{}a b", " ".repeat(run));
        let lens: Vec<usize> = chunks(&splitter, &text).iter().map(|c| c.len()).collect();

        assert_eq!(lens, vec![run - 1, 2, 2]);
    }

    #[test]
    fn test_backtrack_limit_is_reported() {
        let splitter = RegexSplitter::with_backtrack_limit(GPT4_SPLIT_PATTERN, 1_000).unwrap();
        let text = format!("{}a b", " ".repeat(5_000));
        let items: Vec<Result<&str>> = splitter.split(&text).collect();

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(TokenizerError::InvalidPattern(_))));
    }

    #[test]
    fn test_split_is_restartable() {
        let splitter = RegexSplitter::gpt2().unwrap();
        let first = chunks(&splitter, "one two");
        let second = chunks(&splitter, "one two");
        assert_eq!(first, second);
    }
}
