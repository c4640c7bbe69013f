//! Load functionality for trained tokenizers.
//!
//! Everything read from disk is validated before it reaches a tokenizer:
//! any structural problem or broken table invariant is reported as
//! [`TokenizerError::MalformedModelFile`].

use super::format::{ModelFormat, SerializedModel, FORMAT_VERSION, TEXT_HEADER};
use bytemerge_core::{MergeTable, Result, SpecialTokens, TokenizerError, Vocabulary};
use log::info;
use std::path::Path;

/// A model as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    pub vocab: Vocabulary,
    pub merges: MergeTable,
    pub special_tokens: SpecialTokens,
    /// Split pattern, `None` when the whole input is one chunk
    pub pattern: Option<String>,
}

/// Model loader - parses either model format.
pub struct ModelLoader;

impl ModelLoader {
    /// Read a model file, detecting its format from the content.
    pub fn load(path: &Path) -> Result<LoadedModel> {
        let content = std::fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        let model = Self::parse(&content)?;

        info!(
            "Loaded model with {} merges and {} special tokens from {}",
            model.merges.len(),
            model.special_tokens.len(),
            path.display()
        );

        Ok(model)
    }

    /// Parse model content, detecting its format.
    pub fn parse(content: &str) -> Result<LoadedModel> {
        match ModelFormat::detect(content) {
            ModelFormat::Json => Self::parse_json(content),
            ModelFormat::Text => Self::parse_text(content),
        }
    }

    /// Parse the JSON format.
    pub fn parse_json(content: &str) -> Result<LoadedModel> {
        let data: SerializedModel = serde_json::from_str(content)
            .map_err(|e| malformed(format!("invalid JSON model: {e}")))?;

        if data.version != FORMAT_VERSION {
            return Err(malformed(format!(
                "unsupported version {}, expected {}",
                data.version, FORMAT_VERSION
            )));
        }

        let mut merges = MergeTable::with_capacity(data.merges.len());
        for (i, merge) in data.merges.iter().enumerate() {
            let expected = merges.next_id();
            if merge.id != expected {
                return Err(malformed(format!(
                    "merge {} has id {}, expected {}",
                    i, merge.id, expected
                )));
            }
            merges
                .push((merge.pair[0], merge.pair[1]))
                .map_err(|e| malformed(format!("merge {i}: {e}")))?;
        }

        let specials = data.special_tokens.iter().map(|s| (s.token.as_str(), s.id));
        Self::assemble(merges, specials, data.pattern)
    }

    /// Parse the line-oriented text format.
    pub fn parse_text(content: &str) -> Result<LoadedModel> {
        let mut lines = content.lines().enumerate();

        match lines.next() {
            Some((_, header)) if header == TEXT_HEADER => {}
            Some((_, header)) => {
                return Err(malformed(format!(
                    "expected header {TEXT_HEADER:?}, found {header:?}"
                )))
            }
            None => return Err(malformed("empty model file".to_string())),
        }

        let pattern = match lines.next() {
            Some((_, "")) => None,
            Some((_, pattern)) => Some(pattern.to_string()),
            None => return Err(malformed("missing pattern line".to_string())),
        };

        let special_count: usize = match lines.next() {
            Some((n, line)) => line.trim().parse().map_err(|_| {
                malformed(format!(
                    "line {}: expected special token count, found {line:?}",
                    n + 1
                ))
            })?,
            None => return Err(malformed("missing special token count".to_string())),
        };

        let mut specials = Vec::with_capacity(special_count);
        for _ in 0..special_count {
            let Some((n, line)) = lines.next() else {
                return Err(malformed(format!(
                    "expected {special_count} special tokens, found {}",
                    specials.len()
                )));
            };
            let parsed = line
                .rsplit_once(' ')
                .and_then(|(token, id)| Some((token, id.parse::<u32>().ok()?)));
            match parsed {
                Some((token, id)) if !token.is_empty() => specials.push((token, id)),
                _ => {
                    return Err(malformed(format!(
                        "line {}: expected `token id`, found {line:?}",
                        n + 1
                    )))
                }
            }
        }

        let mut merges = MergeTable::new();
        for (n, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let pair = parse_pair(line)
                .ok_or_else(|| malformed(format!("line {}: expected `left right`, found {line:?}", n + 1)))?;
            merges
                .push(pair)
                .map_err(|e| malformed(format!("line {}: {e}", n + 1)))?;
        }

        Self::assemble(merges, specials, pattern)
    }

    fn assemble<'s, I>(merges: MergeTable, specials: I, pattern: Option<String>) -> Result<LoadedModel>
    where
        I: IntoIterator<Item = (&'s str, u32)>,
    {
        let vocab = Vocabulary::from_merges(&merges).map_err(|e| malformed(e.to_string()))?;
        let special_tokens =
            SpecialTokens::from_pairs(specials, vocab.len()).map_err(|e| malformed(e.to_string()))?;

        Ok(LoadedModel {
            vocab,
            merges,
            special_tokens,
            pattern,
        })
    }
}

fn parse_pair(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.split_whitespace();
    let left = parts.next()?.parse().ok()?;
    let right = parts.next()?.parse().ok()?;
    match parts.next() {
        Some(_) => None,
        None => Some((left, right)),
    }
}

fn malformed(msg: String) -> TokenizerError {
    TokenizerError::MalformedModelFile(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save::ModelSaver;

    fn assert_malformed(content: &str) {
        match ModelLoader::parse(content) {
            Err(TokenizerError::MalformedModelFile(_)) => {}
            other => panic!("expected MalformedModelFile for {content:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_text() {
        let model =
            ModelLoader::parse("bytemerge v1\n\\s+\n1\n<|end of text|> 300\n104 105\n256 10\n")
                .unwrap();

        assert_eq!(model.pattern.as_deref(), Some(r"\s+"));
        assert_eq!(model.merges.get((256, 10)), Some(257));
        assert_eq!(model.vocab.get_token(257), Some(&b"hi\n"[..]));
        assert_eq!(model.special_tokens.get_id("<|end of text|>"), Some(300));
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{
            "version": 1,
            "pattern": null,
            "special_tokens": [{"token": "<eos>", "id": 500}],
            "merges": [{"pair": [97, 97], "id": 256}, {"pair": [256, 98], "id": 257}]
        }"#;
        let model = ModelLoader::parse(content).unwrap();

        assert_eq!(model.pattern, None);
        assert_eq!(model.vocab.get_token(257), Some(&b"aab"[..]));
        assert!(model.special_tokens.is_special(500));
    }

    #[test]
    fn test_roundtrip_both_formats() {
        let merges = MergeTable::from_pairs([(97, 97), (97, 98), (256, 257)]).unwrap();
        let vocab = Vocabulary::from_merges(&merges).unwrap();
        let special = SpecialTokens::from_pairs([("<a b>", 1000), ("<c>", 999)], vocab.len()).unwrap();
        let saver = ModelSaver::new(&vocab, &merges, &special, Some(r"\w+|\s+"));

        for format in [ModelFormat::Json, ModelFormat::Text] {
            let loaded = ModelLoader::parse(&saver.render(format).unwrap()).unwrap();
            assert_eq!(loaded.vocab, vocab);
            assert_eq!(loaded.merges, merges);
            assert_eq!(loaded.special_tokens, special);
            assert_eq!(loaded.pattern.as_deref(), Some(r"\w+|\s+"));
        }
    }

    #[test]
    fn test_malformed_text() {
        assert_malformed("");
        assert_malformed("minbpe v1\n\n0\n");
        assert_malformed("bytemerge v1\n");
        assert_malformed("bytemerge v1\n\nx\n");
        assert_malformed("bytemerge v1\n\n2\n<a> 300\n");
        assert_malformed("bytemerge v1\n\n1\n<a> abc\n");
        assert_malformed("bytemerge v1\n\n0\n97 x\n");
        assert_malformed("bytemerge v1\n\n0\n97 98 99\n");
        // forward reference
        assert_malformed("bytemerge v1\n\n0\n97 257\n");
        // duplicate pair
        assert_malformed("bytemerge v1\n\n0\n97 98\n97 98\n");
        // special id inside the vocabulary
        assert_malformed("bytemerge v1\n\n1\n<a> 100\n");
        // two specials on one id
        assert_malformed("bytemerge v1\n\n2\n<a> 300\n<b> 300\n");
        // one special on two ids
        assert_malformed("bytemerge v1\n\n2\n<a> 300\n<a> 301\n");
    }

    #[test]
    fn test_malformed_json() {
        assert_malformed("{");
        assert_malformed(r#"{"version": 2, "merges": []}"#);
        assert_malformed(r#"{"version": 1}"#);
        assert_malformed(r#"{"version": 1, "merges": [{"pair": [97, 97], "id": 300}]}"#);
        assert_malformed(
            r#"{"version": 1, "merges": [{"pair": [97, 97], "id": 256}, {"pair": [98, 98], "id": 256}]}"#,
        );
        assert_malformed(
            r#"{"version": 1, "special_tokens": [{"token": "<a>", "id": 3}], "merges": []}"#,
        );
        assert_malformed(
            r#"{"version": 1, "special_tokens": [{"token": "<a>", "id": 300}, {"token": "<a>", "id": 301}], "merges": []}"#,
        );
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("bytemerge_test_missing.model");
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            ModelLoader::load(&path),
            Err(TokenizerError::Io { .. })
        ));
    }
}
