//! Save functionality for trained tokenizers.

use super::format::{
    ModelFormat, SerializedMerge, SerializedModel, SerializedSpecialToken, FORMAT_VERSION,
    MODEL_EXTENSION, TEXT_HEADER, VOCAB_EXTENSION,
};
use bytemerge_core::{MergeTable, Result, SpecialTokens, TokenizerError, Vocabulary};
use log::info;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Model saver - renders a trained model in either format.
pub struct ModelSaver<'a> {
    vocab: &'a Vocabulary,
    merges: &'a MergeTable,
    special_tokens: &'a SpecialTokens,
    /// Split pattern, `None` when the whole input is one chunk
    pattern: Option<&'a str>,
}

impl<'a> ModelSaver<'a> {
    pub fn new(
        vocab: &'a Vocabulary,
        merges: &'a MergeTable,
        special_tokens: &'a SpecialTokens,
        pattern: Option<&'a str>,
    ) -> Self {
        Self {
            vocab,
            merges,
            special_tokens,
            pattern,
        }
    }

    /// Write `<prefix>.model` and `<prefix>.vocab` into `dir`.
    ///
    /// Returns the path of the model file.
    pub fn save(&self, dir: &Path, prefix: &str, format: ModelFormat) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| TokenizerError::io(dir, e))?;

        let model_path = dir.join(format!("{prefix}.{MODEL_EXTENSION}"));
        self.save_model(&model_path, format)?;

        let vocab_path = dir.join(format!("{prefix}.{VOCAB_EXTENSION}"));
        self.save_vocab_listing(&vocab_path)?;

        info!(
            "Saved {} model with {} merges to {}",
            format,
            self.merges.len(),
            model_path.display()
        );

        Ok(model_path)
    }

    /// Write only the model file.
    pub fn save_model(&self, path: &Path, format: ModelFormat) -> Result<()> {
        let content = self.render(format)?;
        write_file(path, content.as_bytes())
    }

    /// Write the human-readable vocabulary listing. It is never read back.
    pub fn save_vocab_listing(&self, path: &Path) -> Result<()> {
        write_file(path, self.vocab_listing().as_bytes())
    }

    /// Render the model file content.
    pub fn render(&self, format: ModelFormat) -> Result<String> {
        match format {
            ModelFormat::Json => self.to_json(),
            ModelFormat::Text => self.to_text(),
        }
    }

    /// Build the serde document.
    pub fn serialize(&self) -> SerializedModel {
        SerializedModel {
            version: FORMAT_VERSION,
            pattern: self.pattern.map(str::to_string),
            special_tokens: self
                .special_tokens
                .sorted()
                .into_iter()
                .map(|(token, id)| SerializedSpecialToken {
                    token: token.to_string(),
                    id,
                })
                .collect(),
            merges: self
                .merges
                .iter()
                .map(|((left, right), id)| SerializedMerge {
                    pair: [left, right],
                    id,
                })
                .collect(),
        }
    }

    fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.serialize())?;
        json.push('\n');
        Ok(json)
    }

    fn to_text(&self) -> Result<String> {
        let pattern = self.pattern.unwrap_or("");
        if pattern.contains(['\n', '\r']) {
            return Err(TokenizerError::Save(
                "split pattern contains a line break and cannot be stored in text format"
                    .to_string(),
            ));
        }

        let mut out = String::with_capacity(32 + self.merges.len() * 12);
        let _ = writeln!(out, "{TEXT_HEADER}");
        let _ = writeln!(out, "{pattern}");

        let special = self.special_tokens.sorted();
        let _ = writeln!(out, "{}", special.len());
        for (token, id) in special {
            if token.contains(['\n', '\r']) {
                return Err(TokenizerError::Save(format!(
                    "special token {token:?} contains a line break and cannot be stored in text format"
                )));
            }
            let _ = writeln!(out, "{token} {id}");
        }

        for ((left, right), _) in self.merges.iter() {
            let _ = writeln!(out, "{left} {right}");
        }

        Ok(out)
    }

    /// Render one line per token: `[left][right] -> [token] id` for merged
    /// tokens and `[token] id` for bytes and special tokens.
    pub fn vocab_listing(&self) -> String {
        let mut out = String::new();

        for (id, bytes) in self.vocab.iter() {
            let token = render_token(bytes);
            match self.merges.pair_for(id) {
                Some((left, right)) => {
                    let left = self.vocab.get_token(left).map(render_token).unwrap_or_default();
                    let right = self.vocab.get_token(right).map(render_token).unwrap_or_default();
                    let _ = writeln!(out, "[{left}][{right}] -> [{token}] {id}");
                }
                None => {
                    let _ = writeln!(out, "[{token}] {id}");
                }
            }
        }

        for (token, id) in self.special_tokens.sorted() {
            let _ = writeln!(out, "[{}] {id}", render_token(token.as_bytes()));
        }

        out
    }
}

/// Render token bytes for display.
///
/// Invalid UTF-8 becomes U+FFFD and control characters are escaped as
/// `\uXXXX`, so every token stays on one line.
pub fn render_token(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_control() {
            let _ = write!(out, "\\u{:04x}", ch as u32);
        } else {
            out.push(ch);
        }
    }
    out
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|e| TokenizerError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content)
        .and_then(|_| writer.flush())
        .map_err(|e| TokenizerError::io(path, e))
}
