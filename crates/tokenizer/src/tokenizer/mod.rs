//! Main tokenizer implementation.
//!
//! This module provides the high-level `Tokenizer` struct that ties the
//! pre-tokenizer, the trainer, the merge table and the special tokens
//! together.

use crate::io::{ModelFormat, ModelLoader, ModelSaver};
use crate::pre_tokenizer::{
    PreTokenizer, RegexSplitter, Segment, SpecialSplitter, WholeInput, GPT2_SPLIT_PATTERN,
    GPT4_SPLIT_PATTERN,
};
use ahash::AHashSet;
use bytemerge_core::{
    ByteLevelDecoder, ByteLevelEncoder, MergeTable, Result, SpecialTokens, TokenizerError,
    Vocabulary,
};
use bytemerge_training::{BpeTrainer, TrainingConfig};
use log::info;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How text is cut into chunks before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// The whole input is one chunk.
    Basic,
    /// Chunks are the matches of a regex (and the text between them).
    Regex(String),
}

impl SplitMode {
    pub fn gpt4() -> Self {
        Self::Regex(GPT4_SPLIT_PATTERN.to_string())
    }

    pub fn gpt2() -> Self {
        Self::Regex(GPT2_SPLIT_PATTERN.to_string())
    }

    /// `None` selects [`SplitMode::Basic`].
    pub fn from_pattern(pattern: Option<String>) -> Self {
        match pattern {
            Some(pattern) => Self::Regex(pattern),
            None => Self::Basic,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Basic => None,
            Self::Regex(pattern) => Some(pattern),
        }
    }

    fn build(&self) -> Result<Arc<dyn PreTokenizer>> {
        let pre_tokenizer: Arc<dyn PreTokenizer> = match self {
            Self::Basic => Arc::new(WholeInput),
            Self::Regex(pattern) => Arc::new(RegexSplitter::new(pattern)?),
        };
        Ok(pre_tokenizer)
    }
}

impl Default for SplitMode {
    fn default() -> Self {
        Self::gpt4()
    }
}

/// Which special tokens `encode_with_special` honors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowedSpecial {
    /// Every registered special token.
    #[default]
    All,
    /// None; special strings are encoded as ordinary text.
    None,
    /// None; finding a registered special string is an error.
    NoneRaise,
    /// Only the listed tokens. Unregistered names are ignored.
    Only(AHashSet<String>),
}

/// Configuration for building a tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Target vocabulary size, byte symbols included
    pub vocab_size: usize,
    /// Minimum frequency for merges during training
    pub min_frequency: u64,
    /// Pre-tokenization
    pub split_mode: SplitMode,
    /// Special tokens as (literal, id)
    pub special_tokens: Vec<(String, u32)>,
    /// Count the initial pairs in parallel during training
    pub parallel: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            vocab_size: 1_000,
            min_frequency: 2,
            split_mode: SplitMode::default(),
            special_tokens: Vec::new(),
            parallel: false,
        }
    }
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    config: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target vocabulary size.
    pub fn vocab_size(mut self, size: usize) -> Self {
        self.config.vocab_size = size;
        self
    }

    /// Set the minimum frequency for merges.
    pub fn min_frequency(mut self, freq: u64) -> Self {
        self.config.min_frequency = freq;
        self
    }

    /// Set the pre-tokenization mode.
    pub fn split_mode(mut self, mode: SplitMode) -> Self {
        self.config.split_mode = mode;
        self
    }

    /// Add special tokens.
    pub fn special_tokens<S, I>(mut self, tokens: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, u32)>,
    {
        self.config
            .special_tokens
            .extend(tokens.into_iter().map(|(token, id)| (token.into(), id)));
        self
    }

    /// Add one special token.
    pub fn special_token(self, token: impl Into<String>, id: u32) -> Self {
        self.special_tokens([(token.into(), id)])
    }

    /// Count the initial pairs in parallel during training.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Build the tokenizer.
    pub fn build(self) -> Result<Tokenizer> {
        Tokenizer::new(self.config)
    }
}

/// Main tokenizer struct.
///
/// The vocabulary, merge table and special tokens are immutable between
/// `train`/`register_special_tokens` calls and shared through `Arc`, so a
/// `&Tokenizer` can encode and decode from many threads at once.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    vocab: Arc<Vocabulary>,
    merges: Arc<MergeTable>,
    special_tokens: Arc<SpecialTokens>,
    pre_tokenizer: Arc<dyn PreTokenizer>,
    special_splitter: SpecialSplitter,
    encoder: ByteLevelEncoder,
    decoder: ByteLevelDecoder,
}

impl Tokenizer {
    /// Create an untrained tokenizer (byte symbols only).
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        Self::from_parts(config, MergeTable::new())
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    fn from_parts(config: TokenizerConfig, merges: MergeTable) -> Result<Self> {
        let pre_tokenizer = config.split_mode.build()?;
        let vocab = Vocabulary::from_merges(&merges)?;
        let special_tokens = SpecialTokens::from_pairs(
            config.special_tokens.iter().map(|(t, id)| (t.as_str(), *id)),
            vocab.len(),
        )?;

        Self::assemble(config, vocab, merges, special_tokens, pre_tokenizer)
    }

    fn assemble(
        config: TokenizerConfig,
        vocab: Vocabulary,
        merges: MergeTable,
        special_tokens: SpecialTokens,
        pre_tokenizer: Arc<dyn PreTokenizer>,
    ) -> Result<Self> {
        let special_splitter = SpecialSplitter::new(special_tokens.tokens())?;
        let vocab = Arc::new(vocab);
        let merges = Arc::new(merges);
        let special_tokens = Arc::new(special_tokens);

        Ok(Self {
            encoder: ByteLevelEncoder::new(Arc::clone(&merges)),
            decoder: ByteLevelDecoder::new(Arc::clone(&vocab), Arc::clone(&special_tokens)),
            config,
            vocab,
            merges,
            special_tokens,
            pre_tokenizer,
            special_splitter,
        })
    }

    /// Train the tokenizer on text data.
    ///
    /// Learns `vocab_size - 256` merges at most, fewer if no pair reaches
    /// `min_frequency`. Replaces any previously learned merges. On error,
    /// including a split failure, the tokenizer is left unchanged.
    pub fn train(&mut self, text: &str) -> Result<()> {
        let trainer = BpeTrainer::new(TrainingConfig {
            vocab_size: self.config.vocab_size,
            min_frequency: self.config.min_frequency,
            parallel: self.config.parallel,
        });

        info!(
            "Training tokenizer on {} bytes ({} split)",
            text.len(),
            if self.pattern().is_some() { "regex" } else { "basic" }
        );
        let chunks = self.pre_tokenizer.split(text).collect::<Result<Vec<_>>>()?;
        let (vocab, merges) = trainer.train(chunks)?;
        self.special_tokens.validate(vocab.len())?;

        let special_tokens = SpecialTokens::clone(&self.special_tokens);
        *self = Self::assemble(
            self.config.clone(),
            vocab,
            merges,
            special_tokens,
            Arc::clone(&self.pre_tokenizer),
        )?;

        Ok(())
    }

    /// Replace the special-token table.
    ///
    /// Ids must lie outside the vocabulary and be distinct.
    pub fn register_special_tokens<S, I>(&mut self, tokens: I) -> Result<()>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, u32)>,
    {
        let special_tokens = SpecialTokens::from_pairs(tokens, self.vocab.len())?;
        let mut config = self.config.clone();
        config.special_tokens = special_tokens
            .sorted()
            .into_iter()
            .map(|(token, id)| (token.to_string(), id))
            .collect();

        *self = Self::assemble(
            config,
            Vocabulary::clone(&self.vocab),
            MergeTable::clone(&self.merges),
            special_tokens,
            Arc::clone(&self.pre_tokenizer),
        )?;

        Ok(())
    }

    /// Encode text, honoring every registered special token.
    ///
    /// Fails only if the split pattern fails on this text.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.encode_segments(text, &self.special_splitter)
    }

    /// Encode text, treating special-token strings as ordinary text.
    pub fn encode_ordinary(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 2);
        self.encode_text_into(text, &mut ids)?;
        Ok(ids)
    }

    /// Encode text, honoring only the special tokens `allowed` names.
    pub fn encode_with_special(&self, text: &str, allowed: &AllowedSpecial) -> Result<Vec<u32>> {
        match allowed {
            AllowedSpecial::All => self.encode(text),
            AllowedSpecial::None => self.encode_ordinary(text),
            AllowedSpecial::NoneRaise => match self.special_splitter.find_first(text) {
                Some(token) => Err(TokenizerError::DisallowedSpecialToken(token.to_string())),
                None => self.encode_ordinary(text),
            },
            AllowedSpecial::Only(names) => {
                let splitter = SpecialSplitter::new(
                    self.special_tokens
                        .tokens()
                        .filter(|token| names.contains(*token)),
                )?;
                self.encode_segments(text, &splitter)
            }
        }
    }

    /// Encode independent texts in parallel.
    pub fn encode_batch<S>(&self, texts: &[S]) -> Result<Vec<Vec<u32>>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    fn encode_segments(&self, text: &str, splitter: &SpecialSplitter) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 2);

        for segment in splitter.segments(text) {
            match segment {
                Segment::Text(part) => self.encode_text_into(part, &mut ids)?,
                Segment::Special(token) => {
                    if let Some(id) = self.special_tokens.get_id(token) {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    fn encode_text_into(&self, text: &str, ids: &mut Vec<u32>) -> Result<()> {
        for chunk in self.pre_tokenizer.split(text) {
            self.encoder.encode_chunk_into(chunk?.as_bytes(), ids);
        }
        Ok(())
    }

    /// Decode token IDs back to text.
    ///
    /// Byte sequences that are not valid UTF-8 decode to U+FFFD.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.decoder.decode(ids)
    }

    /// Decode token IDs to raw bytes.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>> {
        self.decoder.decode_bytes(ids)
    }

    /// Write `<prefix>.model` and `<prefix>.vocab` into `dir`.
    ///
    /// Returns the path of the model file.
    pub fn save(&self, dir: &Path, prefix: &str, format: ModelFormat) -> Result<PathBuf> {
        self.saver().save(dir, prefix, format)
    }

    /// Model file content in the given format.
    pub fn to_model_string(&self, format: ModelFormat) -> Result<String> {
        self.saver().render(format)
    }

    fn saver(&self) -> ModelSaver<'_> {
        ModelSaver::new(
            &self.vocab,
            &self.merges,
            &self.special_tokens,
            self.pattern(),
        )
    }

    /// Load a tokenizer from a model file in either format.
    pub fn load(path: &Path) -> Result<Self> {
        let model = ModelLoader::load(path)?;
        Self::from_loaded(model.merges, model.special_tokens, model.pattern)
    }

    /// Parse a tokenizer from model file content in either format.
    pub fn from_model_str(content: &str) -> Result<Self> {
        let model = ModelLoader::parse(content)?;
        Self::from_loaded(model.merges, model.special_tokens, model.pattern)
    }

    fn from_loaded(
        merges: MergeTable,
        special_tokens: SpecialTokens,
        pattern: Option<String>,
    ) -> Result<Self> {
        let vocab = Vocabulary::from_merges(&merges)?;
        let config = TokenizerConfig {
            vocab_size: vocab.len(),
            split_mode: SplitMode::from_pattern(pattern),
            special_tokens: special_tokens
                .sorted()
                .into_iter()
                .map(|(token, id)| (token.to_string(), id))
                .collect(),
            ..Default::default()
        };
        let pre_tokenizer = config.split_mode.build().map_err(|e| match e {
            TokenizerError::InvalidPattern(msg) => TokenizerError::MalformedModelFile(msg),
            other => other,
        })?;

        Self::assemble(config, vocab, merges, special_tokens, pre_tokenizer)
    }

    /// Get the vocabulary size, special tokens excluded.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special_tokens
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn split_mode(&self) -> &SplitMode {
        &self.config.split_mode
    }

    /// The split pattern, `None` in basic mode.
    pub fn pattern(&self) -> Option<&str> {
        self.pre_tokenizer.pattern()
    }
}
