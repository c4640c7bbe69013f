//! Train command implementation.

use clap::{Parser, ValueEnum};

/// Pre-tokenization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// The whole input is one chunk
    Basic,
    /// Split with a regex before merging
    Regex,
}

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Path to the training data file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for the trained model
    #[arg(short, long)]
    pub output: PathBuf,

    /// File name prefix for `<prefix>.model` and `<prefix>.vocab`
    #[arg(long, default_value = "tokenizer")]
    pub prefix: String,

    /// Target vocabulary size, byte symbols included
    #[arg(long, default_value_t = 1_000)]
    pub vocab_size: usize,

    /// Minimum frequency for merges
    #[arg(long, default_value_t = 2)]
    pub min_frequency: u64,

    /// Pre-tokenization mode
    #[arg(long, value_enum, default_value_t = Mode::Regex)]
    pub mode: Mode,

    /// Split pattern for regex mode: gpt2, gpt4 or a custom regex
    #[arg(long, default_value = "gpt4")]
    pub pattern: String,

    /// Special token as TOKEN=ID (repeatable)
    #[arg(long = "special", value_parser = parse_special)]
    pub special_tokens: Vec<(String, u32)>,

    /// Model file format: json or text
    #[arg(long, default_value = "json")]
    pub format: ModelFormat,

    /// Count the initial pairs in parallel
    #[arg(long, default_value_t = false)]
    pub parallel: bool,
}

use anyhow::{Context, Result as AnyhowResult};
use bytemerge_tokenizer::{ModelFormat, SplitMode, Tokenizer};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

fn parse_special(s: &str) -> Result<(String, u32), String> {
    let (token, id) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TOKEN=ID, got {s:?}"))?;
    if token.is_empty() {
        return Err(format!("empty special token in {s:?}"));
    }
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid id in {s:?}: {e}"))?;
    Ok((token.to_string(), id))
}

fn split_mode(mode: Mode, pattern: &str) -> SplitMode {
    match (mode, pattern) {
        (Mode::Basic, _) => SplitMode::Basic,
        (Mode::Regex, "gpt4") => SplitMode::gpt4(),
        (Mode::Regex, "gpt2") => SplitMode::gpt2(),
        (Mode::Regex, custom) => SplitMode::Regex(custom.to_string()),
    }
}

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    info!(
        "Training: input={} vocab_size={} min_frequency={} mode={:?}",
        cmd.input.display(),
        cmd.vocab_size,
        cmd.min_frequency,
        cmd.mode
    );

    // Read training data
    let start = Instant::now();
    let data = fs::read_to_string(&cmd.input)
        .with_context(|| format!("failed to read training data from {}", cmd.input.display()))?;
    info!("Read {} bytes in {:.2}s", data.len(), start.elapsed().as_secs_f64());

    // Create tokenizer
    let mut tokenizer = Tokenizer::builder()
        .vocab_size(cmd.vocab_size)
        .min_frequency(cmd.min_frequency)
        .split_mode(split_mode(cmd.mode, &cmd.pattern))
        .special_tokens(cmd.special_tokens)
        .parallel(cmd.parallel)
        .build()
        .context("invalid tokenizer configuration")?;

    // Train
    let start = Instant::now();
    tokenizer.train(&data).context("training failed")?;
    println!(
        "Trained {} merges in {:.2}s (vocab size {})",
        tokenizer.merges().len(),
        start.elapsed().as_secs_f64(),
        tokenizer.vocab_size()
    );

    // Save model
    let model_path = tokenizer
        .save(&cmd.output, &cmd.prefix, cmd.format)
        .with_context(|| format!("failed to save model to {}", cmd.output.display()))?;
    println!("Model saved to {}", model_path.display());

    Ok(())
}
