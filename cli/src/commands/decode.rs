//! Decode command implementation.

use clap::Parser;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    /// Path to the trained model file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Token IDs to decode, separated by spaces or commas
    #[arg(short, long)]
    pub ids: String,
}

use anyhow::{Context, Result as AnyhowResult};
use bytemerge_tokenizer::Tokenizer;
use std::path::PathBuf;

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.model)
        .with_context(|| format!("failed to load model {}", cmd.model.display()))?;

    let ids = parse_ids(&cmd.ids)?;
    let text = tokenizer.decode(&ids)?;

    println!("{}", text);

    Ok(())
}

fn parse_ids(input: &str) -> AnyhowResult<Vec<u32>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid token id {s:?}"))
        })
        .collect()
}
