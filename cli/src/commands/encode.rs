//! Encode command implementation.

use clap::Parser;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    /// Path to the trained model file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Text to encode, or `-` to read stdin
    #[arg(short, long)]
    pub input: String,

    /// Treat special-token strings as ordinary text
    #[arg(long, default_value_t = false)]
    pub ordinary: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

use anyhow::{Context, Result as AnyhowResult};
use bytemerge_tokenizer::Tokenizer;
use std::io::Read;
use std::path::PathBuf;

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.model)
        .with_context(|| format!("failed to load model {}", cmd.model.display()))?;

    // Read input text (from stdin if "-")
    let input_text = if cmd.input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    } else {
        cmd.input
    };

    let ids = if cmd.ordinary {
        tokenizer.encode_ordinary(&input_text)
    } else {
        tokenizer.encode(&input_text)
    }
    .context("failed to encode input")?;
    let output = format_ids(&ids);

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Encoded {} tokens to {}", ids.len(), path.display());
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}

fn format_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
