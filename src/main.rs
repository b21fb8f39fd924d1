//! CLI entry point for the Kokoro text frontend.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kokoro_frontend::pipeline::PreprocessSummary;
use kokoro_frontend::{G2pEngine, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(name = "kokoro-frontend")]
#[command(about = "Normalize, phonemize and chunk text for Kokoro TTS")]
struct Args {
    /// Text to prepare
    #[arg(short, long, conflicts_with = "phonemes", required_unless_present = "phonemes")]
    text: Option<String>,

    /// IPA phoneme string to tokenize directly, skipping normalization and G2P
    #[arg(short, long)]
    phonemes: Option<String>,

    /// Language tag (en-us or en-gb)
    #[arg(short, long)]
    lang: Option<String>,

    /// Path to voice pack .npy file
    #[arg(short, long)]
    voice: Option<PathBuf>,

    /// Path to vocab.json file (built-in table if omitted)
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum tokens per chunk
    #[arg(long)]
    limit: Option<usize>,

    /// Speaking rate recorded for the synthesizer
    #[arg(long)]
    speed: Option<f32>,

    /// Send --text to G2P without normalizing it first
    #[arg(long, conflicts_with = "phonemes")]
    no_normalize: bool,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// What the CLI prints: the chunk dump plus the rate to synthesize it at.
#[derive(Serialize)]
struct Report {
    speed: f32,
    #[serde(flatten)]
    summary: PreprocessSummary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match (&args.config, &args.voice) {
        (Some(path), _) => RuntimeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, Some(voice)) => RuntimeConfig::new(voice),
        (None, None) => anyhow::bail!("Either --voice or --config is required"),
    };
    if let Some(voice) = args.voice {
        config.voice_path = voice;
    }
    if let Some(vocab) = args.vocab {
        config.vocab_path = Some(vocab);
    }
    if let Some(limit) = args.limit {
        config.token_limit = limit;
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(lang) = args.lang {
        config.language = lang;
    }

    let g2p = G2pEngine::new().context("Failed to initialize G2P backend")?;
    let frontend = config
        .build_frontend(g2p)
        .context("Failed to build frontend")?;

    let language = Some(config.language.as_str());
    let output = match (&args.phonemes, &args.text) {
        (Some(phonemes), _) => frontend.preprocess_phonemes(phonemes, language),
        (None, Some(text)) => frontend.preprocess_with(text, language, !args.no_normalize),
        (None, None) => anyhow::bail!("Either --text or --phonemes is required"),
    }
    .context("Preprocessing failed")?;

    if output.language.fallback_used {
        info!(
            requested = %output.language.requested,
            "Using en-us for unsupported language"
        );
    }
    info!(
        tokens = output.tokens.len(),
        chunks = output.chunks.len(),
        speed = config.speed,
        "Prepared input"
    );

    let report = Report {
        speed: config.speed,
        summary: output.summary(),
    };
    let json = serde_json::to_string_pretty(&report)
        .context("Failed to serialize result")?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
