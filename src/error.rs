//! Structured error type for the frontend's public API.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    /// Nothing phonemizable survived normalization, G2P and vocab filtering.
    #[error("No tokens found after tokenization")]
    EmptyTokenization,

    #[error("No style vector for token count {length} (voice pack covers up to {max_length})")]
    StyleLookup { length: usize, max_length: usize },

    #[error(transparent)]
    G2p(anyhow::Error),

    #[error(transparent)]
    Synthesis(anyhow::Error),

    #[error("Runtime is not initialized: {0}")]
    NotInitialized(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TtsError>;
