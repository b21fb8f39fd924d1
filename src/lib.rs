//! Kokoro text frontend
//!
//! Turns raw text into padded, length-bounded token windows with per-window
//! style vectors, ready for a Kokoro acoustic model.

pub mod chunker;
pub mod config;
pub mod error;
pub mod g2p;
pub mod normalize;
mod numbers;
pub mod phonemes;
pub mod pipeline;
pub mod runtime;
pub mod vocab;
pub mod voice;

pub use chunker::{chunk_tokens, Chunk};
pub use config::RuntimeConfig;
pub use error::TtsError;
pub use g2p::{resolve_language, G2pBackend, G2pEngine, LanguageCode, LanguageResolution};
pub use normalize::{normalize, NormalizeStage, NORMALIZE_STAGES};
pub use phonemes::PhonemePostProcessor;
pub use pipeline::{synthesize, KokoroFrontend, PreprocessOutput, SynthesisResult, Synthesizer};
pub use runtime::{Runtime, RuntimeStatus};
pub use vocab::Vocab;
pub use voice::{select_style, StyleTable, StyleVector, VoiceBank, VoicePack};

/// Static constants that must match the model
pub mod constants {
    /// Longest token window the model accepts, excluding the two pads.
    pub const TOKEN_LIMIT: usize = 510;
    pub const PAD_ID: i64 = 0;
    pub const STYLE_DIM: usize = 256;
    pub const SAMPLE_RATE: u32 = 24000;
}
