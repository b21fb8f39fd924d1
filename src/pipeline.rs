//! Text-to-chunks pipeline for Kokoro TTS.
//!
//! The frontend runs these stages in order:
//! - Normalizer: raw text -> canonical text
//! - G2P backend: canonical text -> raw phonemes
//! - Post-processor: raw phonemes -> phonemes in the model alphabet
//! - Tokenizer: phonemes -> token ids
//! - Chunker: token ids -> padded windows, each with its own style vector

use crate::chunker::{chunk_tokens, Chunk};
use crate::constants::{SAMPLE_RATE, TOKEN_LIMIT};
use crate::error::{Result, TtsError};
use crate::g2p::{resolve_language, G2pEngine, LanguageResolution};
use crate::normalize::normalize;
use crate::phonemes::PhonemePostProcessor;
use crate::voice::{StyleTable, StyleVector};
use crate::Vocab;
use serde::Serialize;
use tracing::{debug, info};

/// Acoustic model that turns one padded token window into audio.
pub trait Synthesizer {
    /// `tokens` includes the boundary pads. Returns samples at `SAMPLE_RATE`.
    fn synthesize(&self, tokens: &[i64], style: &StyleVector, speed: f32)
        -> anyhow::Result<Vec<f32>>;
}

/// Everything the frontend derived from one input, in order of production.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub language: LanguageResolution,
    pub normalized: String,
    pub phonemes: String,
    pub tokens: Vec<i64>,
    pub chunks: Vec<Chunk>,
}

impl PreprocessOutput {
    /// JSON-friendly view used by the CLI.
    pub fn summary(&self) -> PreprocessSummary {
        PreprocessSummary {
            language: self.language.clone(),
            normalized: self.normalized.clone(),
            phonemes: self.phonemes.clone(),
            token_count: self.tokens.len(),
            chunks: self
                .chunks
                .iter()
                .map(|chunk| ChunkSummary {
                    tokens: chunk.padded_tokens(),
                    style: chunk.style.to_vec(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreprocessSummary {
    pub language: LanguageResolution,
    pub normalized: String,
    pub phonemes: String,
    pub token_count: usize,
    pub chunks: Vec<ChunkSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkSummary {
    pub tokens: Vec<i64>,
    pub style: Vec<f32>,
}

#[derive(Clone, Debug)]
pub struct SynthesisResult {
    pub audio: Vec<f32>,
    pub sample_rate: u32,
}

/// Owns the long-lived resources of the text frontend.
///
/// Build once and reuse: the G2P backend is expensive to construct.
pub struct KokoroFrontend {
    vocab: Vocab,
    g2p: G2pEngine,
    styles: Box<dyn StyleTable + Send>,
    token_limit: usize,
}

impl KokoroFrontend {
    pub fn new(vocab: Vocab, g2p: G2pEngine, styles: Box<dyn StyleTable + Send>) -> Self {
        Self {
            vocab,
            g2p,
            styles,
            token_limit: TOKEN_LIMIT,
        }
    }

    /// Override the window size. Values outside `1..=TOKEN_LIMIT` are rejected.
    pub fn with_token_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 || limit > TOKEN_LIMIT {
            return Err(TtsError::Config(format!(
                "token limit must be between 1 and {TOKEN_LIMIT}, got {limit}"
            )));
        }
        self.token_limit = limit;
        Ok(self)
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }

    /// Run text through normalization, G2P and post-processing.
    ///
    /// Returns the resolved language, the normalized text and the cleaned
    /// phoneme string.
    pub fn phonemize(
        &self,
        text: &str,
        language: Option<&str>,
    ) -> Result<(LanguageResolution, String, String)> {
        self.phonemize_with(text, language, true)
    }

    /// Like [`phonemize`](Self::phonemize), but with `normalize_text` false
    /// the text goes to G2P exactly as given. Post-processing still runs.
    pub fn phonemize_with(
        &self,
        text: &str,
        language: Option<&str>,
        normalize_text: bool,
    ) -> Result<(LanguageResolution, String, String)> {
        let resolution = resolve_language(language);
        let normalized = if normalize_text {
            let normalized = normalize(text);
            debug!(normalized = %normalized, "Normalized text");
            normalized
        } else {
            text.to_string()
        };

        let raw = self
            .g2p
            .phonemize(&normalized, resolution.language)
            .map_err(TtsError::G2p)?;
        let phonemes =
            PhonemePostProcessor::new(&self.vocab).process(&raw, resolution.language);
        debug!(phonemes = %phonemes, "Phonemized text");

        Ok((resolution, normalized, phonemes))
    }

    /// Convert raw text into ordered, styled token windows.
    pub fn preprocess(&self, text: &str, language: Option<&str>) -> Result<PreprocessOutput> {
        self.preprocess_with(text, language, true)
    }

    /// [`preprocess`](Self::preprocess) with normalization optional.
    pub fn preprocess_with(
        &self,
        text: &str,
        language: Option<&str>,
        normalize_text: bool,
    ) -> Result<PreprocessOutput> {
        let (resolution, normalized, phonemes) =
            self.phonemize_with(text, language, normalize_text)?;
        let tokens = self.vocab.tokenize(&phonemes)?;
        let chunks = chunk_tokens(
            &tokens,
            self.token_limit,
            resolution.language,
            self.styles.as_ref(),
        )?;

        info!(
            language = %resolution.language,
            tokens = tokens.len(),
            chunks = chunks.len(),
            "Preprocessed input"
        );

        Ok(PreprocessOutput {
            language: resolution,
            normalized,
            phonemes,
            tokens,
            chunks,
        })
    }

    /// Tokenize and chunk an already phonemized string, skipping G2P.
    pub fn preprocess_phonemes(
        &self,
        phonemes: &str,
        language: Option<&str>,
    ) -> Result<PreprocessOutput> {
        let resolution = resolve_language(language);
        let (filtered, _) = self.vocab.filter_to_vocab(phonemes);
        let phonemes = filtered.trim();
        let tokens = self.vocab.tokenize(phonemes)?;
        let chunks = chunk_tokens(
            &tokens,
            self.token_limit,
            resolution.language,
            self.styles.as_ref(),
        )?;

        Ok(PreprocessOutput {
            language: resolution,
            normalized: String::new(),
            phonemes: phonemes.to_string(),
            tokens,
            chunks,
        })
    }
}

/// Feed chunks to `synthesizer` in order and concatenate the audio.
pub fn synthesize(
    chunks: &[Chunk],
    synthesizer: &dyn Synthesizer,
    speed: f32,
) -> Result<SynthesisResult> {
    let mut audio = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let samples = synthesizer
            .synthesize(&chunk.padded_tokens(), &chunk.style, speed)
            .map_err(TtsError::Synthesis)?;
        debug!(chunk = index, samples = samples.len(), "Synthesized chunk");
        audio.extend(samples);
    }

    Ok(SynthesisResult {
        audio,
        sample_rate: SAMPLE_RATE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STYLE_DIM;
    use crate::g2p::{G2pBackend, LanguageCode};
    use crate::voice::VoicePack;
    use ndarray::Array2;

    /// Echoes its input, standing in for a real phonemizer.
    struct EchoBackend;

    impl G2pBackend for EchoBackend {
        fn phonemize(&self, text: &str, _language: LanguageCode) -> anyhow::Result<String> {
            Ok(text.to_string())
        }
    }

    fn frontend() -> KokoroFrontend {
        let data = Array2::from_shape_fn((TOKEN_LIMIT + 1, STYLE_DIM), |(row, _)| row as f32);
        KokoroFrontend::new(
            Vocab::builtin(),
            G2pEngine::with_backend(Box::new(EchoBackend)),
            Box::new(VoicePack::from_array(data).unwrap()),
        )
    }

    #[test]
    fn test_preprocess_single_chunk() {
        let out = frontend().preprocess("Dr. Smith", Some("en-us")).unwrap();
        assert_eq!(out.normalized, "Doctor Smith");
        assert_eq!(out.chunks.len(), 1);
        assert_eq!(out.chunks[0].len(), out.tokens.len());
        assert!(!out.language.fallback_used);
    }

    #[test]
    fn test_preprocess_reports_fallback() {
        let out = frontend().preprocess("hello", Some("de")).unwrap();
        assert!(out.language.fallback_used);
        assert_eq!(out.language.language, LanguageCode::EnUs);
    }

    #[test]
    fn test_preprocess_whitespace_is_empty() {
        let err = frontend().preprocess("   ", None).unwrap_err();
        assert!(matches!(err, TtsError::EmptyTokenization));
    }

    #[test]
    fn test_token_limit_bounds() {
        assert!(frontend().with_token_limit(0).is_err());
        assert!(frontend().with_token_limit(TOKEN_LIMIT + 1).is_err());
        let small = frontend().with_token_limit(4).unwrap();
        let out = small.preprocess("abcdefghij", None).unwrap();
        let lengths: Vec<usize> = out.chunks.iter().map(Chunk::len).collect();
        assert_eq!(lengths, vec![4, 4, 2]);
    }

    #[test]
    fn test_summary_pads_tokens() {
        let out = frontend().preprocess_phonemes("hˈɛloʊ", None).unwrap();
        let summary = out.summary();
        assert_eq!(summary.token_count, 6);
        assert_eq!(summary.chunks[0].tokens.len(), 8);
        assert_eq!(summary.chunks[0].style.len(), STYLE_DIM);
    }

    #[test]
    fn test_preprocess_phonemes_trims_before_tokenizing() {
        let padded = frontend().preprocess_phonemes("  hˈɛloʊ \n", None).unwrap();
        let bare = frontend().preprocess_phonemes("hˈɛloʊ", None).unwrap();
        assert_eq!(padded.phonemes, "hˈɛloʊ");
        assert_eq!(padded.tokens, bare.tokens);
        assert_eq!(padded.tokens.len(), 6);
        assert_eq!(padded.chunks[0].style, bare.chunks[0].style);
    }

    #[test]
    fn test_preprocess_without_normalization() {
        let out = frontend()
            .preprocess_with("Dr. Smith", Some("en-us"), false)
            .unwrap();
        assert_eq!(out.normalized, "Dr. Smith");
        // Symbol fixes still apply.
        assert_eq!(out.phonemes, "Dɹ. Smith");

        let (_, normalized, _) = frontend().phonemize_with("Dr. Smith", None, true).unwrap();
        assert_eq!(normalized, "Doctor Smith");
    }
}
