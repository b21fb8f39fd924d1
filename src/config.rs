//! Runtime configuration.
//!
//! ```toml
//! voice_path = "voices/af.npy"
//! vocab_path = "vocab.json"     # optional, built-in table otherwise
//! language = "en-us"
//! speed = 1.0
//! token_limit = 510
//!
//! [voices]
//! en-gb = "voices/bf.npy"
//! ```

use crate::constants::TOKEN_LIMIT;
use crate::error::{Result, TtsError};
use crate::g2p::{resolve_language, G2pEngine};
use crate::pipeline::KokoroFrontend;
use crate::voice::{VoiceBank, VoicePack};
use crate::Vocab;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Default voice pack (.npy)
    pub voice_path: PathBuf,

    /// vocab.json to use instead of the built-in symbol table
    #[serde(default)]
    pub vocab_path: Option<PathBuf>,

    /// Per-language voice packs, keyed by language tag
    #[serde(default)]
    pub voices: BTreeMap<String, PathBuf>,

    #[serde(default = "default_language")]
    pub language: String,

    /// Speaking rate. The frontend never reads it; callers hand it to
    /// [`synthesize`](crate::synthesize) and the CLI writes it into its dump.
    #[serde(default = "default_speed")]
    pub speed: f32,

    #[serde(default = "default_token_limit")]
    pub token_limit: usize,
}

fn default_language() -> String {
    "en-us".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_token_limit() -> usize {
    TOKEN_LIMIT
}

impl RuntimeConfig {
    pub fn new(voice_path: impl Into<PathBuf>) -> Self {
        Self {
            voice_path: voice_path.into(),
            vocab_path: None,
            voices: BTreeMap::new(),
            language: default_language(),
            speed: default_speed(),
            token_limit: default_token_limit(),
        }
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_limit == 0 || self.token_limit > TOKEN_LIMIT {
            return Err(TtsError::Config(format!(
                "token_limit must be between 1 and {TOKEN_LIMIT}, got {}",
                self.token_limit
            )));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(TtsError::Config(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        for tag in self.voices.keys() {
            if resolve_language(Some(tag)).fallback_used {
                return Err(TtsError::Config(format!(
                    "voices: unsupported language tag {tag:?}"
                )));
            }
        }
        Ok(())
    }

    /// Load the vocabulary and voice packs and assemble a frontend around `g2p`.
    pub fn build_frontend(&self, g2p: G2pEngine) -> Result<KokoroFrontend> {
        self.validate()?;

        let vocab = match &self.vocab_path {
            Some(path) => Vocab::load(path).map_err(|err| TtsError::Config(format!("{err:#}")))?,
            None => Vocab::builtin(),
        };

        let mut bank = VoiceBank::new(load_pack(&self.voice_path)?);
        for (tag, path) in &self.voices {
            let language = resolve_language(Some(tag)).language;
            bank = bank.with_language(language, load_pack(path)?);
        }

        KokoroFrontend::new(vocab, g2p, Box::new(bank)).with_token_limit(self.token_limit)
    }
}

fn load_pack(path: &Path) -> Result<VoicePack> {
    VoicePack::load(path).map_err(|err| TtsError::Config(format!("{err:#}")))
}
