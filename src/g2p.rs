//! Grapheme-to-phoneme backends and language resolution.

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub enum LanguageCode {
    #[serde(rename = "en-us")]
    EnUs,
    #[serde(rename = "en-gb")]
    EnGb,
}

impl LanguageCode {
    pub fn as_tag(self) -> &'static str {
        match self {
            LanguageCode::EnUs => "en-us",
            LanguageCode::EnGb => "en-gb",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Outcome of mapping a caller-supplied tag onto a supported language.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LanguageResolution {
    pub language: LanguageCode,
    pub requested: String,
    /// Set when the tag was not recognized and en-us was substituted.
    pub fallback_used: bool,
}

/// Resolve a language tag, substituting en-us for anything unsupported.
pub fn resolve_language(code: Option<&str>) -> LanguageResolution {
    let requested = code.unwrap_or("en-us").to_string();
    match parse_language(&requested) {
        Some(language) => LanguageResolution {
            language,
            requested,
            fallback_used: false,
        },
        None => {
            warn!(requested = %requested, "Language not supported, defaulting to en-us");
            LanguageResolution {
                language: LanguageCode::EnUs,
                requested,
                fallback_used: true,
            }
        }
    }
}

fn parse_language(code: &str) -> Option<LanguageCode> {
    let normalized = code.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "en-us" | "en_us" | "en" | "" => Some(LanguageCode::EnUs),
        "en-gb" | "en_gb" | "en-uk" | "en_uk" => Some(LanguageCode::EnGb),
        _ => None,
    }
}

/// A grapheme-to-phoneme converter.
///
/// Implementations must keep punctuation in place and mark primary and
/// secondary stress. They may return an empty string. Implementations are
/// not required to tolerate concurrent calls; the frontend owns its backend
/// and calls it from one thread at a time.
pub trait G2pBackend: Send {
    fn phonemize(&self, text: &str, language: LanguageCode) -> Result<String>;
}

/// Handle to the G2P backend, built once and reused for every request.
pub struct G2pEngine {
    backend: Box<dyn G2pBackend>,
}

impl G2pEngine {
    /// Build the backend selected at compile time.
    pub fn new() -> Result<Self> {
        #[cfg(feature = "g2p-voirs")]
        {
            Ok(Self {
                backend: Box::new(VoiRsBackend::new()?),
            })
        }
        #[cfg(not(feature = "g2p-voirs"))]
        {
            Ok(Self {
                backend: Box::new(DisabledG2pBackend),
            })
        }
    }

    pub fn with_backend(backend: Box<dyn G2pBackend>) -> Self {
        Self { backend }
    }

    pub fn phonemize(&self, text: &str, language: LanguageCode) -> Result<String> {
        self.backend.phonemize(text, language)
    }
}

pub struct DisabledG2pBackend;

impl G2pBackend for DisabledG2pBackend {
    fn phonemize(&self, _text: &str, _language: LanguageCode) -> Result<String> {
        anyhow::bail!("G2P backend is disabled; enable the g2p-voirs feature or pass phonemes directly")
    }
}

#[cfg(feature = "g2p-voirs")]
struct VoiRsBackend {
    inner: voirs_g2p::rules::EnglishRuleG2p,
}

#[cfg(feature = "g2p-voirs")]
impl VoiRsBackend {
    fn new() -> Result<Self> {
        let inner = voirs_g2p::rules::EnglishRuleG2p::new()
            .map_err(|err| anyhow::anyhow!("G2P init failed: {err}"))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "g2p-voirs")]
impl G2pBackend for VoiRsBackend {
    fn phonemize(&self, text: &str, language: LanguageCode) -> Result<String> {
        let lang = match language {
            LanguageCode::EnUs => voirs_g2p::LanguageCode::EnUs,
            LanguageCode::EnGb => voirs_g2p::LanguageCode::EnGb,
        };
        let phonemes = futures::executor::block_on(voirs_g2p::G2p::to_phonemes(
            &self.inner,
            text,
            Some(lang),
        ))
        .map_err(|err| anyhow::anyhow!("G2P conversion failed: {err}"))?;

        Ok(phonemes
            .iter()
            .map(|phoneme| map_symbol(phoneme.effective_symbol()))
            .collect())
    }
}

/// Kokoro writes affricates as single ligature glyphs.
#[cfg_attr(not(feature = "g2p-voirs"), allow(dead_code))]
fn map_symbol(symbol: &str) -> &str {
    match symbol {
        "tʃ" => "ʧ",
        "dʒ" => "ʤ",
        _ => symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_supported_tags() {
        let us = resolve_language(Some("en-US"));
        assert_eq!(us.language, LanguageCode::EnUs);
        assert!(!us.fallback_used);

        let gb = resolve_language(Some("en_gb"));
        assert_eq!(gb.language, LanguageCode::EnGb);
        assert!(!gb.fallback_used);

        assert_eq!(resolve_language(None).language, LanguageCode::EnUs);
    }

    #[test]
    fn test_resolve_unknown_tag_falls_back() {
        let res = resolve_language(Some("fr-fr"));
        assert_eq!(res.language, LanguageCode::EnUs);
        assert!(res.fallback_used);
        assert_eq!(res.requested, "fr-fr");
    }

    #[test]
    fn test_disabled_backend_errors() {
        let engine = G2pEngine::with_backend(Box::new(DisabledG2pBackend));
        let err = engine.phonemize("hello", LanguageCode::EnUs).unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_map_symbol_ligatures() {
        assert_eq!(map_symbol("tʃ"), "ʧ");
        assert_eq!(map_symbol("dʒ"), "ʤ");
        assert_eq!(map_symbol("ə"), "ə");
    }

    #[test]
    fn test_map_symbol_never_leaves_the_vocab() {
        let vocab = crate::vocab::Vocab::builtin();
        for symbol in ["tʃ", "dʒ", "ts", "dz", "tɕ", "dʑ", "ə", "ɹ"] {
            let mapped = map_symbol(symbol);
            assert!(
                mapped.chars().all(|c| vocab.contains(c)),
                "{symbol} mapped to {mapped}, which has no token"
            );
        }
        // Affricates without a ligature in the table stay as two symbols.
        assert_eq!(map_symbol("ts"), "ts");
        assert_eq!(map_symbol("tɕ"), "tɕ");
    }
}
