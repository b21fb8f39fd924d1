//! Cleanup of raw G2P output into Kokoro's phoneme alphabet.

use crate::g2p::LanguageCode;
use crate::normalize::{char_after, char_before, replace_in_context};
use crate::vocab::{Vocab, PUNCTUATION};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Known backend mispronunciations, applied before the symbol fixes.
const WORD_FIXES: &[(&str, &str)] = &[
    ("kəkˈoːɹoʊ", "kˈoʊkəɹoʊ"),
    ("kəkˈɔːɹəʊ", "kˈəʊkəɹəʊ"),
];

/// Symbols outside the model alphabet with a close equivalent inside it.
const SYMBOL_FIXES: &[(&str, &str)] = &[("ʲ", "j"), ("r", "ɹ"), ("x", "k"), ("ɬ", "l")];

static RE_HUNDRED: Lazy<Regex> = Lazy::new(|| Regex::new("hˈʌndɹɪd").unwrap());
static RE_DETACHED_Z: Lazy<Regex> = Lazy::new(|| Regex::new(" z").unwrap());
static RE_NINETY: Lazy<Regex> = Lazy::new(|| Regex::new("nˈaɪnti").unwrap());

#[derive(Clone, Copy, Debug, Default)]
pub struct PostProcessOptions {
    /// Flap the t in "ninety" (nˈaɪnti -> nˈaɪndi). No supported language
    /// turns this on.
    pub flap_ninety: bool,
}

impl PostProcessOptions {
    pub fn for_language(_language: LanguageCode) -> Self {
        Self::default()
    }
}

pub struct PhonemePostProcessor<'a> {
    vocab: &'a Vocab,
}

impl<'a> PhonemePostProcessor<'a> {
    pub fn new(vocab: &'a Vocab) -> Self {
        Self { vocab }
    }

    /// Clean up raw G2P output for `language`.
    pub fn process(&self, raw: &str, language: LanguageCode) -> String {
        self.process_with(raw, PostProcessOptions::for_language(language))
    }

    pub fn process_with(&self, raw: &str, options: PostProcessOptions) -> String {
        let mut phonemes = apply_fixes(raw);
        phonemes = separate_hundred(&phonemes);
        phonemes = attach_plural_z(&phonemes);
        if options.flap_ninety {
            phonemes = flap_ninety(&phonemes);
        }

        let (filtered, dropped) = self.vocab.filter_to_vocab(&phonemes);
        if dropped > 0 {
            debug!(
                dropped,
                total = phonemes.chars().count(),
                "Dropped non-vocab symbols from G2P output"
            );
        }
        filtered.trim().to_string()
    }
}

fn apply_fixes(raw: &str) -> String {
    WORD_FIXES
        .iter()
        .chain(SYMBOL_FIXES)
        .fold(raw.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// "ninety hundred" runs together; keep "hundred" its own word.
fn separate_hundred(phonemes: &str) -> String {
    replace_in_context(phonemes, &RE_HUNDRED, |text, caps| {
        let m = caps.get(0)?;
        let joined = matches!(char_before(text, m.start()), Some('a'..='z' | 'ɹ' | 'ː'));
        joined.then(|| format!(" {}", m.as_str()))
    })
}

/// Fuse a stray plural "z" back onto the preceding word.
fn attach_plural_z(phonemes: &str) -> String {
    replace_in_context(phonemes, &RE_DETACHED_Z, |text, caps| {
        let m = caps.get(0)?;
        let at_boundary = match char_after(text, m.end()) {
            None => true,
            Some(ch) => PUNCTUATION.contains(ch),
        };
        at_boundary.then(|| "z".to_string())
    })
}

fn flap_ninety(phonemes: &str) -> String {
    replace_in_context(phonemes, &RE_NINETY, |text, caps| {
        let m = caps.get(0)?;
        (char_after(text, m.end()) != Some('ː')).then(|| "nˈaɪndi".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(raw: &str) -> String {
        let vocab = Vocab::builtin();
        PhonemePostProcessor::new(&vocab).process(raw, LanguageCode::EnUs)
    }

    #[test]
    fn test_product_name_fix() {
        assert_eq!(process("kəkˈoːɹoʊ"), "kˈoʊkəɹoʊ");
        assert_eq!(process("kəkˈɔːɹəʊ"), "kˈəʊkəɹəʊ");
    }

    #[test]
    fn test_symbol_fixes() {
        assert_eq!(process("ræx"), "ɹæk");
        assert_eq!(process("ɬa"), "la");
        assert_eq!(process("nʲa"), "nja");
    }

    #[test]
    fn test_hundred_is_separated() {
        assert_eq!(process("tˈuːhˈʌndɹɪd"), "tˈuː hˈʌndɹɪd");
        assert_eq!(process("fˈoːɹhˈʌndɹɪd"), "fˈoːɹ hˈʌndɹɪd");
        assert_eq!(process("ə hˈʌndɹɪd"), "ə hˈʌndɹɪd");
    }

    #[test]
    fn test_plural_z_is_attached() {
        assert_eq!(process("kˈæt z."), "kˈætz.");
        assert_eq!(process("kˈæt z"), "kˈætz");
        assert_eq!(process("kˈæt z bˈæt"), "kˈætz bˈæt");
        assert_eq!(process("kˈæt zˈuː"), "kˈæt zˈuː");
    }

    #[test]
    fn test_flap_only_when_enabled() {
        let vocab = Vocab::builtin();
        let post = PhonemePostProcessor::new(&vocab);
        assert_eq!(post.process("nˈaɪnti", LanguageCode::EnUs), "nˈaɪnti");
        assert_eq!(
            post.process_with("nˈaɪnti", PostProcessOptions { flap_ninety: true }),
            "nˈaɪndi"
        );
        assert_eq!(
            post.process_with("nˈaɪntiː", PostProcessOptions { flap_ninety: true }),
            "nˈaɪntiː"
        );
    }

    #[test]
    fn test_unmapped_symbols_dropped() {
        assert_eq!(process("h3ˈɛloʊ 42"), "hˈɛloʊ");
    }
}
