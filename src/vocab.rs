//! Vocabulary construction and tokenization.

use crate::error::{Result as TtsResult, TtsError};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const PAD: char = '$';
pub(crate) const PUNCTUATION: &str = ";:,.!?¡¿—…\"«»“” ";
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const LETTERS_IPA: &str = "ɑɐɒæɓʙβɔɕçɗɖðʤəɘɚɛɜɝɞɟʄɡɠɢʛɦɧħɥʜɨɪʝɭɬɫɮʟɱɯɰŋɳɲɴøɵɸθœɶʘɹɺɾɻʀʁɽʂʃʈʧʉʊʋⱱʌɣɤʍχʎʏʑʐʒʔʡʕʢǀǁǂǃˈˌːˑʼʴʰʱʲʷˠˤ˞↓↑→↗↘'\u{329}'ᵻ";

/// Vocabulary mapping from characters to token IDs.
#[derive(Debug, Clone)]
pub struct Vocab {
    map: HashMap<char, i64>,
}

impl Vocab {
    /// Build the symbol table the Kokoro model was trained with.
    ///
    /// Ids follow enumeration order: pad, punctuation, Latin letters, IPA.
    /// A symbol listed twice keeps the id of its last position.
    pub fn builtin() -> Self {
        let symbols = std::iter::once(PAD)
            .chain(PUNCTUATION.chars())
            .chain(LETTERS.chars())
            .chain(LETTERS_IPA.chars());

        let mut map = HashMap::new();
        for (id, symbol) in symbols.enumerate() {
            map.insert(symbol, id as i64);
        }
        Self { map }
    }

    /// Load vocabulary from a JSON file.
    ///
    /// The JSON file should be a flat object mapping characters to token IDs:
    /// ```json
    /// { "a": 1, "b": 2, ... }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).context("Failed to open vocab file")?;
        let reader = BufReader::new(file);
        let raw: HashMap<String, i64> =
            serde_json::from_reader(reader).context("Failed to parse vocab JSON")?;

        let mut map = HashMap::with_capacity(raw.len());
        for (key, id) in raw {
            let mut chars = key.chars();
            let symbol = match (chars.next(), chars.next()) {
                (Some(symbol), None) => symbol,
                _ => anyhow::bail!("Invalid vocab key {:?}: expected a single character", key),
            };
            if id < 0 {
                anyhow::bail!("Invalid vocab id {} for {:?}", id, key);
            }
            map.insert(symbol, id);
        }
        Ok(Self { map })
    }

    pub fn id(&self, symbol: char) -> Option<i64> {
        self.map.get(&symbol).copied()
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.map.contains_key(&symbol)
    }

    /// Map a phoneme string to token IDs without boundary pads.
    ///
    /// Characters not in the vocabulary are skipped. An empty result is an
    /// error: there is nothing for the synthesizer to speak.
    pub fn tokenize(&self, phonemes: &str) -> TtsResult<Vec<i64>> {
        let ids: Vec<i64> = phonemes.chars().filter_map(|ch| self.id(ch)).collect();
        if ids.is_empty() {
            return Err(TtsError::EmptyTokenization);
        }
        Ok(ids)
    }

    /// Drop every character the model has no id for.
    ///
    /// Returns the filtered string and how many characters were removed.
    pub fn filter_to_vocab(&self, text: &str) -> (String, usize) {
        let mut dropped = 0;
        let filtered = text
            .chars()
            .filter(|&ch| {
                let keep = self.contains(ch);
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .collect();
        (filtered, dropped)
    }

    /// Get the vocabulary size.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::builtin()
    }
}
