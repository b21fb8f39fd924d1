//! Splitting token sequences into model-sized windows.

use crate::constants::PAD_ID;
use crate::error::{Result, TtsError};
use crate::g2p::LanguageCode;
use crate::voice::{select_style, StyleTable, StyleVector};

/// A window of tokens and the style chosen for its length.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub tokens: Vec<i64>,
    pub style: StyleVector,
}

impl Chunk {
    /// Tokens wrapped with a pad id on each side, as the model expects.
    pub fn padded_tokens(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.tokens.len() + 2);
        ids.push(PAD_ID);
        ids.extend_from_slice(&self.tokens);
        ids.push(PAD_ID);
        ids
    }

    /// Number of tokens, not counting the pads.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split `tokens` into windows of at most `limit` tokens, in order.
///
/// Windows are cut at fixed offsets, so a boundary can fall inside a word.
/// Each window gets the style keyed by its own length.
pub fn chunk_tokens(
    tokens: &[i64],
    limit: usize,
    language: LanguageCode,
    styles: &dyn StyleTable,
) -> Result<Vec<Chunk>> {
    if tokens.is_empty() {
        return Err(TtsError::EmptyTokenization);
    }
    if limit == 0 {
        return Err(TtsError::Config("token limit must be positive".to_string()));
    }

    tokens
        .chunks(limit)
        .map(|window| {
            Ok(Chunk {
                tokens: window.to_vec(),
                style: select_style(styles, language, window.len())?,
            })
        })
        .collect()
}
