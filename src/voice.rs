//! Voice pack loading and style selection.

use crate::constants::STYLE_DIM;
use crate::error::{Result as TtsResult, TtsError};
use crate::g2p::LanguageCode;
use anyhow::{Context, Result};
use ndarray::{s, Array1, Array2, Array3, ArrayD};
use ndarray_npy::ReadNpyExt;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One style embedding row: `[STYLE_DIM]` floats.
///
/// The first half conditions the decoder, the second half the prosody
/// predictor.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleVector(Array1<f32>);

impl StyleVector {
    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Source of style embeddings keyed by un-padded token count.
pub trait StyleTable {
    /// Style for a window of `length` tokens, or `None` past the table's end.
    fn lookup(&self, language: LanguageCode, length: usize) -> Option<StyleVector>;

    /// Largest `length` this table can serve for `language`.
    fn max_length(&self, language: LanguageCode) -> usize;
}

/// Look up the style for a token window, failing past the end of the table.
pub fn select_style(
    table: &dyn StyleTable,
    language: LanguageCode,
    length: usize,
) -> TtsResult<StyleVector> {
    table
        .lookup(language, length)
        .ok_or_else(|| TtsError::StyleLookup {
            length,
            max_length: table.max_length(language),
        })
}

/// Voice pack containing style embeddings.
///
/// Each voice pack is a 2D array of shape `[N, 256]`; row `i` is the style
/// for a window of `i` tokens.
#[derive(Debug, Clone)]
pub struct VoicePack {
    data: Array2<f32>,
}

impl VoicePack {
    /// Load a voice pack from a .npy file.
    ///
    /// Handles both 2D `[N, 256]` and 3D `[N, 1, 256]` arrays (squeezes middle dim).
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open voice pack file {}", path.display()))?;

        let data_dyn: ArrayD<f32> =
            ArrayD::read_npy(file).context("Failed to read voice pack .npy")?;
        let pack = Self::from_dyn(data_dyn)?;

        info!(
            path = %path.display(),
            entries = pack.len(),
            "Loaded voice pack"
        );
        Ok(pack)
    }

    fn from_dyn(data_dyn: ArrayD<f32>) -> Result<Self> {
        let shape = data_dyn.shape().to_vec();

        let data: Array2<f32> = match shape.len() {
            2 => data_dyn
                .into_dimensionality()
                .context("Failed to convert to 2D array")?,
            3 => {
                if shape[1] != 1 {
                    anyhow::bail!(
                        "3D voice pack should have shape [N, 1, {}], got {:?}",
                        STYLE_DIM,
                        shape
                    );
                }
                let arr3: Array3<f32> = data_dyn
                    .into_dimensionality()
                    .context("Failed to convert to 3D array")?;
                arr3.index_axis_move(ndarray::Axis(1), 0)
            }
            _ => anyhow::bail!(
                "Voice pack must be 2D [N, {dim}] or 3D [N, 1, {dim}], got shape {:?}",
                shape,
                dim = STYLE_DIM
            ),
        };

        Self::from_array(data)
    }

    /// Wrap an in-memory `[N, 256]` table.
    pub fn from_array(data: Array2<f32>) -> Result<Self> {
        if data.ncols() != STYLE_DIM {
            anyhow::bail!(
                "Voice pack must have {} columns, got {}",
                STYLE_DIM,
                data.ncols()
            );
        }
        if data.nrows() == 0 {
            anyhow::bail!("Voice pack is empty");
        }
        Ok(Self { data })
    }

    /// Select the style for a window of `length` un-padded tokens.
    pub fn select_style(&self, length: usize) -> Option<StyleVector> {
        if length >= self.data.nrows() {
            return None;
        }
        Some(StyleVector(self.data.slice(s![length, ..]).to_owned()))
    }

    /// Get the number of style entries in this voice pack.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Check if voice pack is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl StyleTable for VoicePack {
    fn lookup(&self, _language: LanguageCode, length: usize) -> Option<StyleVector> {
        self.select_style(length)
    }

    fn max_length(&self, _language: LanguageCode) -> usize {
        self.len() - 1
    }
}

/// A default voice pack plus optional per-language overrides.
#[derive(Debug, Clone)]
pub struct VoiceBank {
    default: VoicePack,
    per_language: HashMap<LanguageCode, VoicePack>,
}

impl VoiceBank {
    pub fn new(default: VoicePack) -> Self {
        Self {
            default,
            per_language: HashMap::new(),
        }
    }

    pub fn with_language(mut self, language: LanguageCode, pack: VoicePack) -> Self {
        self.per_language.insert(language, pack);
        self
    }

    pub fn pack(&self, language: LanguageCode) -> &VoicePack {
        self.per_language.get(&language).unwrap_or(&self.default)
    }
}

impl StyleTable for VoiceBank {
    fn lookup(&self, language: LanguageCode, length: usize) -> Option<StyleVector> {
        self.pack(language).select_style(length)
    }

    fn max_length(&self, language: LanguageCode) -> usize {
        self.pack(language).max_length(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use ndarray_npy::WriteNpyExt;

    /// Row `i` is filled with the value `i`.
    fn ramp_pack(rows: usize) -> VoicePack {
        let data = Array2::from_shape_fn((rows, STYLE_DIM), |(row, _)| row as f32);
        VoicePack::from_array(data).unwrap()
    }

    #[test]
    fn test_select_style_by_length() {
        let pack = ramp_pack(511);

        let style = pack.select_style(50).unwrap();
        assert_eq!(style.len(), STYLE_DIM);
        assert_eq!(style.as_array()[0], 50.0);

        assert_eq!(pack.select_style(510).unwrap().as_array()[0], 510.0);
        assert!(pack.select_style(511).is_none());
    }

    #[test]
    fn test_select_style_is_deterministic() {
        let pack = ramp_pack(100);
        assert_eq!(pack.select_style(42), pack.select_style(42));
    }

    #[test]
    fn test_select_style_error_reports_range() {
        let pack = ramp_pack(10);
        let err = select_style(&pack, LanguageCode::EnUs, 10).unwrap_err();
        assert!(matches!(
            err,
            TtsError::StyleLookup {
                length: 10,
                max_length: 9
            }
        ));
    }

    #[test]
    fn test_rejects_wrong_width() {
        let data = Array2::<f32>::zeros((10, 128));
        assert!(VoicePack::from_array(data).is_err());
    }

    #[test]
    fn test_load_squeezes_3d_pack() {
        let data = Array3::from_shape_fn((8, 1, STYLE_DIM), |(row, _, _)| row as f32);
        let file = tempfile::NamedTempFile::new().unwrap();
        data.write_npy(File::create(file.path()).unwrap()).unwrap();

        let pack = VoicePack::load(file.path()).unwrap();
        assert_eq!(pack.len(), 8);
        assert_eq!(pack.select_style(7).unwrap().as_array()[0], 7.0);
    }

    #[test]
    fn test_voice_bank_prefers_language_pack() {
        let bank = VoiceBank::new(ramp_pack(20)).with_language(LanguageCode::EnGb, ramp_pack(5));
        assert_eq!(bank.max_length(LanguageCode::EnUs), 19);
        assert_eq!(bank.max_length(LanguageCode::EnGb), 4);
        assert!(bank.lookup(LanguageCode::EnGb, 10).is_none());
        assert!(bank.lookup(LanguageCode::EnUs, 10).is_some());
    }
}
