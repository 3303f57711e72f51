//! Glyph alphabets and luminance quantization.

use serde::{Deserialize, Serialize};

use crate::camera::checked_channel;
use crate::error::Result;

/// Standard ASCII density ramp (10 levels).
/// Characters ordered from lightest (space) to densest (@).
pub const STANDARD_CHARSET: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Block character set (5 levels).
/// Uses Unicode block characters for higher perceived resolution.
pub const BLOCKS_CHARSET: &[char] = &[' ', '░', '▒', '▓', '█'];

/// Minimal character set (4 levels).
/// Clean, less noisy look.
pub const MINIMAL_CHARSET: &[char] = &[' ', '.', ':', '#'];

/// Glyph alphabet used by the [`Quantizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharSet {
    /// Standard ASCII density ramp (10 levels)
    #[default]
    Standard,
    /// Block character set (5 levels) using Unicode blocks
    Blocks,
    /// Minimal character set (4 levels) for a clean look
    Minimal,
}

impl CharSet {
    /// Get the character slice for this charset, lightest first.
    pub fn chars(&self) -> &'static [char] {
        match self {
            CharSet::Standard => STANDARD_CHARSET,
            CharSet::Blocks => BLOCKS_CHARSET,
            CharSet::Minimal => MINIMAL_CHARSET,
        }
    }
}

/// Index of the glyph for `luminance` in an alphabet of `levels` glyphs.
///
/// Linear quantization `floor((levels - 1) * luminance / 255)`: 0 maps to
/// the first glyph, 255 to the last, ties round down.
#[inline]
pub fn glyph_index(luminance: u8, levels: usize) -> usize {
    if levels == 0 {
        return 0;
    }
    (luminance as usize * (levels - 1)) / 255
}

/// Maps luminance samples to glyphs of increasing density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quantizer {
    charset: CharSet,
    invert: bool,
}

impl Quantizer {
    pub fn new(charset: CharSet) -> Self {
        Self {
            charset,
            invert: false,
        }
    }

    /// Invert brightness before mapping (for light terminals).
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn charset(&self) -> CharSet {
        self.charset
    }

    /// Glyph for a luminance sample.
    #[inline]
    pub fn glyph_for(&self, luminance: u8) -> char {
        let chars = self.charset.chars();
        let v = if self.invert { 255 - luminance } else { luminance };
        chars[glyph_index(v, chars.len())]
    }

    /// Glyph for an untyped luminance value, rejecting anything outside 0-255.
    pub fn glyph_for_value(&self, luminance: i64) -> Result<char> {
        let v = checked_channel("luminance", luminance)?;
        Ok(self.glyph_for(v))
    }

    /// The glyph used for luminance 0.
    pub fn lightest(&self) -> char {
        self.charset.chars()[0]
    }

    /// The glyph used for luminance 255.
    pub fn densest(&self) -> char {
        let chars = self.charset.chars();
        chars[chars.len() - 1]
    }
}
