//! RGB to terminal color-escape mapping.

use serde::{Deserialize, Serialize};

use crate::camera::checked_channel;
use crate::error::Result;

/// Escape that ends the styling of a cell.
pub const RESET: &str = "\x1b[0m";

/// The xterm 256-color table.
///
/// Entries 0-15 are the ANSI base colors, 16-231 a 6x6x6 cube over the
/// levels 0, 95, 135, 175, 215, 255, and 232-255 a gray ramp from 8 to 238.
#[rustfmt::skip]
pub const INDEXED_PALETTE: [[u8; 3]; 256] = [
    [  0,   0,   0], [128,   0,   0], [  0, 128,   0], [128, 128,   0],
    [  0,   0, 128], [128,   0, 128], [  0, 128, 128], [192, 192, 192],
    [128, 128, 128], [255,   0,   0], [  0, 255,   0], [255, 255,   0],
    [  0,   0, 255], [255,   0, 255], [  0, 255, 255], [255, 255, 255],
    [  0,   0,   0], [  0,   0,  95], [  0,   0, 135], [  0,   0, 175],
    [  0,   0, 215], [  0,   0, 255], [  0,  95,   0], [  0,  95,  95],
    [  0,  95, 135], [  0,  95, 175], [  0,  95, 215], [  0,  95, 255],
    [  0, 135,   0], [  0, 135,  95], [  0, 135, 135], [  0, 135, 175],
    [  0, 135, 215], [  0, 135, 255], [  0, 175,   0], [  0, 175,  95],
    [  0, 175, 135], [  0, 175, 175], [  0, 175, 215], [  0, 175, 255],
    [  0, 215,   0], [  0, 215,  95], [  0, 215, 135], [  0, 215, 175],
    [  0, 215, 215], [  0, 215, 255], [  0, 255,   0], [  0, 255,  95],
    [  0, 255, 135], [  0, 255, 175], [  0, 255, 215], [  0, 255, 255],
    [ 95,   0,   0], [ 95,   0,  95], [ 95,   0, 135], [ 95,   0, 175],
    [ 95,   0, 215], [ 95,   0, 255], [ 95,  95,   0], [ 95,  95,  95],
    [ 95,  95, 135], [ 95,  95, 175], [ 95,  95, 215], [ 95,  95, 255],
    [ 95, 135,   0], [ 95, 135,  95], [ 95, 135, 135], [ 95, 135, 175],
    [ 95, 135, 215], [ 95, 135, 255], [ 95, 175,   0], [ 95, 175,  95],
    [ 95, 175, 135], [ 95, 175, 175], [ 95, 175, 215], [ 95, 175, 255],
    [ 95, 215,   0], [ 95, 215,  95], [ 95, 215, 135], [ 95, 215, 175],
    [ 95, 215, 215], [ 95, 215, 255], [ 95, 255,   0], [ 95, 255,  95],
    [ 95, 255, 135], [ 95, 255, 175], [ 95, 255, 215], [ 95, 255, 255],
    [135,   0,   0], [135,   0,  95], [135,   0, 135], [135,   0, 175],
    [135,   0, 215], [135,   0, 255], [135,  95,   0], [135,  95,  95],
    [135,  95, 135], [135,  95, 175], [135,  95, 215], [135,  95, 255],
    [135, 135,   0], [135, 135,  95], [135, 135, 135], [135, 135, 175],
    [135, 135, 215], [135, 135, 255], [135, 175,   0], [135, 175,  95],
    [135, 175, 135], [135, 175, 175], [135, 175, 215], [135, 175, 255],
    [135, 215,   0], [135, 215,  95], [135, 215, 135], [135, 215, 175],
    [135, 215, 215], [135, 215, 255], [135, 255,   0], [135, 255,  95],
    [135, 255, 135], [135, 255, 175], [135, 255, 215], [135, 255, 255],
    [175,   0,   0], [175,   0,  95], [175,   0, 135], [175,   0, 175],
    [175,   0, 215], [175,   0, 255], [175,  95,   0], [175,  95,  95],
    [175,  95, 135], [175,  95, 175], [175,  95, 215], [175,  95, 255],
    [175, 135,   0], [175, 135,  95], [175, 135, 135], [175, 135, 175],
    [175, 135, 215], [175, 135, 255], [175, 175,   0], [175, 175,  95],
    [175, 175, 135], [175, 175, 175], [175, 175, 215], [175, 175, 255],
    [175, 215,   0], [175, 215,  95], [175, 215, 135], [175, 215, 175],
    [175, 215, 215], [175, 215, 255], [175, 255,   0], [175, 255,  95],
    [175, 255, 135], [175, 255, 175], [175, 255, 215], [175, 255, 255],
    [215,   0,   0], [215,   0,  95], [215,   0, 135], [215,   0, 175],
    [215,   0, 215], [215,   0, 255], [215,  95,   0], [215,  95,  95],
    [215,  95, 135], [215,  95, 175], [215,  95, 215], [215,  95, 255],
    [215, 135,   0], [215, 135,  95], [215, 135, 135], [215, 135, 175],
    [215, 135, 215], [215, 135, 255], [215, 175,   0], [215, 175,  95],
    [215, 175, 135], [215, 175, 175], [215, 175, 215], [215, 175, 255],
    [215, 215,   0], [215, 215,  95], [215, 215, 135], [215, 215, 175],
    [215, 215, 215], [215, 215, 255], [215, 255,   0], [215, 255,  95],
    [215, 255, 135], [215, 255, 175], [215, 255, 215], [215, 255, 255],
    [255,   0,   0], [255,   0,  95], [255,   0, 135], [255,   0, 175],
    [255,   0, 215], [255,   0, 255], [255,  95,   0], [255,  95,  95],
    [255,  95, 135], [255,  95, 175], [255,  95, 215], [255,  95, 255],
    [255, 135,   0], [255, 135,  95], [255, 135, 135], [255, 135, 175],
    [255, 135, 215], [255, 135, 255], [255, 175,   0], [255, 175,  95],
    [255, 175, 135], [255, 175, 175], [255, 175, 215], [255, 175, 255],
    [255, 215,   0], [255, 215,  95], [255, 215, 135], [255, 215, 175],
    [255, 215, 215], [255, 215, 255], [255, 255,   0], [255, 255,  95],
    [255, 255, 135], [255, 255, 175], [255, 255, 215], [255, 255, 255],
    [  8,   8,   8], [ 18,  18,  18], [ 28,  28,  28], [ 38,  38,  38],
    [ 48,  48,  48], [ 58,  58,  58], [ 68,  68,  68], [ 78,  78,  78],
    [ 88,  88,  88], [ 98,  98,  98], [108, 108, 108], [118, 118, 118],
    [128, 128, 128], [138, 138, 138], [148, 148, 148], [158, 158, 158],
    [168, 168, 168], [178, 178, 178], [188, 188, 188], [198, 198, 198],
    [208, 208, 208], [218, 218, 218], [228, 228, 228], [238, 238, 238],
];

/// How a cell's color is expressed, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Glyphs only
    #[default]
    None,
    /// 24-bit `38;2;R;G;B` escapes carrying the raw triple
    TrueColor,
    /// Nearest entry of [`INDEXED_PALETTE`] as a `38;5;N` escape
    Indexed,
}

impl ColorMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ColorMode::None)
    }
}

/// Index of the palette entry closest to (r, g, b).
///
/// Distance is the sum of absolute channel differences; on a tie the
/// lowest index wins.
pub fn nearest_index(r: u8, g: u8, b: u8) -> u8 {
    let mut best_index = 0usize;
    let mut best_distance = u32::MAX;

    for (i, entry) in INDEXED_PALETTE.iter().enumerate() {
        let distance = (r as i32 - entry[0] as i32).unsigned_abs()
            + (g as i32 - entry[1] as i32).unsigned_abs()
            + (b as i32 - entry[2] as i32).unsigned_abs();
        if distance < best_distance {
            best_distance = distance;
            best_index = i;
            if distance == 0 {
                break;
            }
        }
    }

    best_index as u8
}

/// Maps RGB triples to escape tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorMapper {
    mode: ColorMode,
    background: bool,
}

impl ColorMapper {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            mode,
            background: false,
        }
    }

    /// Color the cell background instead of the glyph.
    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn background(&self) -> bool {
        self.background
    }

    /// Escape token for a color, or an empty string when color is off.
    pub fn token_for(&self, r: u8, g: u8, b: u8) -> String {
        let layer = if self.background { 48 } else { 38 };
        match self.mode {
            ColorMode::None => String::new(),
            ColorMode::TrueColor => format!("\x1b[{};2;{};{};{}m", layer, r, g, b),
            ColorMode::Indexed => format!("\x1b[{};5;{}m", layer, nearest_index(r, g, b)),
        }
    }

    /// Same as [`token_for`](Self::token_for) for untyped channel values.
    pub fn token_for_value(&self, r: i64, g: i64, b: i64) -> Result<String> {
        let r = checked_channel("red", r)?;
        let g = checked_channel("green", g)?;
        let b = checked_channel("blue", b)?;
        Ok(self.token_for(r, g, b))
    }

    /// Token that ends a styled cell, empty when color is off.
    pub fn reset_token(&self) -> &'static str {
        if self.mode.is_enabled() {
            RESET
        } else {
            ""
        }
    }
}
