//! Frame rendering into a glyph grid.

use std::fmt;

use super::charset::{CharSet, Quantizer};
use super::palette::{ColorMapper, ColorMode, RESET};
use crate::camera::{check_same_shape, CapturedFrames, LumaFrame, RgbFrame};
use crate::error::Result;

/// One rendered cell: a glyph and the color escape that styles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    /// Color escape; `None` for monochrome cells
    pub color: Option<String>,
}

impl Cell {
    pub fn plain(glyph: char) -> Self {
        Self { glyph, color: None }
    }

    /// The cell as printed: `color + glyph + reset`, or just the glyph.
    pub fn token(&self) -> String {
        match &self.color {
            Some(color) => format!("{}{}{}", color, self.glyph, RESET),
            None => self.glyph.to_string(),
        }
    }

    /// Parse a printed cell back. Returns `None` for anything `token` never emits.
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(styled) = token.strip_suffix(RESET) {
            if !styled.starts_with('\x1b') {
                return None;
            }
            let end = styled.find('m')?;
            let (color, glyph) = styled.split_at(end + 1);
            let glyph = single_char(glyph)?;
            return Some(Self {
                glyph,
                color: Some(color.to_string()),
            });
        }
        single_char(token).map(Cell::plain)
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

/// The rendered text-art for one capture. Rows top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphGrid {
    rows: Vec<Vec<Cell>>,
}

impl GlyphGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Per-cell tokens, row by row, as they are persisted.
    pub fn to_tokens(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Cell::token).collect())
            .collect()
    }

    /// Rebuild a grid from persisted tokens.
    pub fn from_tokens(rows: &[Vec<String>]) -> Option<Self> {
        rows.iter()
            .map(|row| row.iter().map(|t| Cell::from_token(t)).collect::<Option<Vec<_>>>())
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }
}

impl fmt::Display for GlyphGrid {
    /// Every row is newline-terminated, nothing follows the last one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for cell in row {
                write!(f, "{}", cell.token())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Options shared by every render of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub charset: CharSet,
    pub invert: bool,
    pub color: ColorMode,
    pub background: bool,
}

/// Walks a color frame and its luminance frame into a [`GlyphGrid`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    quantizer: Quantizer,
    mapper: ColorMapper,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            quantizer: Quantizer::new(options.charset).with_invert(options.invert),
            mapper: ColorMapper::new(options.color).with_background(options.background),
        }
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    /// Render a frame pair.
    ///
    /// Both frames must have the same width and height, otherwise
    /// `DimensionMismatch` is returned before any cell is rendered. With
    /// `colorize` each glyph is wrapped in its color escape and a reset;
    /// when the configured mode is `None` true-color escapes are used.
    pub fn render(&self, color: &RgbFrame, luma: &LumaFrame, colorize: bool) -> Result<GlyphGrid> {
        check_same_shape(color, luma)?;

        let mapper = match (colorize, self.mapper.mode()) {
            (false, _) => None,
            (true, ColorMode::None) => Some(
                ColorMapper::new(ColorMode::TrueColor).with_background(self.mapper.background()),
            ),
            (true, _) => Some(self.mapper),
        };

        let width = luma.width() as usize;
        let height = luma.height() as usize;
        let mut rows = Vec::with_capacity(height);

        for i in 0..height {
            let mut row = Vec::with_capacity(width);
            for j in 0..width {
                let glyph = self.quantizer.glyph_for(luma.get(i, j));
                let cell = match &mapper {
                    Some(mapper) => {
                        let [r, g, b] = color.get(i, j);
                        Cell {
                            glyph,
                            color: Some(mapper.token_for(r, g, b)),
                        }
                    }
                    None => Cell::plain(glyph),
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(GlyphGrid::new(rows))
    }

    /// Render a captured pair, colorizing when the configured mode has color.
    pub fn render_frames(&self, frames: &CapturedFrames) -> Result<GlyphGrid> {
        self.render(&frames.color, &frames.luma, self.mapper.mode().is_enabled())
    }
}
