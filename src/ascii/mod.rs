//! Text-art renderer: turns a captured frame pair into a glyph grid.
//!
//! The pipeline has three stages:
//!
//! 1. **Luminance** - RGB to gray using BT.601 ([`to_luma`])
//! 2. **Quantization** - gray level to glyph ([`Quantizer`])
//! 3. **Coloring** - RGB to a terminal escape ([`ColorMapper`])
//!
//! [`Renderer`] walks both planes cell by cell and produces a [`GlyphGrid`].
//!
//! # Character Sets
//!
//! Multiple character sets are available via [`CharSet`]:
//! - `Standard` - 10-level ASCII density ramp
//! - `Blocks` - Unicode block characters
//! - `Minimal` - 4-level clean look

mod charset;
mod grayscale;
mod grid;
mod palette;

pub use charset::{
    glyph_index, CharSet, Quantizer, BLOCKS_CHARSET, MINIMAL_CHARSET, STANDARD_CHARSET,
};
pub use grayscale::{luminance, to_luma};
pub use grid::{Cell, GlyphGrid, RenderOptions, Renderer};
pub use palette::{nearest_index, ColorMapper, ColorMode, INDEXED_PALETTE, RESET};
