//! RGB to luminance conversion using ITU-R BT.601 luminance formula.

use crate::camera::{LumaFrame, RgbFrame};

/// Luminance of one RGB pixel.
///
/// Y = 0.299*R + 0.587*G + 0.114*B, with coefficients scaled by 1000 so the
/// whole computation stays in integers.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    ((299 * r + 587 * g + 114 * b) / 1000) as u8
}

/// Derive the luminance plane of a color frame.
///
/// The result has exactly the same width and height, so the two frames
/// stay co-registered cell for cell.
pub fn to_luma(frame: &RgbFrame) -> LumaFrame {
    LumaFrame::map_rgb(frame, luminance)
}
