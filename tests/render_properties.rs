//! Property tests for the quantizer, the color mapper and the frame renderer.
//!
//! These tests cover:
//! - Monotonic glyph density over the whole luminance range
//! - Grid shape and determinism
//! - Dimension mismatch handling
//! - Single-pixel end-to-end renders

use pyxpic::ascii::*;
use pyxpic::camera::{LumaFrame, RgbFrame};
use pyxpic::Error;

fn density(charset: CharSet, glyph: char) -> usize {
    charset
        .chars()
        .iter()
        .position(|&c| c == glyph)
        .expect("glyph belongs to the alphabet")
}

fn gradient_pair(width: u32, height: u32) -> (RgbFrame, LumaFrame) {
    let mut color = Vec::new();
    let mut luma = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 37 + y * 91) % 256) as u8;
            color.extend_from_slice(&[v, 255 - v, v / 2]);
            luma.push(v);
        }
    }
    (
        RgbFrame::new(width, height, color).unwrap(),
        LumaFrame::new(width, height, luma).unwrap(),
    )
}

// ==================== Quantizer ====================

#[test]
fn test_glyph_density_is_monotonic() {
    for charset in [CharSet::Standard, CharSet::Blocks, CharSet::Minimal] {
        let quantizer = Quantizer::new(charset);
        let mut previous = 0;
        for v in 0..=255u8 {
            let d = density(charset, quantizer.glyph_for(v));
            assert!(d >= previous, "{:?} density dropped at {}", charset, v);
            previous = d;
        }
        assert_eq!(quantizer.glyph_for(0), quantizer.lightest());
        assert_eq!(quantizer.glyph_for(255), quantizer.densest());
    }
}

#[test]
fn test_glyph_for_value_rejects_out_of_range() {
    let quantizer = Quantizer::default();
    assert!(matches!(
        quantizer.glyph_for_value(-1),
        Err(Error::InvalidSample { value: -1, .. })
    ));
    assert!(matches!(
        quantizer.glyph_for_value(256),
        Err(Error::InvalidSample { value: 256, .. })
    ));
    assert_eq!(quantizer.glyph_for_value(255).unwrap(), '@');
}

// ==================== Color Mapper ====================

#[test]
fn test_truecolor_token_carries_triple() {
    let mapper = ColorMapper::new(ColorMode::TrueColor);
    assert_eq!(mapper.token_for(12, 34, 56), "\x1b[38;2;12;34;56m");

    let mapper = mapper.with_background(true);
    assert_eq!(mapper.token_for(12, 34, 56), "\x1b[48;2;12;34;56m");
}

#[test]
fn test_indexed_token_uses_palette_entry() {
    let mapper = ColorMapper::new(ColorMode::Indexed);
    let token = mapper.token_for(255, 0, 0);
    assert_eq!(token, "\x1b[38;5;9m");
}

#[test]
fn test_every_palette_entry_maps_to_itself_or_earlier_twin() {
    for (i, [r, g, b]) in INDEXED_PALETTE.iter().enumerate() {
        let found = nearest_index(*r, *g, *b) as usize;
        assert!(found <= i);
        assert_eq!(INDEXED_PALETTE[found], [*r, *g, *b]);
    }
}

// ==================== Renderer ====================

#[test]
fn test_render_shape_and_determinism() {
    for (width, height) in [(1, 1), (7, 3), (40, 12)] {
        let (color, luma) = gradient_pair(width, height);
        for colorize in [false, true] {
            let renderer = Renderer::new(RenderOptions {
                color: ColorMode::Indexed,
                ..Default::default()
            });
            let first = renderer.render(&color, &luma, colorize).unwrap();
            let second = renderer.render(&color, &luma, colorize).unwrap();

            assert_eq!(first.height(), height as usize);
            assert!(first.rows().iter().all(|row| row.len() == width as usize));
            assert_eq!(first.to_string(), second.to_string());

            let text = first.to_string();
            assert_eq!(text.lines().count(), height as usize);
            assert!(text.ends_with('\n'));
            assert!(!text.ends_with("\n\n"));
        }
    }
}

#[test]
fn test_colorized_cells_end_with_reset() {
    let (color, luma) = gradient_pair(4, 2);
    let grid = Renderer::default().render(&color, &luma, true).unwrap();
    for row in grid.rows() {
        for cell in row {
            let token = cell.token();
            assert!(token.starts_with("\x1b[38;2;"));
            assert!(token.ends_with(RESET));
        }
    }
}

#[test]
fn test_render_mismatch_fails() {
    let (color, _) = gradient_pair(4, 3);
    let (_, luma) = gradient_pair(3, 4);
    let result = Renderer::default().render(&color, &luma, false);
    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            expected_width: 4,
            expected_height: 3,
            actual_width: 3,
            actual_height: 4,
        })
    ));
}

#[test]
fn test_single_black_pixel_is_lightest_glyph() {
    let color = RgbFrame::new(1, 1, vec![0, 0, 0]).unwrap();
    let luma = LumaFrame::new(1, 1, vec![0]).unwrap();
    let grid = Renderer::default().render(&color, &luma, false).unwrap();
    assert_eq!(grid.to_string(), " \n");
}

#[test]
fn test_single_white_pixel_is_densest_glyph() {
    let color = RgbFrame::new(1, 1, vec![255, 255, 255]).unwrap();
    let luma = LumaFrame::new(1, 1, vec![255]).unwrap();
    let grid = Renderer::default().render(&color, &luma, false).unwrap();
    assert_eq!(grid.to_string(), "@\n");
}

#[test]
fn test_rows_with_out_of_range_samples_are_rejected() {
    let result = LumaFrame::try_from_rows(&[vec![0, 300]]);
    assert!(matches!(result, Err(Error::InvalidSample { value: 300, .. })));

    let result = RgbFrame::try_from_rows(&[vec![[0, -5, 0]]]);
    assert!(matches!(result, Err(Error::InvalidSample { value: -5, .. })));
}
