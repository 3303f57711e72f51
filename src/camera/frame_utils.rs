//! Frame transformation utilities.

use super::types::{RgbFrame, RGB_BYTES_PER_PIXEL};

/// Horizontal base factor per unit of scale.
///
/// Terminal cells are roughly twice as tall as wide, so columns are sampled
/// almost twice as densely as rows.
pub const BASE_FACTOR_X: f32 = 0.045;

/// Vertical base factor per unit of scale.
pub const BASE_FACTOR_Y: f32 = 0.025;

/// Largest accepted scale.
pub const MAX_SCALE: f32 = 100.0;

/// Whether `scale` lies in (0, [`MAX_SCALE`]].
pub fn is_valid_scale(scale: f32) -> bool {
    scale > 0.0 && scale <= MAX_SCALE
}

/// Compute the grid size a `width`x`height` image is resized to.
///
/// Each axis is clamped to at least one cell so a non-empty image never
/// produces an empty grid.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let w = (width as f32 * BASE_FACTOR_X * scale).round() as u32;
    let h = (height as f32 * BASE_FACTOR_Y * scale).round() as u32;
    (w.max(1), h.max(1))
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut RgbFrame) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let bpp = RGB_BYTES_PER_PIXEL;
    let data = frame.data_mut();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut data[row_start..row_start + width * bpp];

        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_horizontal_2x1() {
        let mut frame = RgbFrame::new(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data(), &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_mirror_horizontal_odd_width_keeps_center() {
        let mut frame = RgbFrame::new(3, 1, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]).unwrap();
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data(), &[3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_mirror_horizontal_rows_independent() {
        let mut frame = RgbFrame::new(2, 2, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]).unwrap();
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data(), &[2, 2, 2, 1, 1, 1, 4, 4, 4, 3, 3, 3]);
    }

    #[test]
    fn test_scaled_dimensions_kiosk_default() {
        // 640x480 webcam image at scale 5
        let (w, h) = scaled_dimensions(640, 480, 5.0);
        assert_eq!(w, 144);
        assert_eq!(h, 60);
    }

    #[test]
    fn test_scaled_dimensions_never_empty() {
        assert_eq!(scaled_dimensions(1, 1, 1.0), (1, 1));
    }

    #[test]
    fn test_scaled_dimensions_empty_input() {
        assert_eq!(scaled_dimensions(0, 10, 5.0), (0, 0));
    }
}
