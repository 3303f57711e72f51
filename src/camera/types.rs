//! Frame types and capture settings.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Number of bytes per pixel in an [`RgbFrame`].
pub const RGB_BYTES_PER_PIXEL: usize = 3;

/// A full-color frame, RGB, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbFrame {
    /// Wrap a raw RGB buffer.
    ///
    /// Fails with `MalformedFrame` if the buffer does not hold exactly
    /// `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * RGB_BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(Error::MalformedFrame {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a frame from untyped rows of `[r, g, b]` triples.
    ///
    /// Every row must have the same length and every channel must be in
    /// 0-255, otherwise `MalformedFrame` / `InvalidSample` is returned.
    pub fn try_from_rows(rows: &[Vec<[i64; 3]>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(width * height * RGB_BYTES_PER_PIXEL);

        for row in rows {
            if row.len() != width {
                return Err(Error::MalformedFrame {
                    expected: width,
                    actual: row.len(),
                });
            }
            for &[r, g, b] in row {
                data.push(checked_channel("red", r)?);
                data.push(checked_channel("green", g)?);
                data.push(checked_channel("blue", b)?);
            }
        }

        Self::new(width as u32, height as u32, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Color at (row, col). Panics if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> [u8; 3] {
        let i = (row * self.width as usize + col) * RGB_BYTES_PER_PIXEL;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// A luminance frame, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl LumaFrame {
    /// Wrap a raw luminance buffer.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::MalformedFrame {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Derive one byte per pixel of `color` with `f`, keeping its shape.
    pub(crate) fn map_rgb(color: &RgbFrame, f: impl Fn(u8, u8, u8) -> u8) -> Self {
        Self {
            data: color
                .data()
                .chunks_exact(RGB_BYTES_PER_PIXEL)
                .map(|px| f(px[0], px[1], px[2]))
                .collect(),
            width: color.width(),
            height: color.height(),
        }
    }

    /// Build a frame from untyped rows of luminance values.
    pub fn try_from_rows(rows: &[Vec<i64>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(width * height);

        for row in rows {
            if row.len() != width {
                return Err(Error::MalformedFrame {
                    expected: width,
                    actual: row.len(),
                });
            }
            for &v in row {
                data.push(checked_channel("luminance", v)?);
            }
        }

        Self::new(width as u32, height as u32, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Luminance at (row, col). Panics if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.width as usize + col]
    }

    /// Rows top-to-bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact(0) panics; an empty frame simply has no rows
        let width = (self.width as usize).max(1);
        self.data.chunks_exact(width)
    }
}

/// One grid cell: luminance plus the optional color it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSample {
    pub luminance: u8,
    pub color: Option<[u8; 3]>,
}

/// A co-registered full-color / luminance pair produced by one capture.
#[derive(Debug, Clone)]
pub struct CapturedFrames {
    pub color: RgbFrame,
    pub luma: LumaFrame,
}

impl CapturedFrames {
    /// Pair two frames, checking they share the same shape.
    pub fn new(color: RgbFrame, luma: LumaFrame) -> Result<Self> {
        check_same_shape(&color, &luma)?;
        Ok(Self { color, luma })
    }

    /// Sample at (row, col) from both planes.
    pub fn sample(&self, row: usize, col: usize) -> PixelSample {
        PixelSample {
            luminance: self.luma.get(row, col),
            color: Some(self.color.get(row, col)),
        }
    }
}

/// Fail with `DimensionMismatch` unless both frames have the same shape.
pub fn check_same_shape(color: &RgbFrame, luma: &LumaFrame) -> Result<()> {
    if color.width() != luma.width() || color.height() != luma.height() {
        return Err(Error::DimensionMismatch {
            expected_width: color.width(),
            expected_height: color.height(),
            actual_width: luma.width(),
            actual_height: luma.height(),
        });
    }
    Ok(())
}

/// Validate a raw channel value.
pub fn checked_channel(channel: &'static str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::InvalidSample { channel, value })
}

/// Settings for turning a still image into a frame pair.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Image file to read
    pub input: PathBuf,
    /// Size multiplier applied to the kiosk's base scale factors
    pub scale: f32,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
}

impl CaptureSettings {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            scale: 5.0,
            mirror: true, // Default to selfie mode
        }
    }
}

/// Errors that can occur while acquiring a frame.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Image '{0}' not found")]
    NotFound(PathBuf),

    #[error("Failed to decode image '{path}': {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Image '{0}' scales down to an empty frame")]
    Empty(PathBuf),

    #[error("Scale must be in (0, 100], got {0}")]
    InvalidScale(f32),

    #[error("Frame source is exhausted")]
    Exhausted,

    #[error(transparent)]
    Frame(#[from] Error),
}
