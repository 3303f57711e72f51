//! Frame sources: where a capture session gets its pixels from.

use image::imageops::FilterType;

use super::frame_utils::{is_valid_scale, mirror_horizontal, scaled_dimensions};
use super::types::{CaptureError, CaptureSettings, CapturedFrames, LumaFrame, RgbFrame};
use crate::ascii::to_luma;
use crate::error;

/// Something that can hand out one co-registered frame pair per capture.
///
/// Implementations own whatever device handle they need and release it on
/// drop, so an aborted session never leaks it.
pub trait FrameSource {
    fn capture(&mut self) -> Result<CapturedFrames, CaptureError>;
}

/// Reads a still image from disk and shrinks it to a character grid.
#[derive(Debug, Clone)]
pub struct StillImageSource {
    settings: CaptureSettings,
}

impl StillImageSource {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }
}

impl FrameSource for StillImageSource {
    fn capture(&mut self) -> Result<CapturedFrames, CaptureError> {
        if !is_valid_scale(self.settings.scale) {
            return Err(CaptureError::InvalidScale(self.settings.scale));
        }
        let path = &self.settings.input;
        if !path.exists() {
            return Err(CaptureError::NotFound(path.clone()));
        }

        let decoded = image::open(path).map_err(|e| CaptureError::Decode {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let rgb = decoded.to_rgb8();

        let (width, height) = scaled_dimensions(rgb.width(), rgb.height(), self.settings.scale);
        if width == 0 || height == 0 {
            return Err(CaptureError::Empty(path.clone()));
        }
        log::debug!(
            "Resizing {}x{} image to {}x{} cells",
            rgb.width(),
            rgb.height(),
            width,
            height
        );

        let resized = image::imageops::resize(&rgb, width, height, FilterType::Triangle);
        let mut color = RgbFrame::new(width, height, resized.into_raw())?;
        if self.settings.mirror {
            mirror_horizontal(&mut color);
        }

        // Luminance comes from the same resized pixels, so both planes line up
        let luma = to_luma(&color);
        Ok(CapturedFrames::new(color, luma)?)
    }
}

/// Hands out the same frame pair every time.
#[derive(Debug, Clone)]
pub struct StaticFrameSource {
    frames: CapturedFrames,
}

impl StaticFrameSource {
    pub fn new(frames: CapturedFrames) -> Self {
        Self { frames }
    }

    /// Build a source from a color frame, deriving the luminance plane.
    pub fn from_color(color: RgbFrame) -> Self {
        let luma = to_luma(&color);
        Self {
            frames: CapturedFrames { color, luma },
        }
    }

    /// Build a source from a luminance frame alone; the color plane is gray.
    pub fn from_luma(luma: LumaFrame) -> error::Result<Self> {
        let data = luma.data().iter().flat_map(|&v| [v, v, v]).collect();
        let color = RgbFrame::new(luma.width(), luma.height(), data)?;
        Ok(Self {
            frames: CapturedFrames { color, luma },
        })
    }
}

impl FrameSource for StaticFrameSource {
    fn capture(&mut self) -> Result<CapturedFrames, CaptureError> {
        Ok(self.frames.clone())
    }
}
