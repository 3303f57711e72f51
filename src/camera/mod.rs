//! Frame acquisition for capture sessions.
//!
//! This module provides:
//! - Frame types via [`RgbFrame`], [`LumaFrame`] and [`CapturedFrames`]
//! - Frame sources via the [`FrameSource`] trait ([`StillImageSource`], [`StaticFrameSource`])
//! - Settings via [`CaptureSettings`]

mod frame_utils;
mod source;
mod types;

pub use frame_utils::{
    is_valid_scale, mirror_horizontal, scaled_dimensions, BASE_FACTOR_X, BASE_FACTOR_Y, MAX_SCALE,
};
pub use source::{FrameSource, StaticFrameSource, StillImageSource};
pub use types::{
    check_same_shape, checked_channel, CaptureError, CaptureSettings, CapturedFrames, LumaFrame,
    PixelSample, RgbFrame, RGB_BYTES_PER_PIXEL,
};
