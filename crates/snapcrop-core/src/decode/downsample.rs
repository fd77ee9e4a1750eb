//! Decode-time downsampling.
//!
//! Large sources are shrunk by a power-of-two sample size before they ever
//! reach the edit session, which bounds the memory held by every snapshot on
//! the undo/redo stacks.

use serde::{Deserialize, Serialize};

/// Requested upper bound for decoded dimensions.
///
/// The bound is a hint, not a hard cap: the sample size is the largest power
/// of two that keeps *both* halved dimensions at or above the request, so the
/// result can still exceed the bound by up to 2x on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodeLimits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl DecodeLimits {
    /// No downsampling.
    pub const UNLIMITED: DecodeLimits = DecodeLimits {
        max_width: None,
        max_height: None,
    };

    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: Some(max_width),
            max_height: Some(max_height),
        }
    }

    /// Sample size for a source of the given dimensions under these limits.
    pub fn sample_size_for(&self, width: u32, height: u32) -> u32 {
        sample_size(
            width,
            height,
            self.max_width.unwrap_or(u32::MAX),
            self.max_height.unwrap_or(u32::MAX),
        )
    }
}

/// Largest power-of-two divisor such that both halved dimensions, divided by
/// it, stay at or above the requested size.
pub fn sample_size(width: u32, height: u32, req_width: u32, req_height: u32) -> u32 {
    let mut sample = 1u32;

    if (height > req_height || width > req_width) && req_width > 0 && req_height > 0 {
        let half_height = height / 2;
        let half_width = width / 2;
        while half_height / sample >= req_height && half_width / sample >= req_width {
            sample = match sample.checked_mul(2) {
                Some(next) => next,
                None => break,
            };
        }
    }

    sample
}

/// Downsample an RGBA image by an integer factor using a triangle filter.
///
/// A factor of 0 or 1 returns the input unchanged.
pub fn downsample(img: image::RgbaImage, sample: u32) -> image::RgbaImage {
    if sample <= 1 {
        return img;
    }

    let (width, height) = img.dimensions();
    let new_width = (width / sample).max(1);
    let new_height = (height / sample).max(1);

    image::imageops::resize(
        &img,
        new_width,
        new_height,
        image::imageops::FilterType::Triangle,
    )
}
