//! Image decoding pipeline for snapcrop.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG and WebP sources into RGBA rasters
//! - Applying EXIF orientation
//! - Power-of-two downsampling to bound memory
//!
//! Decoding is synchronous; callers that must stay responsive run it through
//! [`crate::source::load_image`], which moves the work onto a blocking worker.

mod decoder;
mod downsample;
mod types;

pub use decoder::{decode_image, read_orientation};
pub use downsample::{downsample, sample_size, DecodeLimits};
pub use types::{DecodeError, Orientation, RasterImage};
