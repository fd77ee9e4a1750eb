//! Still-image encoding for export.
//!
//! JPEG output drops the alpha channel (the editor only ever produces opaque
//! images from camera/gallery sources); PNG keeps it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::RasterImage;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the data
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Target encoding for an exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossy JPEG with quality 1-100.
    Jpeg { quality: u8 },
    /// Lossless PNG.
    Png,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg { .. } => "jpg",
            ExportFormat::Png => "png",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpeg { .. } => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::Jpeg { quality: 95 }
    }
}

/// Encode a raster image in the requested format.
///
/// # Quality Guidelines (JPEG)
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 80-90: Good quality, recommended for most uses
/// * Below 60: Low quality, visible artifacts
pub fn encode_image(image: &RasterImage, format: ExportFormat) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * RasterImage::BYTES_PER_PIXEL;
    if image.pixels().len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels().len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());

    match format {
        ExportFormat::Jpeg { quality } => {
            let rgb = strip_alpha(image.pixels());
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
        ExportFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(image.pixels(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
    }

    Ok(buffer.into_inner())
}

fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Encoding always produces valid JPEG when given valid input.
        #[test]
        fn prop_valid_input_produces_valid_jpeg(
            (width, height) in (1u32..=40, 1u32..=40),
            quality in 1u8..=100,
        ) {
            let img = RasterImage::filled(width, height, [100, 150, 200, 255]);
            let bytes = encode_image(&img, ExportFormat::Jpeg { quality }).unwrap();

            prop_assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
            let len = bytes.len();
            prop_assert_eq!(&bytes[len - 2..], &[0xFF, 0xD9]);
        }

        /// Property: Encoded JPEG decodes back to the same dimensions.
        #[test]
        fn prop_jpeg_dimensions_preserved(
            (width, height) in (1u32..=40, 1u32..=40),
        ) {
            let img = RasterImage::filled(width, height, [10, 20, 30, 255]);
            let bytes = encode_image(&img, ExportFormat::default()).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();

            prop_assert_eq!(decoded.width(), width);
            prop_assert_eq!(decoded.height(), height);
        }
    }
}
