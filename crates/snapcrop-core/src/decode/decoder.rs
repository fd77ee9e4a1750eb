//! Still-image decoding with EXIF orientation handling.

use std::io::Cursor;
use std::time::Instant;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::downsample::{downsample, DecodeLimits};
use super::{DecodeError, Orientation, RasterImage};

/// Decode an encoded still image (JPEG, PNG, WebP) into an RGBA raster.
///
/// The image is downsampled by a power-of-two factor chosen from `limits`
/// and then rotated/flipped according to its EXIF orientation.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized.
/// Returns `DecodeError::CorruptedFile` if the data is truncated or corrupt.
pub fn decode_image(bytes: &[u8], limits: DecodeLimits) -> Result<RasterImage, DecodeError> {
    let started = Instant::now();
    let orientation = read_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let (src_w, src_h) = (img.width(), img.height());
    let sample = limits.sample_size_for(src_w, src_h);
    let rgba = downsample(img.into_rgba8(), sample);

    let oriented = apply_orientation(DynamicImage::ImageRgba8(rgba), orientation).into_rgba8();
    let image = RasterImage::from_rgba_image(oriented);

    tracing::debug!(
        src_w,
        src_h,
        sample,
        out_w = image.width(),
        out_h = image.height(),
        ?orientation,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "decoded image"
    );

    Ok(image)
}

/// Read the EXIF orientation of an encoded image.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
