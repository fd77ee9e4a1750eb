//! Pixel-rectangle cropping.
//!
//! Crops are applied to the current raster in integer pixels produced by
//! [`crate::geometry::to_pixel_rect`], so no resampling happens here.

use crate::decode::RasterImage;
use crate::geometry::PixelRect;

/// Copy the pixels inside `rect` into a new image.
///
/// The rectangle is clamped to the image; the output is always at least
/// 1x1 pixels. A rectangle covering the whole image returns a cheap clone.
///
/// # Example
///
/// ```ignore
/// let cropped = crop_pixels(&image, PixelRect::new(75, 0, 250, 200));
/// assert_eq!(cropped.width(), 175);
/// ```
pub fn crop_pixels(image: &RasterImage, rect: PixelRect) -> RasterImage {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return image.clone();
    }

    // Fast path: full crop shares the pixel buffer
    if rect.left == 0 && rect.top == 0 && rect.right >= width && rect.bottom >= height {
        return image.clone();
    }

    let left = rect.left.min(width - 1);
    let top = rect.top.min(height - 1);
    let right = rect.right.clamp(left + 1, width);
    let bottom = rect.bottom.clamp(top + 1, height);

    let out_width = right - left;
    let out_height = bottom - top;

    let bpp = RasterImage::BYTES_PER_PIXEL;
    let src_stride = image.stride();
    let row_bytes = out_width as usize * bpp;
    let src = image.pixels();

    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    // Copy pixel data row by row
    for y in top..bottom {
        let start = y as usize * src_stride + left as usize * bpp;
        output.extend_from_slice(&src[start..start + row_bytes]);
    }

    RasterImage::new(out_width, out_height, output)
}
