//! Quarter-turn rotation.

use crate::decode::RasterImage;

/// Rotate the image 90 degrees clockwise.
///
/// Width and height swap; the top-left source pixel ends up top-right.
pub fn rotate_90_cw(image: &RasterImage) -> RasterImage {
    rotate_quarter_turns(image, 1)
}

/// Rotate the image clockwise by `quarter_turns` x 90 degrees.
///
/// An empty image only has its dimensions swapped.
pub fn rotate_quarter_turns(image: &RasterImage, quarter_turns: u32) -> RasterImage {
    let turns = quarter_turns % 4;
    if turns == 0 {
        return image.clone();
    }

    let Some(src) = image.to_rgba_image().filter(|_| !image.is_empty()) else {
        return if turns % 2 == 1 {
            RasterImage::new(image.height(), image.width(), Vec::new())
        } else {
            image.clone()
        };
    };

    let rotated = match turns {
        1 => image::imageops::rotate90(&src),
        2 => image::imageops::rotate180(&src),
        _ => image::imageops::rotate270(&src),
    };
    RasterImage::from_rgba_image(rotated)
}
