//! Destructive raster transforms: quarter-turn rotation and pixel cropping.
//!
//! Both produce a new [`RasterImage`](crate::decode::RasterImage); the source
//! is left untouched so it can stay on the undo stack.

mod crop;
mod rotation;

pub use crop::crop_pixels;
pub use rotation::{rotate_90_cw, rotate_quarter_turns};
