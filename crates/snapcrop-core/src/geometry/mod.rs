//! View-space geometry for the crop tool.
//!
//! This module handles:
//! - Fitting the image into the viewport
//! - Aspect-ratio locking, dragging and corner resizing of the crop rectangle
//! - Mapping view-space rectangles into image pixels
//! - Laying out the overlay drawn on top of the preview

mod aspect;
mod crop;
mod overlay;
mod rect;

pub use aspect::{AspectPreset, ParseAspectError};
pub use crop::{
    apply_aspect_lock, begin_interaction, drag, fit_bounds, resize, to_pixel_rect, to_relative,
    GeometryError, Interaction, DEFAULT_MIN_CROP_SIZE, DEFAULT_RESIZE_HANDLE_SIZE,
};
pub use overlay::{overlay_shapes, OverlayShapes, Segment, CORNER_LENGTH_FRACTION};
pub use rect::{PixelRect, Point, Rect, RelativeRect};
