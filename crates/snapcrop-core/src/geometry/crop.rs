//! Crop-rectangle geometry.
//!
//! Every function here is pure: it takes the current rectangle (and the
//! image bounds it must stay within) and returns a new value. The edit
//! session keeps the latest value; nothing is mutated in place.
//!
//! # Coordinate System
//!
//! - View-space: pixels of the on-screen viewport, origin top-left, y down
//! - Relative: fractions (0.0 to 1.0) of the displayed image bounds
//! - Image-pixel-space: integer pixels of the source raster

use thiserror::Error;

use super::rect::{PixelRect, Point, Rect, RelativeRect};

/// Smallest crop side length, in view-space pixels.
pub const DEFAULT_MIN_CROP_SIZE: f32 = 120.0;

/// Half-extent of the square touch target around the bottom-right corner.
pub const DEFAULT_RESIZE_HANDLE_SIZE: f32 = 60.0;

/// Errors raised when crossing from view-space into image-pixel-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The relative rectangle collapses to nothing under pixel rounding.
    #[error("Crop region is too small")]
    CropTooSmall,
}

/// Pointer interaction with the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving the whole rectangle; `last` is the previous pointer position.
    Dragging { last: Point },
    /// Moving the bottom-right corner; `last` is the previous pointer position.
    Resizing { last: Point },
}

impl Interaction {
    pub fn is_active(&self) -> bool {
        !matches!(self, Interaction::Idle)
    }
}

/// Aspect-fit an image of `image_w` x `image_h` into the viewport, centered.
///
/// Degenerate inputs (any non-positive dimension) yield an empty rectangle
/// at the origin.
pub fn fit_bounds(viewport_w: f32, viewport_h: f32, image_w: f32, image_h: f32) -> Rect {
    if !(viewport_w > 0.0 && viewport_h > 0.0 && image_w > 0.0 && image_h > 0.0) {
        return Rect::default();
    }

    let scale = (viewport_w / image_w).min(viewport_h / image_h);
    let drawn_w = (image_w * scale).min(viewport_w);
    let drawn_h = (image_h * scale).min(viewport_h);

    let left = (viewport_w - drawn_w) / 2.0;
    let top = (viewport_h - drawn_h) / 2.0;

    Rect::new(left, top, left + drawn_w, top + drawn_h)
}

/// Largest rectangle of the given width/height ratio centered inside `bounds`.
///
/// `None` (free aspect) returns `bounds` unchanged, as does a ratio that is
/// not a positive finite number or bounds without area.
pub fn apply_aspect_lock(bounds: Rect, ratio: Option<f32>) -> Rect {
    let Some(ratio) = valid_ratio(ratio) else {
        return bounds;
    };
    if bounds.is_empty() {
        return bounds;
    }

    let bw = bounds.width();
    let bh = bounds.height();
    let bounds_ratio = bw / bh;

    if bounds_ratio > ratio {
        // Wider than the target: trim left and right
        let target_width = bh * ratio;
        let left = bounds.center_x() - target_width / 2.0;
        Rect::new(left, bounds.top, left + target_width, bounds.bottom)
    } else {
        // Taller than the target: trim top and bottom
        let target_height = bw / ratio;
        let top = bounds.center_y() - target_height / 2.0;
        Rect::new(bounds.left, top, bounds.right, top + target_height)
    }
}

/// Classify a pointer-down against the crop rectangle.
///
/// The resize handle is a square of side `2 * handle_size` centered on the
/// bottom-right corner and wins over dragging where the two overlap.
pub fn begin_interaction(pointer: Point, rect: Rect, handle_size: f32) -> Interaction {
    if in_resize_handle(pointer, rect, handle_size) {
        Interaction::Resizing { last: pointer }
    } else if rect.contains(pointer) {
        Interaction::Dragging { last: pointer }
    } else {
        Interaction::Idle
    }
}

fn in_resize_handle(p: Point, rect: Rect, handle_size: f32) -> bool {
    p.x >= rect.right - handle_size
        && p.x <= rect.right + handle_size
        && p.y >= rect.bottom - handle_size
        && p.y <= rect.bottom + handle_size
}

/// Translate the rectangle by `(dx, dy)`, clamped so it stays inside `bounds`.
///
/// Size is never changed: an offending edge is pinned to the bound and the
/// opposite edge is re-derived from the fixed width/height. Edges are stored,
/// not sizes, so `width()`/`height()` of the result can differ from the input
/// by float rounding (a few ulps of the largest coordinate), never more.
pub fn drag(rect: Rect, bounds: Rect, dx: f32, dy: f32) -> Rect {
    let w = rect.width();
    let h = rect.height();

    let mut left = rect.left + dx;
    let mut top = rect.top + dy;
    let mut right = rect.right + dx;
    let mut bottom = rect.bottom + dy;

    if left < bounds.left {
        left = bounds.left;
        right = left + w;
    }
    if right > bounds.right {
        right = bounds.right;
        left = right - w;
    }
    if top < bounds.top {
        top = bounds.top;
        bottom = top + h;
    }
    if bottom > bounds.bottom {
        bottom = bounds.bottom;
        top = bottom - h;
    }

    Rect::new(left, top, right, bottom)
}

/// Move the bottom-right corner toward `pointer` with the top-left pinned.
///
/// With a ratio the width drives the height; if the result overflows the
/// bottom bound the height is pinned instead, then the width again if the
/// right bound overflows. A result smaller than `min_size` on either side,
/// or bounds too small to hold `min_size` from the pinned corner, leaves
/// the rectangle unchanged.
pub fn resize(rect: Rect, bounds: Rect, pointer: Point, ratio: Option<f32>, min_size: f32) -> Rect {
    let (left, top) = (rect.left, rect.top);
    let min_right = left + min_size;
    let min_bottom = top + min_size;

    if !(pointer.x.is_finite() && pointer.y.is_finite())
        || min_right > bounds.right
        || min_bottom > bounds.bottom
    {
        return rect;
    }

    let right = pointer.x.clamp(min_right, bounds.right);
    let bottom = pointer.y.clamp(min_bottom, bounds.bottom);

    let Some(ratio) = valid_ratio(ratio) else {
        return Rect::new(left, top, right, bottom);
    };

    let mut width = right - left;
    let mut height = width / ratio;

    if top + height > bounds.bottom {
        height = bounds.bottom - top;
        width = height * ratio;
    }
    if left + width > bounds.right {
        width = bounds.right - left;
        height = width / ratio;
    }

    if width < min_size || height < min_size {
        return rect;
    }

    Rect::new(
        left,
        top,
        (left + width).min(bounds.right),
        (top + height).min(bounds.bottom),
    )
}

/// Express `rect` as fractions of `bounds`, each component clamped to 0..1.
///
/// Bounds without area map to an all-zero (collapsed) rectangle.
pub fn to_relative(rect: Rect, bounds: Rect) -> RelativeRect {
    let bw = bounds.width();
    let bh = bounds.height();
    if !(bw > 0.0 && bh > 0.0) {
        return RelativeRect::default();
    }

    let left = (rect.left - bounds.left) / bw;
    let top = (rect.top - bounds.top) / bh;
    let right = (rect.right - bounds.left) / bw;
    let bottom = (rect.bottom - bounds.top) / bh;

    RelativeRect::new(
        left.clamp(0.0, 1.0),
        top.clamp(0.0, 1.0),
        right.clamp(0.0, 1.0),
        bottom.clamp(0.0, 1.0),
    )
}

/// Convert a relative rectangle into integer pixels of an `image_w` x `image_h`
/// raster.
///
/// The result always has width and height of at least one pixel and lies
/// inside the image.
///
/// # Errors
///
/// Returns [`GeometryError::CropTooSmall`] when the image is empty or the
/// relative rectangle is non-finite or collapsed (`right <= left` or
/// `bottom <= top`).
pub fn to_pixel_rect(rel: RelativeRect, image_w: u32, image_h: u32) -> Result<PixelRect, GeometryError> {
    if image_w == 0 || image_h == 0 || !rel.is_finite() || rel.right <= rel.left || rel.bottom <= rel.top {
        return Err(GeometryError::CropTooSmall);
    }

    let (left, right) = pixel_span(rel.left, rel.right, image_w);
    let (top, bottom) = pixel_span(rel.top, rel.bottom, image_h);

    let px = PixelRect::new(left, top, right, bottom);
    if px.width() == 0 || px.height() == 0 {
        return Err(GeometryError::CropTooSmall);
    }
    Ok(px)
}

/// Round a relative span onto `0..=extent`, keeping at least one pixel.
fn pixel_span(start: f32, end: f32, extent: u32) -> (u32, u32) {
    let max = extent as i64;
    let lo = ((start as f64) * extent as f64).round() as i64;
    let lo = lo.clamp(0, max - 1);
    let hi = ((end as f64) * extent as f64).round() as i64;
    let hi = hi.clamp(lo + 1, max);
    (lo as u32, hi as u32)
}

fn valid_ratio(ratio: Option<f32>) -> Option<f32> {
    ratio.filter(|r| r.is_finite() && *r > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    /// Rounding slack for a size recomputed from translated edges: a few ulps
    /// of the largest coordinate involved.
    pub(super) fn size_tolerance(rects: &[Rect]) -> f32 {
        let magnitude = rects
            .iter()
            .flat_map(|r| [r.left, r.top, r.right, r.bottom])
            .fold(1.0f32, |m, v| m.max(v.abs()));
        4.0 * f32::EPSILON * magnitude
    }

    #[test]
    fn test_fit_bounds_wide_image() {
        // 300x200 into 300x600: scale 1, centered vertically
        let b = fit_bounds(300.0, 600.0, 300.0, 200.0);
        assert_eq!(b, Rect::new(0.0, 200.0, 300.0, 400.0));
    }

    #[test]
    fn test_fit_bounds_tall_image() {
        let b = fit_bounds(600.0, 300.0, 200.0, 300.0);
        assert_eq!(b, Rect::new(200.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn test_fit_bounds_degenerate() {
        assert_eq!(fit_bounds(0.0, 100.0, 10.0, 10.0), Rect::default());
        assert_eq!(fit_bounds(100.0, 100.0, 0.0, 10.0), Rect::default());
    }

    #[test]
    fn test_fit_bounds_after_rotation_swaps_aspect() {
        let before = fit_bounds(400.0, 400.0, 300.0, 200.0);
        let after = fit_bounds(400.0, 400.0, 200.0, 300.0);

        assert!(approx(before.width() / before.height(), 1.5));
        assert!(approx(after.width() / after.height(), 200.0 / 300.0));
    }

    #[test]
    fn test_aspect_lock_square_on_wide_bounds() {
        let r = apply_aspect_lock(Rect::from_size(300.0, 200.0), Some(1.0));
        assert_eq!(r, Rect::new(50.0, 0.0, 250.0, 200.0));
    }

    #[test]
    fn test_aspect_lock_trims_top_bottom() {
        let r = apply_aspect_lock(Rect::from_size(300.0, 200.0), Some(3.0));
        assert!(approx(r.left, 0.0) && approx(r.right, 300.0));
        assert!(approx(r.top, 50.0) && approx(r.bottom, 150.0));
    }

    #[test]
    fn test_aspect_lock_free_and_invalid() {
        let b = Rect::new(10.0, 10.0, 50.0, 90.0);
        assert_eq!(apply_aspect_lock(b, None), b);
        assert_eq!(apply_aspect_lock(b, Some(0.0)), b);
        assert_eq!(apply_aspect_lock(b, Some(f32::NAN)), b);
    }

    #[test]
    fn test_begin_interaction_classification() {
        let rect = Rect::new(100.0, 100.0, 300.0, 300.0);

        assert!(matches!(
            begin_interaction(Point::new(290.0, 290.0), rect, 60.0),
            Interaction::Resizing { .. }
        ));
        // Outside the rect but within the handle tolerance
        assert!(matches!(
            begin_interaction(Point::new(350.0, 350.0), rect, 60.0),
            Interaction::Resizing { .. }
        ));
        assert!(matches!(
            begin_interaction(Point::new(150.0, 150.0), rect, 60.0),
            Interaction::Dragging { .. }
        ));
        assert_eq!(begin_interaction(Point::new(10.0, 10.0), rect, 60.0), Interaction::Idle);
    }

    #[test]
    fn test_drag_clamps_to_bounds() {
        let bounds = Rect::from_size(300.0, 200.0);
        let rect = Rect::new(50.0, 50.0, 150.0, 150.0);

        assert_eq!(drag(rect, bounds, -100.0, 0.0), Rect::new(0.0, 50.0, 100.0, 150.0));
        assert_eq!(drag(rect, bounds, 500.0, 500.0), Rect::new(200.0, 100.0, 300.0, 200.0));
        assert_eq!(drag(rect, bounds, 10.0, -5.0), Rect::new(60.0, 45.0, 160.0, 145.0));
    }

    #[test]
    fn test_drag_size_error_is_rounding_only() {
        let bounds = Rect::new(37.3, 91.7, 1017.9, 813.1);
        let rect = Rect::new(100.17, 200.33, 333.91, 517.77);

        for i in 0..2000u32 {
            let dx = (i * 37 % 2000) as f32 * 0.731 - 700.0;
            let dy = (i * 53 % 1500) as f32 * 0.619 - 450.0;
            let moved = drag(rect, bounds, dx, dy);
            let tol = size_tolerance(&[rect, bounds, moved]);

            assert!((moved.width() - rect.width()).abs() <= tol, "width drifted at step {i}");
            assert!((moved.height() - rect.height()).abs() <= tol, "height drifted at step {i}");
            assert!(bounds.contains_rect(&moved), "left bounds at step {i}");
        }
    }

    #[test]
    fn test_resize_clamps_to_bounds() {
        let bounds = Rect::from_size(300.0, 200.0);
        let rect = Rect::new(0.0, 0.0, 150.0, 150.0);

        let r = resize(rect, bounds, Point::new(310.0, 210.0), None, 120.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn test_resize_respects_min_size() {
        let bounds = Rect::from_size(300.0, 200.0);
        let rect = Rect::new(0.0, 0.0, 200.0, 200.0);

        let r = resize(rect, bounds, Point::new(10.0, 10.0), None, 120.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 120.0, 120.0));
    }

    #[test]
    fn test_resize_with_ratio_pins_height() {
        let bounds = Rect::from_size(300.0, 200.0);
        let rect = Rect::new(0.0, 0.0, 150.0, 150.0);

        // width 300 -> height 300 overflows, so height = 200, width = 200
        let r = resize(rect, bounds, Point::new(300.0, 50.0), Some(1.0), 120.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_resize_with_ratio_rejected_when_no_room() {
        let bounds = Rect::from_size(300.0, 200.0);
        let rect = Rect::new(100.0, 60.0, 250.0, 190.0);

        // 200px of width remain, so a 16:9 box is only 112.5 tall
        let r = resize(rect, bounds, Point::new(300.0, 200.0), Some(16.0 / 9.0), 120.0);
        assert_eq!(r, rect);
    }

    #[test]
    fn test_resize_rejected_when_bounds_too_small() {
        let bounds = Rect::from_size(300.0, 200.0);
        let rect = Rect::new(200.0, 0.0, 300.0, 130.0);

        let r = resize(rect, bounds, Point::new(300.0, 200.0), None, 120.0);
        assert_eq!(r, rect);
    }

    #[test]
    fn test_to_relative() {
        let bounds = Rect::new(0.0, 100.0, 300.0, 300.0);
        let rel = to_relative(Rect::new(75.0, 100.0, 250.0, 300.0), bounds);

        assert!(approx(rel.left, 0.25));
        assert!(approx(rel.top, 0.0));
        assert!(approx(rel.right, 0.8333));
        assert!(approx(rel.bottom, 1.0));
    }

    #[test]
    fn test_to_relative_clamps() {
        let bounds = Rect::from_size(100.0, 100.0);
        let rel = to_relative(Rect::new(-10.0, -10.0, 110.0, 50.0), bounds);
        assert_eq!(rel, RelativeRect::new(0.0, 0.0, 1.0, 0.5));
    }

    #[test]
    fn test_to_relative_degenerate_bounds() {
        let rel = to_relative(Rect::from_size(10.0, 10.0), Rect::default());
        assert_eq!(rel, RelativeRect::default());
    }

    #[test]
    fn test_to_pixel_rect_scenario() {
        let px = to_pixel_rect(RelativeRect::new(0.25, 0.0, 0.8333, 1.0), 300, 200).unwrap();
        assert_eq!(px, PixelRect::new(75, 0, 250, 200));
    }

    #[test]
    fn test_to_pixel_rect_keeps_one_pixel() {
        let px = to_pixel_rect(RelativeRect::new(0.5, 0.5, 0.5001, 0.5001), 300, 200).unwrap();
        assert_eq!(px.width(), 1);
        assert_eq!(px.height(), 1);

        let edge = to_pixel_rect(RelativeRect::new(0.999, 0.999, 1.0, 1.0), 300, 200).unwrap();
        assert_eq!(edge, PixelRect::new(299, 199, 300, 200));
    }

    #[test]
    fn test_to_pixel_rect_collapsed() {
        assert_eq!(
            to_pixel_rect(RelativeRect::default(), 300, 200),
            Err(GeometryError::CropTooSmall)
        );
        assert_eq!(
            to_pixel_rect(RelativeRect::FULL, 0, 200),
            Err(GeometryError::CropTooSmall)
        );
        assert_eq!(
            to_pixel_rect(RelativeRect::new(f32::NAN, 0.0, 1.0, 1.0), 10, 10),
            Err(GeometryError::CropTooSmall)
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
