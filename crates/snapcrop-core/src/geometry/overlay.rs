//! Shapes of the crop overlay, in view-space.
//!
//! The renderer turns these into coloured triangles; keeping the layout here
//! lets it be tested without a GPU.

use super::rect::{Point, Rect};

/// Fraction of the crop rectangle's shorter side used for each corner mark.
pub const CORNER_LENGTH_FRACTION: f32 = 0.12;

/// A straight line between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    pub fn length(&self) -> f32 {
        let dx = self.to.x - self.from.x;
        let dy = self.to.y - self.from.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Everything the overlay draws for one crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayShapes {
    /// Dimmed regions outside the crop: top, bottom, left, right.
    pub dim: [Rect; 4],
    /// Outline of the crop rectangle.
    pub border: Rect,
    /// Rule-of-thirds lines: two vertical then two horizontal.
    pub grid: [Segment; 4],
    /// Two strokes per corner, clockwise from top-left.
    pub corners: [Segment; 8],
}

/// Lay out the overlay for `crop` inside a `viewport_w` x `viewport_h` view.
pub fn overlay_shapes(crop: Rect, viewport_w: f32, viewport_h: f32) -> OverlayShapes {
    let dim = [
        Rect::new(0.0, 0.0, viewport_w, crop.top),
        Rect::new(0.0, crop.bottom, viewport_w, viewport_h),
        Rect::new(0.0, crop.top, crop.left, crop.bottom),
        Rect::new(crop.right, crop.top, viewport_w, crop.bottom),
    ];

    let third_w = crop.width() / 3.0;
    let third_h = crop.height() / 3.0;
    let vline = |x: f32| Segment::new(Point::new(x, crop.top), Point::new(x, crop.bottom));
    let hline = |y: f32| Segment::new(Point::new(crop.left, y), Point::new(crop.right, y));
    let grid = [
        vline(crop.left + third_w),
        vline(crop.left + 2.0 * third_w),
        hline(crop.top + third_h),
        hline(crop.top + 2.0 * third_h),
    ];

    let len = crop.width().min(crop.height()) * CORNER_LENGTH_FRACTION;
    let (l, t, r, b) = (crop.left, crop.top, crop.right, crop.bottom);
    let seg = |x0: f32, y0: f32, x1: f32, y1: f32| Segment::new(Point::new(x0, y0), Point::new(x1, y1));
    let corners = [
        seg(l, t, l + len, t),
        seg(l, t, l, t + len),
        seg(r, t, r - len, t),
        seg(r, t, r, t + len),
        seg(r, b, r - len, b),
        seg(r, b, r, b - len),
        seg(l, b, l + len, b),
        seg(l, b, l, b - len),
    ];

    OverlayShapes {
        dim,
        border: crop,
        grid,
        corners,
    }
}
