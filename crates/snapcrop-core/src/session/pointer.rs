//! Pointer events delivered by the viewport host.

use crate::geometry::Point;

/// A pointer primitive in view-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// The gesture was taken over by the OS.
    Cancel,
}
