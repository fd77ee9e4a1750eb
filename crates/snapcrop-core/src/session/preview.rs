//! Hook through which the session drives a live preview.

use crate::decode::RasterImage;
use crate::geometry::Rect;

/// Receives every change the preview has to reflect.
///
/// Implementations must not block: the session calls these from its input
/// handling path.
pub trait PreviewSink: Send {
    /// The image on screen changed (new current or working image).
    fn show_image(&self, image: &RasterImage);

    /// The crop rectangle moved, or `None` when crop mode ended.
    fn show_crop(&self, crop: Option<Rect>);
}
