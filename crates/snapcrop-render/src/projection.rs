//! Letterbox projection for the image quad.
//!
//! The image is drawn as the NDC unit square (-1..1 on both axes) scaled
//! non-uniformly so it aspect-fits the viewport: the longer relative side
//! fills the viewport and the other axis shrinks.

/// Per-axis scale of the unit quad, `(x, y)`.
///
/// Degenerate sizes give `(1.0, 1.0)`.
pub fn fit_scale(viewport_w: f32, viewport_h: f32, image_w: f32, image_h: f32) -> (f32, f32) {
    if !(viewport_w > 0.0 && viewport_h > 0.0 && image_w > 0.0 && image_h > 0.0) {
        return (1.0, 1.0);
    }

    let view_ratio = viewport_w / viewport_h;
    let image_ratio = image_w / image_h;

    if image_ratio > view_ratio {
        // Width fills, height shrinks
        (1.0, view_ratio / image_ratio)
    } else {
        (image_ratio / view_ratio, 1.0)
    }
}

/// Column-major 4x4 projection matrix for the image quad.
pub fn projection_matrix(viewport_w: f32, viewport_h: f32, image_w: f32, image_h: f32) -> [[f32; 4]; 4] {
    let (sx, sy) = fit_scale(viewport_w, viewport_h, image_w, image_h);
    [
        [sx, 0.0, 0.0, 0.0],
        [0.0, sy, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}
