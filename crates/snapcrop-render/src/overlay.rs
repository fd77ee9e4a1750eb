//! Tessellation of the crop overlay into coloured triangles.

use bytemuck::{Pod, Zeroable};
use snapcrop_core::geometry::{overlay_shapes, Rect, Segment};

use crate::config::OverlayStyle;

/// 4 dim regions + 4 border strips + 4 grid lines + 8 corner strokes.
pub const OVERLAY_QUADS: usize = 20;

/// Capacity of the overlay vertex buffer; every frame uses exactly this many.
pub const MAX_OVERLAY_VERTICES: usize = OVERLAY_QUADS * 6;

/// Position in viewport pixels plus straight-alpha colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Fill `out` with the triangles for `crop` drawn in a viewport of the given
/// size. `out` is cleared first so one buffer can be reused every frame.
pub fn build_overlay(
    crop: Rect,
    viewport_w: f32,
    viewport_h: f32,
    style: &OverlayStyle,
    out: &mut Vec<OverlayVertex>,
) {
    out.clear();
    let shapes = overlay_shapes(crop, viewport_w, viewport_h);

    for dim in shapes.dim {
        push_rect(out, dim, style.dim_color);
    }

    // Strips centered on the border edges; horizontal strips cover the corners
    let h = style.border_width / 2.0;
    let b = shapes.border;
    let strips = [
        Rect::new(b.left - h, b.top - h, b.right + h, b.top + h),
        Rect::new(b.left - h, b.bottom - h, b.right + h, b.bottom + h),
        Rect::new(b.left - h, b.top + h, b.left + h, b.bottom - h),
        Rect::new(b.right - h, b.top + h, b.right + h, b.bottom - h),
    ];
    for strip in strips {
        push_rect(out, strip, style.border_color);
    }

    for line in shapes.grid {
        push_segment(out, line, style.grid_width, style.grid_color);
    }
    for corner in shapes.corners {
        push_segment(out, corner, style.corner_width, style.corner_color);
    }
}

fn push_rect(out: &mut Vec<OverlayVertex>, r: Rect, color: [f32; 4]) {
    let tl = [r.left, r.top];
    let tr = [r.right, r.top];
    let bl = [r.left, r.bottom];
    let br = [r.right, r.bottom];
    push_quad(out, [tl, bl, tr, br], color);
}

/// A butt-capped stroke of `width` along `seg`.
fn push_segment(out: &mut Vec<OverlayVertex>, seg: Segment, width: f32, color: [f32; 4]) {
    let dx = seg.to.x - seg.from.x;
    let dy = seg.to.y - seg.from.y;
    let len = (dx * dx + dy * dy).sqrt();

    // Zero-length strokes still occupy their slot so the vertex count is fixed
    let (nx, ny) = if len > f32::EPSILON {
        (-dy / len * width / 2.0, dx / len * width / 2.0)
    } else {
        (0.0, 0.0)
    };

    let a = [seg.from.x + nx, seg.from.y + ny];
    let b = [seg.from.x - nx, seg.from.y - ny];
    let c = [seg.to.x + nx, seg.to.y + ny];
    let d = [seg.to.x - nx, seg.to.y - ny];
    push_quad(out, [a, b, c, d], color);
}

/// Two triangles from corners ordered as a triangle strip.
fn push_quad(out: &mut Vec<OverlayVertex>, [a, b, c, d]: [[f32; 2]; 4], color: [f32; 4]) {
    for position in [a, b, c, c, b, d] {
        out.push(OverlayVertex { position, color });
    }
}
