//! Renderer configuration and overlay style.
//!
//! Colours are straight-alpha RGBA in 0..1.

use serde::{Deserialize, Serialize};

/// Sampling used when the image is scaled into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

impl From<TextureFilter> for wgpu::FilterMode {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Linear => wgpu::FilterMode::Linear,
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

/// How the crop overlay is painted. Line widths are in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Fill of the area outside the crop rectangle.
    pub dim_color: [f32; 4],
    pub border_color: [f32; 4],
    pub border_width: f32,
    pub grid_color: [f32; 4],
    pub grid_width: f32,
    pub corner_color: [f32; 4],
    pub corner_width: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
        Self {
            // #66000000
            dim_color: [0.0, 0.0, 0.0, 0x66 as f32 / 255.0],
            border_color: WHITE,
            border_width: 3.0,
            // #80FFFFFF
            grid_color: [1.0, 1.0, 1.0, 0x80 as f32 / 255.0],
            grid_width: 2.0,
            corner_color: WHITE,
            corner_width: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    pub filter: TextureFilter,
    pub overlay: OverlayStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            filter: TextureFilter::Linear,
            overlay: OverlayStyle::default(),
        }
    }
}

impl RenderConfig {
    pub(crate) fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}
