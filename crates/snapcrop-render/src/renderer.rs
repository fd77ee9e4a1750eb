//! Preview renderer: letterboxed image quad plus crop overlay.
//!
//! Rendering is on demand: nothing is drawn unless `render_frame` is called.
//! The image to show arrives through a single pending slot that any thread
//! may write; the render thread drains it at the start of each frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use snapcrop_core::geometry::Rect;
use snapcrop_core::RasterImage;
use wgpu::util::DeviceExt;

use crate::config::RenderConfig;
use crate::context::GpuContext;
use crate::error::RenderError;
use crate::overlay::{build_overlay, OverlayVertex, MAX_OVERLAY_VERTICES};
use crate::pending::PendingSlot;
use crate::projection::projection_matrix;
use crate::shaders::{IMAGE_SHADER, OVERLAY_SHADER};
use crate::texture::ImageTexture;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ImageUniforms {
    projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct OverlayUniforms {
    viewport_size: [f32; 2],
    _pad: [f32; 2],
}

/// Counters shared with handles on other threads.
#[derive(Debug, Default)]
pub struct RenderStats {
    frames: AtomicU64,
    uploads: AtomicU64,
    texture_allocations: AtomicU64,
}

impl RenderStats {
    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Images uploaded to the GPU.
    pub fn uploads(&self) -> u64 {
        self.uploads.load(Ordering::Relaxed)
    }

    /// Image textures created. Stays flat while image sizes do not change.
    pub fn texture_allocations(&self) -> u64 {
        self.texture_allocations.load(Ordering::Relaxed)
    }
}

/// GPU objects created once the output format is known.
struct Pipelines {
    image_pipeline: wgpu::RenderPipeline,
    image_uniforms: wgpu::Buffer,
    image_uniform_bg: wgpu::BindGroup,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    overlay_pipeline: wgpu::RenderPipeline,
    overlay_uniforms: wgpu::Buffer,
    overlay_uniform_bg: wgpu::BindGroup,
    overlay_vertices: wgpu::Buffer,
}

pub struct PreviewRenderer {
    ctx: GpuContext,
    config: RenderConfig,
    pipelines: Option<Pipelines>,
    texture: Option<ImageTexture>,
    /// Last image uploaded, re-uploaded when the pipelines are rebuilt.
    /// Shares pixels with the caller's copy.
    last_image: Option<RasterImage>,
    viewport: (u32, u32),
    pending_image: Arc<PendingSlot<RasterImage>>,
    pending_crop: Arc<PendingSlot<Option<Rect>>>,
    crop: Option<Rect>,
    /// Reused every frame; never grows past `MAX_OVERLAY_VERTICES`.
    overlay_scratch: Vec<OverlayVertex>,
    projection_dirty: bool,
    stats: Arc<RenderStats>,
}

impl PreviewRenderer {
    pub fn new(ctx: GpuContext, config: RenderConfig) -> Self {
        Self {
            ctx,
            config,
            pipelines: None,
            texture: None,
            last_image: None,
            viewport: (0, 0),
            pending_image: Arc::new(PendingSlot::new()),
            pending_crop: Arc::new(PendingSlot::new()),
            crop: None,
            overlay_scratch: Vec::with_capacity(MAX_OVERLAY_VERTICES),
            projection_dirty: true,
            stats: Arc::new(RenderStats::default()),
        }
    }

    /// Queue `image` for upload on the next frame. Never touches the GPU.
    pub fn set_image(&self, image: RasterImage) {
        if self.pending_image.put(image) {
            tracing::trace!("pending image replaced before upload");
        }
    }

    /// Queue a crop overlay change for the next frame.
    pub fn set_crop(&self, crop: Option<Rect>) {
        self.pending_crop.put(crop);
    }

    /// Shared handle to the pending image slot, for other threads.
    pub fn image_slot(&self) -> Arc<PendingSlot<RasterImage>> {
        Arc::clone(&self.pending_image)
    }

    pub fn crop_slot(&self) -> Arc<PendingSlot<Option<Rect>>> {
        Arc::clone(&self.pending_crop)
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Compile shaders and build pipelines for an output of `format`.
    ///
    /// # Errors
    ///
    /// `RenderError::ShaderCompile` if validation fails. The built-in shaders
    /// are fixed, so callers should treat this as fatal.
    pub fn on_surface_created(&mut self, format: wgpu::TextureFormat) -> Result<(), RenderError> {
        let device = &self.ctx.device;

        let image_shader = compile_shader(device, "image_shader", IMAGE_SHADER)?;
        let overlay_shader = compile_shader(device, "overlay_shader", OVERLAY_SHADER)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        // ---- Image pipeline ----
        let image_uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image_uniform_bgl"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
        });
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image_texture_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let image_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("image_uniform_buf"),
            contents: bytemuck::bytes_of(&ImageUniforms {
                projection: projection_matrix(1.0, 1.0, 1.0, 1.0),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let image_uniform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("image_uniform_bg"),
            layout: &image_uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: image_uniforms.as_entire_binding(),
            }],
        });

        let image_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("image_pipeline_layout"),
            bind_group_layouts: &[&image_uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let image_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("image_pipeline"),
            layout: Some(&image_layout),
            vertex: wgpu::VertexState {
                module: &image_shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &image_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
        });

        let filter: wgpu::FilterMode = self.config.filter.into();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("image_sampler"),
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // ---- Overlay pipeline ----
        let overlay_uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay_uniform_bgl"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
        });
        let overlay_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay_uniform_buf"),
            contents: bytemuck::bytes_of(&OverlayUniforms {
                viewport_size: [1.0, 1.0],
                _pad: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let overlay_uniform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay_uniform_bg"),
            layout: &overlay_uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: overlay_uniforms.as_entire_binding(),
            }],
        });
        let overlay_vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay_vertex_buf"),
            size: (MAX_OVERLAY_VERTICES * std::mem::size_of::<OverlayVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let overlay_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay_pipeline_layout"),
            bind_group_layouts: &[&overlay_uniform_bgl],
            push_constant_ranges: &[],
        });
        let overlay_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay_pipeline"),
            layout: Some(&overlay_layout),
            vertex: wgpu::VertexState {
                module: &overlay_shader,
                entry_point: "vs_main",
                buffers: &[OverlayVertex::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &overlay_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile(err.to_string()));
        }

        self.pipelines = Some(Pipelines {
            image_pipeline,
            image_uniforms,
            image_uniform_bg,
            texture_bgl,
            sampler,
            overlay_pipeline,
            overlay_uniforms,
            overlay_uniform_bg,
            overlay_vertices,
        });
        // A re-created surface needs the image in the new bind group layout
        if let Some(old) = self.texture.take() {
            old.destroy();
        }
        if let Some(image) = self.last_image.take() {
            self.upload(&image);
        }
        self.projection_dirty = true;

        tracing::debug!(?format, "preview pipelines created");
        Ok(())
    }

    /// Record the output size; the projection is recomputed on the next frame.
    pub fn on_surface_resized(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.projection_dirty = true;

        if let Some(p) = &self.pipelines {
            let uniforms = OverlayUniforms {
                viewport_size: [width.max(1) as f32, height.max(1) as f32],
                _pad: [0.0; 2],
            };
            self.ctx
                .queue
                .write_buffer(&p.overlay_uniforms, 0, bytemuck::bytes_of(&uniforms));
        }
        tracing::debug!(width, height, "preview surface resized");
    }

    /// Draw one frame into `target`, which must match the surface size and
    /// format given earlier.
    pub fn render_frame(&mut self, target: &wgpu::TextureView) -> Result<(), RenderError> {
        if self.pipelines.is_none() {
            return Err(RenderError::SurfaceNotReady);
        }

        if let Some(image) = self.pending_image.take() {
            self.upload(&image);
        }
        if let Some(crop) = self.pending_crop.take() {
            self.crop = crop;
        }

        let Some(p) = &self.pipelines else {
            return Err(RenderError::SurfaceNotReady);
        };
        let (vw, vh) = self.viewport;

        if self.projection_dirty {
            if let Some(tex) = &self.texture {
                let uniforms = ImageUniforms {
                    projection: projection_matrix(vw as f32, vh as f32, tex.width() as f32, tex.height() as f32),
                };
                self.ctx
                    .queue
                    .write_buffer(&p.image_uniforms, 0, bytemuck::bytes_of(&uniforms));
                self.projection_dirty = false;
            }
        }

        let overlay_count = match self.crop {
            Some(crop) if vw > 0 && vh > 0 => {
                build_overlay(
                    crop,
                    vw as f32,
                    vh as f32,
                    &self.config.overlay,
                    &mut self.overlay_scratch,
                );
                self.ctx.queue.write_buffer(
                    &p.overlay_vertices,
                    0,
                    bytemuck::cast_slice(&self.overlay_scratch),
                );
                self.overlay_scratch.len() as u32
            }
            _ => 0,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("preview_frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("preview_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.wgpu_clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(tex) = &self.texture {
                pass.set_pipeline(&p.image_pipeline);
                pass.set_bind_group(0, &p.image_uniform_bg, &[]);
                pass.set_bind_group(1, tex.bind_group(), &[]);
                pass.draw(0..4, 0..1);
            }

            if overlay_count > 0 {
                pass.set_pipeline(&p.overlay_pipeline);
                pass.set_bind_group(0, &p.overlay_uniform_bg, &[]);
                pass.set_vertex_buffer(0, p.overlay_vertices.slice(..));
                pass.draw(0..overlay_count, 0..1);
            }
        }
        self.ctx.submit_one(encoder);

        let frame = self.stats.frames.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(frame, image = self.texture.is_some(), overlay = overlay_count > 0, "frame rendered");
        Ok(())
    }

    /// Replace the texture contents, reallocating only when the size changes.
    fn upload(&mut self, image: &RasterImage) {
        let Some(p) = &self.pipelines else {
            return;
        };

        if image.is_empty() {
            if let Some(old) = self.texture.take() {
                old.destroy();
            }
            self.last_image = None;
            return;
        }
        if !self.ctx.supports_size(image.width(), image.height()) {
            tracing::warn!(
                width = image.width(),
                height = image.height(),
                max = self.ctx.max_texture_dim,
                "image exceeds the GPU texture limit; keeping previous preview"
            );
            return;
        }

        match self.texture.take() {
            Some(tex) if tex.fits(image) => {
                tex.write(&self.ctx.queue, image);
                self.texture = Some(tex);
            }
            old => {
                if let Some(old) = old {
                    old.destroy();
                }
                self.texture = Some(ImageTexture::new(
                    &self.ctx.device,
                    &self.ctx.queue,
                    &p.texture_bgl,
                    &p.sampler,
                    image,
                ));
                self.stats.texture_allocations.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.last_image = Some(image.clone());
        self.stats.uploads.fetch_add(1, Ordering::Relaxed);
        self.projection_dirty = true;
        tracing::debug!(width = image.width(), height = image.height(), "image uploaded");
    }
}

fn compile_shader(device: &wgpu::Device, label: &str, source: &str) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => {
            tracing::error!(shader = label, error = %err, "shader compilation failed");
            Err(RenderError::ShaderCompile(format!("{label}: {err}")))
        }
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{OffscreenTarget, OFFSCREEN_FORMAT};

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn gpu() -> Option<GpuContext> {
        match GpuContext::new() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    #[test]
    fn test_compile_shader_reports_errors() {
        let Some(ctx) = gpu() else {
            return;
        };

        let result = compile_shader(&ctx.device, "bad", "fn oops(");
        assert!(matches!(result, Err(RenderError::ShaderCompile(_))));

        assert!(compile_shader(&ctx.device, "image_shader", IMAGE_SHADER).is_ok());
        assert!(compile_shader(&ctx.device, "overlay_shader", OVERLAY_SHADER).is_ok());
    }

    #[test]
    fn test_render_before_surface_created() {
        let Some(ctx) = gpu() else {
            return;
        };
        let Some(mut target) = OffscreenTarget::new(&ctx, 8, 8) else {
            panic!("8x8 target should be allocated");
        };

        let mut renderer = PreviewRenderer::new(ctx, RenderConfig::default());
        assert!(matches!(
            renderer.render_frame(target.view()),
            Err(RenderError::SurfaceNotReady)
        ));
        target.destroy();
    }

    #[test]
    fn test_surface_recreation_keeps_image() {
        let Some(ctx) = gpu() else {
            return;
        };
        let Some(mut target) = OffscreenTarget::new(&ctx, 16, 16) else {
            panic!("16x16 target should be allocated");
        };

        let mut renderer = PreviewRenderer::new(ctx, RenderConfig::default());
        renderer.on_surface_created(OFFSCREEN_FORMAT).unwrap();
        renderer.on_surface_resized(16, 16);
        renderer.set_image(RasterImage::filled(16, 16, RED));
        renderer.render_frame(target.view()).unwrap();
        let before = target.read(renderer.context()).unwrap();
        assert_eq!(before.pixel(8, 8), Some(RED));

        // Nothing new queued; the image must survive the pipeline rebuild
        renderer.on_surface_created(OFFSCREEN_FORMAT).unwrap();
        renderer.render_frame(target.view()).unwrap();
        let after = target.read(renderer.context()).unwrap();
        assert_eq!(after.pixel(8, 8), Some(RED));

        let stats = renderer.stats();
        assert_eq!(stats.uploads(), 2);
        assert_eq!(stats.texture_allocations(), 2);
        target.destroy();
    }

    #[test]
    fn test_empty_image_clears_preview() {
        let Some(ctx) = gpu() else {
            return;
        };
        let Some(mut target) = OffscreenTarget::new(&ctx, 8, 8) else {
            panic!("8x8 target should be allocated");
        };

        let mut renderer = PreviewRenderer::new(ctx, RenderConfig::default());
        renderer.on_surface_created(OFFSCREEN_FORMAT).unwrap();
        renderer.on_surface_resized(8, 8);
        renderer.set_image(RasterImage::filled(8, 8, RED));
        renderer.render_frame(target.view()).unwrap();

        renderer.set_image(RasterImage::new(0, 0, Vec::new()));
        renderer.render_frame(target.view()).unwrap();
        // Rebuilding must not bring the cleared image back
        renderer.on_surface_created(OFFSCREEN_FORMAT).unwrap();
        renderer.render_frame(target.view()).unwrap();

        let frame = target.read(renderer.context()).unwrap();
        assert_eq!(frame.pixel(4, 4), Some([0, 0, 0, 255]));
        target.destroy();
    }
}
