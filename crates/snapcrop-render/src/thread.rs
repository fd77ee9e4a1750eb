//! Render thread: owns the GPU objects, fed by commands and pending slots.
//!
//! Callers never touch wgpu directly. Images and crop rectangles go into
//! last-write-wins slots; commands only wake the thread. Every command that
//! is already queued when the thread wakes is handled in one batch, so a
//! burst of updates produces a single frame.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use snapcrop_core::geometry::Rect;
use snapcrop_core::{PreviewSink, RasterImage};

use crate::config::RenderConfig;
use crate::context::GpuContext;
use crate::error::RenderError;
use crate::pending::PendingSlot;
use crate::renderer::{PreviewRenderer, RenderStats};
use crate::target::{OffscreenTarget, OFFSCREEN_FORMAT};

enum RenderCommand {
    Resize { width: u32, height: u32 },
    RequestFrame,
    Snapshot(Sender<Result<RasterImage, RenderError>>),
    Shutdown,
}

/// Owner of the render thread. Dropping it stops the thread.
pub struct RenderThread {
    tx: Sender<RenderCommand>,
    join: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Build pipelines for an offscreen target of `width` x `height` and
    /// start the thread.
    pub fn spawn(
        ctx: GpuContext,
        config: RenderConfig,
        width: u32,
        height: u32,
    ) -> Result<(Self, PreviewHandle), RenderError> {
        let mut renderer = PreviewRenderer::new(ctx, config);
        renderer.on_surface_created(OFFSCREEN_FORMAT)?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = PreviewHandle {
            tx: tx.clone(),
            image_slot: renderer.image_slot(),
            crop_slot: renderer.crop_slot(),
            stats: renderer.stats(),
        };

        let join = std::thread::Builder::new()
            .name("snapcrop-render".into())
            .spawn(move || run(renderer, &rx, width, height))
            .map_err(|e| {
                tracing::error!(error = %e, "failed to spawn render thread");
                RenderError::ThreadStopped
            })?;

        Ok((Self { tx, join: Some(join) }, handle))
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(RenderCommand::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::error!("render thread panicked");
            }
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut renderer: PreviewRenderer, rx: &Receiver<RenderCommand>, width: u32, height: u32) {
    let mut target = OffscreenTarget::new(renderer.context(), width, height);
    renderer.on_surface_resized(width, height);
    draw(&mut renderer, target.as_ref());

    tracing::debug!(width, height, "render thread started");

    while let Ok(first) = rx.recv() {
        let mut frame_requested = false;
        let mut resize = None;
        let mut snapshots = Vec::new();
        let mut shutdown = false;

        for cmd in std::iter::once(first).chain(rx.try_iter()) {
            match cmd {
                RenderCommand::Resize { width, height } => resize = Some((width, height)),
                RenderCommand::RequestFrame => frame_requested = true,
                RenderCommand::Snapshot(reply) => snapshots.push(reply),
                RenderCommand::Shutdown => shutdown = true,
            }
        }

        if let Some((w, h)) = resize {
            if target.as_ref().map(OffscreenTarget::size) != Some((w, h)) {
                if let Some(old) = target.take() {
                    old.destroy();
                }
                target = OffscreenTarget::new(renderer.context(), w, h);
            }
            renderer.on_surface_resized(w, h);
            frame_requested = true;
        }

        if frame_requested && !shutdown {
            draw(&mut renderer, target.as_ref());
        }

        for reply in snapshots {
            let result = match target.as_mut() {
                Some(t) => t.read(renderer.context()),
                None => Err(RenderError::Readback("viewport is empty".into())),
            };
            let _ = reply.send(result);
        }

        if shutdown {
            break;
        }
    }

    if let Some(t) = target {
        t.destroy();
    }
    tracing::debug!("render thread stopped");
}

fn draw(renderer: &mut PreviewRenderer, target: Option<&OffscreenTarget>) {
    let Some(target) = target else {
        return;
    };
    if let Err(e) = renderer.render_frame(target.view()) {
        tracing::error!(error = %e, "frame failed");
    }
}

/// Cheap, cloneable handle for feeding the render thread.
#[derive(Clone)]
pub struct PreviewHandle {
    tx: Sender<RenderCommand>,
    image_slot: Arc<PendingSlot<RasterImage>>,
    crop_slot: Arc<PendingSlot<Option<Rect>>>,
    stats: Arc<RenderStats>,
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl PreviewHandle {
    /// Replace the displayed image. Earlier images not yet drawn are dropped.
    pub fn set_image(&self, image: RasterImage) {
        self.image_slot.put(image);
        self.request_frame();
    }

    /// Show the crop overlay at `crop` (viewport pixels), or hide it.
    pub fn set_crop(&self, crop: Option<Rect>) {
        self.crop_slot.put(crop);
        self.request_frame();
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.send(RenderCommand::Resize { width, height });
    }

    pub fn request_frame(&self) {
        self.send(RenderCommand::RequestFrame);
    }

    /// Block until the thread has handled every earlier command, then return
    /// the current frame.
    pub fn snapshot(&self) -> Result<RasterImage, RenderError> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(RenderCommand::Snapshot(reply))
            .map_err(|_| RenderError::ThreadStopped)?;
        rx.recv().map_err(|_| RenderError::ThreadStopped)?
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    fn send(&self, cmd: RenderCommand) {
        if self.tx.send(cmd).is_err() {
            tracing::debug!("render thread gone; command dropped");
        }
    }
}

impl PreviewSink for PreviewHandle {
    fn show_image(&self, image: &RasterImage) {
        self.set_image(image.clone());
    }

    fn show_crop(&self, crop: Option<Rect>) {
        self.set_crop(crop);
    }
}
