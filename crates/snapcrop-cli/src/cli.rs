//! Headless crop, rotate and export.
//!
//! ```text
//! snapcrop photo.jpg                                  (re-encode into ./)
//! snapcrop photo.jpg --aspect 1:1 -o out/
//! snapcrop photo.jpg --rotate 1 --crop 0.1,0.1,0.9,0.9 --format png
//! snapcrop photo.jpg --aspect 16:9 --preview overlay.png
//! ```
//!
//! The crop tool is driven through the same pointer events a viewport host
//! would send, against a virtual viewport of `--viewport` size.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use snapcrop_core::encode::encode_image;
use snapcrop_core::{
    AspectPreset, DirectoryExportSink, EditSession, EditorConfig, ExportFormat, FileSource, Point, PointerEvent,
    Rect, RelativeRect,
};
use snapcrop_render::{GpuContext, PreviewHandle, RenderConfig, RenderThread};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

/// Crop, rotate and export a photo without a GUI.
#[derive(Parser, Debug)]
#[command(name = "snapcrop", version, about)]
pub struct CliArgs {
    /// Image to edit (JPEG, PNG or WebP).
    pub input: PathBuf,

    /// Directory the edited image is written to.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Aspect preset: free, 1:1, 3:4, 4:3, 9:16, 16:9, 2:3, 3:2.
    #[arg(short, long, value_name = "W:H")]
    pub aspect: Option<AspectPreset>,

    /// Number of clockwise quarter turns.
    #[arg(short, long, default_value_t = 0, value_name = "N")]
    pub rotate: u32,

    /// Crop rectangle relative to the image, "left,top,right,bottom" in 0..1.
    #[arg(short, long, value_name = "L,T,R,B", value_parser = parse_relative_rect)]
    pub crop: Option<RelativeRect>,

    /// Output format. Defaults to JPEG.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Jpeg)]
    pub format: OutputFormat,

    /// JPEG quality (1-100). Overrides the config file.
    #[arg(short, long, value_name = "1-100", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Editor configuration (JSON). Missing files fall back to defaults.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Virtual viewport the crop tool works in.
    #[arg(long, value_name = "WxH", default_value = "1080x1440", value_parser = parse_viewport)]
    pub viewport: (u32, u32),

    /// Write a PNG of the GPU preview (with crop overlay) before committing.
    #[arg(long, value_name = "FILE.png")]
    pub preview: Option<PathBuf>,
}

fn parse_relative_rect(s: &str) -> std::result::Result<RelativeRect, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<std::result::Result<_, _>>()?;
    let [left, top, right, bottom] = parts[..] else {
        return Err(format!("expected 4 comma-separated values, got {}", parts.len()));
    };
    let rect = RelativeRect::new(left, top, right, bottom);
    let in_unit = |v: f32| (0.0..=1.0).contains(&v);
    if !(in_unit(left) && in_unit(top) && in_unit(right) && in_unit(bottom)) || right <= left || bottom <= top {
        return Err("values must lie in 0..1 with left < right and top < bottom".into());
    }
    Ok(rect)
}

fn parse_viewport(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("viewport sides must be positive".into());
    }
    Ok((w, h))
}

/// Run the edit described by `args` and return the exported file.
pub async fn run(args: CliArgs) -> Result<PathBuf> {
    let mut config = match &args.config {
        Some(path) => EditorConfig::load_or_default(path),
        None => EditorConfig::default(),
    };
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
    let format = match args.format {
        OutputFormat::Jpeg => config.export_format(),
        OutputFormat::Png => ExportFormat::Png,
    };
    let sink = DirectoryExportSink::new(&args.output_dir, config.export_prefix.clone());

    let mut session = EditSession::open(FileSource::new(&args.input), config)
        .await
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let (vw, vh) = args.viewport;
    session.set_viewport(vw as f32, vh as f32);

    // Keep the render thread alive for the whole edit
    let preview = match &args.preview {
        Some(_) => Some(start_preview(&mut session, vw, vh)?),
        None => None,
    };

    let wants_crop = args.aspect.is_some() || args.crop.is_some() || args.rotate % 4 != 0;
    if wants_crop {
        session.enter_crop();
        for _ in 0..args.rotate % 4 {
            session.rotate();
        }
        if let Some(aspect) = args.aspect {
            session.select_aspect(aspect);
        }
        if let Some(rel) = args.crop {
            drive_crop(&mut session, rel)?;
        }
    }

    if let (Some((_, handle)), Some(path)) = (&preview, &args.preview) {
        write_preview(handle, path)?;
    }

    if wants_crop {
        match session.commit_crop()? {
            Some(summary) => {
                tracing::info!(width = summary.width, height = summary.height, "{summary}");
            }
            None => bail!("crop tool was not active"),
        }
    }

    let path = session.export(&sink, format).context("export failed")?;
    Ok(path)
}

fn start_preview(session: &mut EditSession, width: u32, height: u32) -> Result<(RenderThread, PreviewHandle)> {
    let ctx = GpuContext::new().context("no GPU available for --preview")?;
    tracing::info!(adapter = %ctx.adapter_name, "preview enabled");
    let (thread, handle) =
        RenderThread::spawn(ctx, RenderConfig::default(), width, height).context("failed to start renderer")?;
    session.attach_preview(Box::new(handle.clone()));
    Ok((thread, handle))
}

fn write_preview(handle: &PreviewHandle, path: &Path) -> Result<()> {
    let frame = handle.snapshot().context("preview snapshot failed")?;
    let bytes = encode_image(&frame, ExportFormat::Png)?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "preview written");
    Ok(())
}

/// Move the crop rectangle onto `rel` with a resize gesture followed by a
/// drag gesture. The result is clamped exactly as an interactive edit would
/// be (minimum size, aspect lock, image bounds).
fn drive_crop(session: &mut EditSession, rel: RelativeRect) -> Result<()> {
    let Some(state) = session.crop_state() else {
        bail!("crop tool was not active");
    };
    let b = state.bounds();
    let target = Rect::new(
        b.left + rel.left * b.width(),
        b.top + rel.top * b.height(),
        b.left + rel.right * b.width(),
        b.top + rel.bottom * b.height(),
    );

    // Pull the bottom-right handle to the target size
    let rect = state.rect();
    let corner = Point::new(rect.right, rect.bottom);
    let sized = Point::new(rect.left + target.width(), rect.top + target.height());
    gesture(session, corner, sized);

    // Then grab just inside the top-left and move it onto the target
    let Some(rect) = session.crop_rect() else {
        bail!("crop tool was not active");
    };
    let grab = Point::new(rect.left + 1.0, rect.top + 1.0);
    let moved = Point::new(grab.x + target.left - rect.left, grab.y + target.top - rect.top);
    gesture(session, grab, moved);

    tracing::debug!(?target, actual = ?session.crop_rect(), "crop placed");
    Ok(())
}

fn gesture(session: &mut EditSession, from: Point, to: Point) {
    session.handle_pointer(PointerEvent::Down(from));
    session.handle_pointer(PointerEvent::Move(to));
    session.handle_pointer(PointerEvent::Up(to));
}
