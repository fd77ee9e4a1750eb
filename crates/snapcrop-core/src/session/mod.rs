//! The edit session: current image, undo/redo and the crop mode.
//!
//! # Modes
//!
//! - `Normal`: the committed image is shown; undo, redo and export work
//! - `Cropping`: a working copy is shown with a crop rectangle on top;
//!   rotations apply to the working copy only and become undoable as part
//!   of the eventual commit
//!
//! Operations issued in the wrong mode are no-ops and report `false` (or
//! `Ok(None)`), never errors, except export which needs a committed image.

mod history;
mod pointer;
mod preview;

use std::fmt;
use std::path::PathBuf;

pub use history::History;
pub use pointer::PointerEvent;
pub use preview::PreviewSink;

use crate::config::EditorConfig;
use crate::decode::RasterImage;
use crate::encode::ExportFormat;
use crate::error::EditError;
use crate::export::ExportSink;
use crate::geometry::{
    apply_aspect_lock, begin_interaction, drag, fit_bounds, resize, to_pixel_rect, to_relative,
    AspectPreset, Interaction, PixelRect, Rect,
};
use crate::source::{load_image, ImageSource};
use crate::transform::{crop_pixels, rotate_90_cw};

/// State of an in-progress crop.
#[derive(Debug, Clone)]
pub struct CropState {
    working: RasterImage,
    aspect: AspectPreset,
    bounds: Rect,
    rect: Rect,
    interaction: Interaction,
}

impl CropState {
    /// The (possibly rotated) image being cropped.
    pub fn working_image(&self) -> &RasterImage {
        &self.working
    }

    pub fn aspect(&self) -> AspectPreset {
        self.aspect
    }

    /// Where the working image is drawn in the viewport.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }
}

#[derive(Debug, Clone, Default)]
pub enum Mode {
    #[default]
    Normal,
    Cropping(CropState),
}

/// Outcome of a committed crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSummary {
    pub aspect: AspectPreset,
    /// Region of the working image that was kept.
    pub pixel_rect: PixelRect,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for CropSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crop applied: {}", self.aspect.label())
    }
}

pub struct EditSession {
    config: EditorConfig,
    current: RasterImage,
    history: History,
    viewport: Rect,
    mode: Mode,
    preview: Option<Box<dyn PreviewSink>>,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("current", &self.current)
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .field("viewport", &self.viewport)
            .field("mode", &self.mode)
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

impl EditSession {
    pub fn new(image: RasterImage, config: EditorConfig) -> Self {
        Self {
            history: History::new(config.history_limit),
            config,
            current: image,
            viewport: Rect::default(),
            mode: Mode::Normal,
            preview: None,
        }
    }

    /// Decode `source` off-thread and start a session on it.
    pub async fn open<S: ImageSource>(source: S, config: EditorConfig) -> Result<Self, EditError> {
        let image = load_image(source, config.decode_limits()).await?;
        Ok(Self::new(image, config))
    }

    /// Replace the image being edited, dropping history and any crop.
    ///
    /// On failure the session is left exactly as it was.
    pub async fn load<S: ImageSource>(&mut self, source: S) -> Result<(), EditError> {
        let image = load_image(source, self.config.decode_limits()).await?;
        self.current = image;
        self.history.clear();
        self.mode = Mode::Normal;
        self.notify_crop(None);
        self.notify_image();
        Ok(())
    }

    /// Route preview updates to `sink` and push the current state to it.
    pub fn attach_preview(&mut self, sink: Box<dyn PreviewSink>) {
        self.preview = Some(sink);
        self.notify_image();
        let crop = self.crop_rect();
        self.notify_crop(crop);
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn current_image(&self) -> &RasterImage {
        &self.current
    }

    /// The image on screen: the working copy while cropping.
    pub fn displayed_image(&self) -> &RasterImage {
        match &self.mode {
            Mode::Normal => &self.current,
            Mode::Cropping(crop) => &crop.working,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_cropping(&self) -> bool {
        matches!(self.mode, Mode::Cropping(_))
    }

    pub fn crop_state(&self) -> Option<&CropState> {
        match &self.mode {
            Mode::Cropping(crop) => Some(crop),
            Mode::Normal => None,
        }
    }

    pub fn crop_rect(&self) -> Option<Rect> {
        self.crop_state().map(|c| c.rect)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Where the displayed image is drawn inside the viewport.
    pub fn view_bounds(&self) -> Rect {
        let img = self.displayed_image();
        fit_bounds(
            self.viewport.width(),
            self.viewport.height(),
            img.width() as f32,
            img.height() as f32,
        )
    }

    /// Record the viewport size.
    ///
    /// While cropping, the bounds are recomputed and the selected aspect lock
    /// is re-applied, which resets the crop rectangle.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Rect::from_size(width.max(0.0), height.max(0.0));
        let viewport = self.viewport;

        let Mode::Cropping(crop) = &mut self.mode else {
            return;
        };
        crop.bounds = fit_for(viewport, &crop.working);
        crop.rect = apply_aspect_lock(crop.bounds, crop.aspect.ratio());
        crop.interaction = Interaction::Idle;

        let rect = crop.rect;
        self.notify_crop(Some(rect));
    }

    /// Enter crop mode with a full-bleed, free-aspect rectangle.
    pub fn enter_crop(&mut self) -> bool {
        if self.is_cropping() {
            return false;
        }

        let working = self.current.clone();
        let bounds = fit_for(self.viewport, &working);
        self.mode = Mode::Cropping(CropState {
            working,
            aspect: AspectPreset::Free,
            bounds,
            rect: bounds,
            interaction: Interaction::Idle,
        });

        tracing::debug!(?bounds, "entered crop mode");
        self.notify_crop(Some(bounds));
        true
    }

    /// Lock the crop rectangle to `aspect`, centered in the image bounds.
    pub fn select_aspect(&mut self, aspect: AspectPreset) -> bool {
        let Mode::Cropping(crop) = &mut self.mode else {
            return false;
        };
        crop.aspect = aspect;
        crop.rect = apply_aspect_lock(crop.bounds, aspect.ratio());
        crop.interaction = Interaction::Idle;

        let rect = crop.rect;
        tracing::debug!(%aspect, ?rect, "aspect selected");
        self.notify_crop(Some(rect));
        true
    }

    /// Rotate the working image 90 degrees clockwise.
    ///
    /// Nothing is pushed to the undo stack; the rotation only becomes part of
    /// history through `commit_crop`.
    pub fn rotate(&mut self) -> bool {
        let viewport = self.viewport;
        let Mode::Cropping(crop) = &mut self.mode else {
            return false;
        };
        crop.working = rotate_90_cw(&crop.working);
        crop.bounds = fit_for(viewport, &crop.working);
        crop.rect = apply_aspect_lock(crop.bounds, crop.aspect.ratio());
        crop.interaction = Interaction::Idle;

        let rect = crop.rect;
        tracing::debug!(
            width = crop.working.width(),
            height = crop.working.height(),
            "rotated working image"
        );
        self.notify_image();
        self.notify_crop(Some(rect));
        true
    }

    /// Apply the crop rectangle to the working image and make it current.
    ///
    /// Returns `Ok(None)` outside crop mode.
    ///
    /// # Errors
    ///
    /// `EditError::CropTooSmall` when the rectangle collapses in image pixels;
    /// the session stays in crop mode, unchanged.
    pub fn commit_crop(&mut self) -> Result<Option<CropSummary>, EditError> {
        let Mode::Cropping(crop) = &self.mode else {
            return Ok(None);
        };

        let relative = to_relative(crop.rect, crop.bounds);
        let pixel_rect = match to_pixel_rect(relative, crop.working.width(), crop.working.height()) {
            Ok(px) => px,
            Err(e) => {
                tracing::warn!(rect = ?crop.rect, bounds = ?crop.bounds, "crop rejected: {e}");
                return Err(e.into());
            }
        };

        let mut cropped = crop_pixels(&crop.working, pixel_rect);
        if cropped.ptr_eq(&self.current) {
            cropped = cropped.detached();
        }
        let summary = CropSummary {
            aspect: crop.aspect,
            pixel_rect,
            width: cropped.width(),
            height: cropped.height(),
        };

        let previous = std::mem::replace(&mut self.current, cropped);
        self.history.commit(previous);
        self.mode = Mode::Normal;

        tracing::info!(
            aspect = %summary.aspect,
            width = summary.width,
            height = summary.height,
            undo = self.history.undo_len(),
            "crop committed"
        );
        self.notify_crop(None);
        self.notify_image();
        Ok(Some(summary))
    }

    /// Leave crop mode, discarding the working image and any rotation.
    pub fn exit_crop_without_commit(&mut self) -> bool {
        if !self.is_cropping() {
            return false;
        }
        self.mode = Mode::Normal;
        tracing::debug!("crop cancelled");
        self.notify_crop(None);
        self.notify_image();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.is_cropping() && self.history.undo_len() > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.is_cropping() && self.history.redo_len() > 0
    }

    pub fn undo(&mut self) -> bool {
        if self.is_cropping() || !self.history.undo(&mut self.current) {
            return false;
        }
        tracing::debug!(undo = self.history.undo_len(), redo = self.history.redo_len(), "undo");
        self.notify_image();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.is_cropping() || !self.history.redo(&mut self.current) {
            return false;
        }
        tracing::debug!(undo = self.history.undo_len(), redo = self.history.redo_len(), "redo");
        self.notify_image();
        true
    }

    /// Feed a pointer event from the viewport host.
    ///
    /// Returns true when the event was consumed by the crop tool.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let handle_size = self.config.resize_handle_size;
        let min_size = self.config.min_crop_size;
        let Mode::Cropping(crop) = &mut self.mode else {
            return false;
        };

        let before = crop.rect;
        let consumed = match (event, crop.interaction) {
            (PointerEvent::Down(p), _) => {
                crop.interaction = begin_interaction(p, crop.rect, handle_size);
                crop.interaction.is_active()
            }
            (PointerEvent::Move(p), Interaction::Dragging { last }) => {
                crop.rect = drag(crop.rect, crop.bounds, p.x - last.x, p.y - last.y);
                crop.interaction = Interaction::Dragging { last: p };
                true
            }
            (PointerEvent::Move(p), Interaction::Resizing { .. }) => {
                crop.rect = resize(crop.rect, crop.bounds, p, crop.aspect.ratio(), min_size);
                crop.interaction = Interaction::Resizing { last: p };
                true
            }
            (PointerEvent::Move(_), Interaction::Idle) => false,
            (PointerEvent::Up(_) | PointerEvent::Cancel, interaction) => {
                crop.interaction = Interaction::Idle;
                interaction.is_active()
            }
        };

        let after = crop.rect;
        if after != before {
            tracing::trace!(?after, "crop rect changed");
            self.notify_crop(Some(after));
        }
        consumed
    }

    /// Store the current image through `sink`.
    ///
    /// # Errors
    ///
    /// `EditError::NotInNormalMode` while cropping, or the sink's failure.
    pub fn export(&self, sink: &dyn ExportSink, format: ExportFormat) -> Result<PathBuf, EditError> {
        if self.is_cropping() {
            return Err(EditError::NotInNormalMode);
        }
        Ok(sink.export(&self.current, format)?)
    }

    fn notify_image(&self) {
        if let Some(sink) = &self.preview {
            sink.show_image(self.displayed_image());
        }
    }

    fn notify_crop(&self, rect: Option<Rect>) {
        if let Some(sink) = &self.preview {
            sink.show_crop(rect);
        }
    }
}

fn fit_for(viewport: Rect, image: &RasterImage) -> Rect {
    fit_bounds(
        viewport.width(),
        viewport.height(),
        image.width() as f32,
        image.height() as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::DirectoryExportSink;
    use crate::geometry::Point;
    use crate::source::BytesSource;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum PreviewEvent {
        Image(u32, u32),
        Crop(Option<Rect>),
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<PreviewEvent>>>);

    impl RecordingSink {
        fn events(&self) -> Vec<PreviewEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl PreviewSink for RecordingSink {
        fn show_image(&self, image: &RasterImage) {
            self.0.lock().unwrap().push(PreviewEvent::Image(image.width(), image.height()));
        }

        fn show_crop(&self, crop: Option<Rect>) {
            self.0.lock().unwrap().push(PreviewEvent::Crop(crop));
        }
    }

    fn session(width: u32, height: u32, viewport: (f32, f32)) -> EditSession {
        let mut s = EditSession::new(
            RasterImage::filled(width, height, [40, 80, 120, 255]),
            EditorConfig::default(),
        );
        s.set_viewport(viewport.0, viewport.1);
        s
    }

    #[test]
    fn test_enter_crop_is_full_bleed_and_free() {
        let mut s = session(300, 200, (300.0, 600.0));
        assert!(s.enter_crop());

        let crop = s.crop_state().unwrap();
        assert_eq!(crop.bounds(), Rect::new(0.0, 200.0, 300.0, 400.0));
        assert_eq!(crop.rect(), crop.bounds());
        assert_eq!(crop.aspect(), AspectPreset::Free);
        assert!(crop.working_image().ptr_eq(s.current_image()));

        // Already cropping
        assert!(!s.enter_crop());
    }

    #[test]
    fn test_select_aspect_square() {
        let mut s = session(300, 200, (300.0, 200.0));
        s.enter_crop();
        assert!(s.select_aspect(AspectPreset::Square));

        assert_eq!(s.crop_rect(), Some(Rect::new(50.0, 0.0, 250.0, 200.0)));
    }

    #[test]
    fn test_select_aspect_outside_crop_is_noop() {
        let mut s = session(300, 200, (300.0, 200.0));
        assert!(!s.select_aspect(AspectPreset::Square));
        assert!(!s.rotate());
        assert!(!s.exit_crop_without_commit());
    }

    #[test]
    fn test_rotate_refits_bounds_without_history() {
        let mut s = session(300, 200, (400.0, 400.0));
        s.enter_crop();
        assert!(s.rotate());

        let crop = s.crop_state().unwrap();
        assert_eq!(
            (crop.working_image().width(), crop.working_image().height()),
            (200, 300)
        );
        let b = crop.bounds();
        assert!((b.width() / b.height() - 200.0 / 300.0).abs() < 1e-4);
        assert_eq!(s.history().undo_len(), 0);
        assert_eq!((s.current_image().width(), s.current_image().height()), (300, 200));
    }

    #[test]
    fn test_rotate_keeps_selected_aspect() {
        let mut s = session(300, 200, (400.0, 400.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Landscape16x9);
        s.rotate();

        let r = s.crop_rect().unwrap();
        assert!((r.width() / r.height() - 16.0 / 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_commit_then_undo_restores_reference() {
        let mut s = session(300, 200, (300.0, 200.0));
        let original = s.current_image().clone();

        s.enter_crop();
        s.select_aspect(AspectPreset::Square);
        let summary = s.commit_crop().unwrap().unwrap();

        assert_eq!(summary.pixel_rect, PixelRect::new(50, 0, 250, 200));
        assert_eq!((summary.width, summary.height), (200, 200));
        assert_eq!(summary.to_string(), "crop applied: 1:1");
        assert!(!s.is_cropping());
        assert_eq!(s.history().redo_len(), 0);

        let cropped = s.current_image().clone();
        assert!(s.undo());
        assert!(s.current_image().ptr_eq(&original));
        assert_eq!(s.history().redo_len(), 1);
        assert!(s.history().peek_redo().unwrap().ptr_eq(&cropped));
    }

    #[test]
    fn test_k_commits_k_undos() {
        let mut s = session(1000, 800, (1000.0, 800.0));
        let original = s.current_image().clone();

        for _ in 0..3 {
            s.enter_crop();
            s.select_aspect(AspectPreset::Square);
            s.commit_crop().unwrap();
            assert_eq!(s.history().redo_len(), 0);
        }
        for _ in 0..3 {
            assert!(s.undo());
        }
        assert!(s.current_image().ptr_eq(&original));
        assert!(!s.undo());
    }

    #[test]
    fn test_full_bleed_commit_produces_new_image() {
        let mut s = session(300, 200, (300.0, 200.0));
        let original = s.current_image().clone();

        s.enter_crop();
        s.commit_crop().unwrap();

        assert!(!s.current_image().ptr_eq(&original));
        assert!(!s.history().contains(s.current_image()));
        assert_eq!(s.current_image().pixels(), original.pixels());
    }

    #[test]
    fn test_commit_after_rotation_is_one_undo_step() {
        let mut s = session(300, 200, (400.0, 400.0));
        let original = s.current_image().clone();

        s.enter_crop();
        s.rotate();
        s.commit_crop().unwrap();
        assert_eq!((s.current_image().width(), s.current_image().height()), (200, 300));
        assert_eq!(s.history().undo_len(), 1);

        s.undo();
        assert!(s.current_image().ptr_eq(&original));
    }

    #[test]
    fn test_commit_too_small_keeps_cropping() {
        // Zero-sized viewport collapses the bounds
        let mut s = session(300, 200, (0.0, 0.0));
        s.enter_crop();

        let result = s.commit_crop();
        assert!(matches!(result, Err(EditError::CropTooSmall)));
        assert!(s.is_cropping());
        assert_eq!(s.history().undo_len(), 0);
    }

    #[test]
    fn test_commit_outside_crop_is_noop() {
        let mut s = session(300, 200, (300.0, 200.0));
        assert!(matches!(s.commit_crop(), Ok(None)));
    }

    #[test]
    fn test_exit_without_commit() {
        let mut s = session(300, 200, (300.0, 200.0));
        let original = s.current_image().clone();

        s.enter_crop();
        s.rotate();
        assert!(s.exit_crop_without_commit());

        assert!(!s.is_cropping());
        assert!(s.current_image().ptr_eq(&original));
        assert_eq!(s.history().undo_len(), 0);
        assert_eq!(s.history().redo_len(), 0);
    }

    #[test]
    fn test_undo_redo_disabled_while_cropping() {
        let mut s = session(300, 200, (300.0, 200.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Square);
        s.commit_crop().unwrap();
        s.undo();
        assert!(s.can_redo());

        s.enter_crop();
        assert!(!s.can_undo());
        assert!(!s.can_redo());
        assert!(!s.redo());
        assert_eq!(s.history().redo_len(), 1);
    }

    #[test]
    fn test_redo_after_undo() {
        let mut s = session(300, 200, (300.0, 200.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Square);
        s.commit_crop().unwrap();
        let cropped = s.current_image().clone();

        s.undo();
        assert!(s.redo());
        assert!(s.current_image().ptr_eq(&cropped));
        assert_eq!(s.history().undo_len(), 1);
        assert_eq!(s.history().redo_len(), 0);
    }

    #[test]
    fn test_history_limit_applies() {
        let config = EditorConfig {
            history_limit: Some(2),
            ..EditorConfig::default()
        };
        let mut s = EditSession::new(RasterImage::filled(1000, 1000, [0, 0, 0, 255]), config);
        s.set_viewport(1000.0, 1000.0);

        for _ in 0..4 {
            s.enter_crop();
            s.commit_crop().unwrap();
        }
        assert_eq!(s.history().undo_len(), 2);
    }

    #[test]
    fn test_pointer_drag() {
        let mut s = session(300, 200, (300.0, 200.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Square);

        assert!(s.handle_pointer(PointerEvent::Down(Point::new(100.0, 100.0))));
        assert!(matches!(
            s.crop_state().unwrap().interaction(),
            Interaction::Dragging { .. }
        ));
        assert!(s.handle_pointer(PointerEvent::Move(Point::new(80.0, 100.0))));
        assert_eq!(s.crop_rect(), Some(Rect::new(30.0, 0.0, 230.0, 200.0)));

        // Past the left edge: clamped, size kept
        s.handle_pointer(PointerEvent::Move(Point::new(0.0, 100.0)));
        assert_eq!(s.crop_rect(), Some(Rect::new(0.0, 0.0, 200.0, 200.0)));

        assert!(s.handle_pointer(PointerEvent::Up(Point::new(0.0, 100.0))));
        assert_eq!(s.crop_state().unwrap().interaction(), Interaction::Idle);
    }

    #[test]
    fn test_pointer_resize() {
        let mut s = session(300, 200, (300.0, 200.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Square);

        // Bottom-right corner of (50, 0, 250, 200)
        s.handle_pointer(PointerEvent::Down(Point::new(245.0, 195.0)));
        assert!(matches!(
            s.crop_state().unwrap().interaction(),
            Interaction::Resizing { .. }
        ));
        s.handle_pointer(PointerEvent::Move(Point::new(200.0, 150.0)));
        assert_eq!(s.crop_rect(), Some(Rect::new(50.0, 0.0, 200.0, 150.0)));

        // Below minimum is clamped to 120
        s.handle_pointer(PointerEvent::Move(Point::new(60.0, 60.0)));
        assert_eq!(s.crop_rect(), Some(Rect::new(50.0, 0.0, 170.0, 120.0)));
    }

    #[test]
    fn test_pointer_cancel_and_miss() {
        let mut s = session(300, 200, (600.0, 600.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Square);

        // Outside the rect
        assert!(!s.handle_pointer(PointerEvent::Down(Point::new(5.0, 5.0))));
        assert!(!s.handle_pointer(PointerEvent::Move(Point::new(50.0, 50.0))));

        s.handle_pointer(PointerEvent::Down(Point::new(300.0, 300.0)));
        assert!(s.handle_pointer(PointerEvent::Cancel));
        assert_eq!(s.crop_state().unwrap().interaction(), Interaction::Idle);
    }

    #[test]
    fn test_pointer_ignored_in_normal_mode() {
        let mut s = session(300, 200, (300.0, 200.0));
        assert!(!s.handle_pointer(PointerEvent::Down(Point::new(100.0, 100.0))));
    }

    #[test]
    fn test_set_viewport_reapplies_aspect() {
        let mut s = session(300, 200, (300.0, 200.0));
        s.enter_crop();
        s.select_aspect(AspectPreset::Square);
        s.handle_pointer(PointerEvent::Down(Point::new(100.0, 100.0)));
        s.handle_pointer(PointerEvent::Move(Point::new(90.0, 100.0)));

        s.set_viewport(600.0, 400.0);
        assert_eq!(s.crop_rect(), Some(Rect::new(100.0, 0.0, 500.0, 400.0)));
        assert_eq!(s.crop_state().unwrap().interaction(), Interaction::Idle);
    }

    #[test]
    fn test_preview_receives_updates() {
        let sink = RecordingSink::default();
        let mut s = session(300, 200, (300.0, 200.0));
        s.attach_preview(Box::new(sink.clone()));

        s.enter_crop();
        s.select_aspect(AspectPreset::Square);
        s.commit_crop().unwrap();

        let events = sink.events();
        assert_eq!(events[0], PreviewEvent::Image(300, 200));
        assert_eq!(events[1], PreviewEvent::Crop(None));
        assert!(events.contains(&PreviewEvent::Crop(Some(Rect::new(50.0, 0.0, 250.0, 200.0)))));
        assert_eq!(events[events.len() - 2], PreviewEvent::Crop(None));
        assert_eq!(events[events.len() - 1], PreviewEvent::Image(200, 200));
    }

    #[test]
    fn test_export_requires_normal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryExportSink::new(dir.path(), "EDIT_");
        let mut s = session(30, 20, (300.0, 200.0));

        s.enter_crop();
        assert!(matches!(
            s.export(&sink, ExportFormat::Png),
            Err(EditError::NotInNormalMode)
        ));

        s.exit_crop_without_commit();
        let path = s.export(&sink, ExportFormat::Png).unwrap();
        assert!(path.exists());
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_open_and_load() {
        let mut s = EditSession::open(BytesSource::new(png_bytes(30, 20)), EditorConfig::default())
            .await
            .unwrap();
        assert_eq!((s.current_image().width(), s.current_image().height()), (30, 20));

        s.set_viewport(300.0, 200.0);
        s.enter_crop();
        s.commit_crop().unwrap();
        assert_eq!(s.history().undo_len(), 1);

        s.load(BytesSource::new(png_bytes(8, 8))).await.unwrap();
        assert_eq!(s.current_image().width(), 8);
        assert_eq!(s.history().undo_len(), 0);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_session_unchanged() {
        let mut s = session(30, 20, (300.0, 200.0));
        let before = s.current_image().clone();
        s.enter_crop();

        let result = s.load(BytesSource::new(vec![0u8; 16])).await;
        assert!(matches!(result, Err(EditError::Decode(_))));
        assert!(s.is_cropping());
        assert!(s.current_image().ptr_eq(&before));
    }
}
