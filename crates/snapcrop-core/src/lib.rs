//! Snapcrop Core - interactive crop/rotate pipeline
//!
//! This crate provides the parts of snapcrop that need no GPU: crop-rectangle
//! geometry, the edit session with undo/redo, image decoding and export.

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod export;
pub mod geometry;
pub mod session;
pub mod source;
pub mod transform;

pub use config::{ConfigError, EditorConfig};
pub use decode::{DecodeError, DecodeLimits, RasterImage};
pub use encode::ExportFormat;
pub use error::EditError;
pub use export::{DirectoryExportSink, ExportError, ExportSink};
pub use geometry::{AspectPreset, OverlayShapes, PixelRect, Point, Rect, RelativeRect};
pub use session::{CropSummary, EditSession, Mode, PointerEvent, PreviewSink};
pub use source::{load_image, BytesSource, FileSource, ImageSource};
