//! Image encoding pipeline for snapcrop.
//!
//! This module provides functionality for:
//! - Encoding rasters to JPEG with configurable quality
//! - Encoding rasters to PNG
//!
//! The export sink in [`crate::export`] is the usual caller; encoding is kept
//! separate so hosts with their own storage can reuse it.

mod encoder;

pub use encoder::{encode_image, EncodeError, ExportFormat};
