//! Image sources and off-thread loading.
//!
//! Decoding a full-size photo takes long enough to stall pointer handling,
//! so [`load_image`] runs it on tokio's blocking pool and only hands the
//! finished raster back to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::decode::{decode_image, DecodeError, DecodeLimits, RasterImage};

/// Something that can produce a decoded raster.
pub trait ImageSource: Send + 'static {
    /// Decode the image, downsampling according to `limits`.
    fn decode(&self, limits: DecodeLimits) -> Result<RasterImage, DecodeError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// An encoded image on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileSource {
    fn decode(&self, limits: DecodeLimits) -> Result<RasterImage, DecodeError> {
        let bytes = std::fs::read(&self.path).map_err(|e| DecodeError::IoError(e.to_string()))?;
        decode_image(&bytes, limits)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An encoded image already in memory, e.g. a camera capture buffer.
#[derive(Debug, Clone)]
pub struct BytesSource {
    bytes: Arc<[u8]>,
}

impl BytesSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }
}

impl ImageSource for BytesSource {
    fn decode(&self, limits: DecodeLimits) -> Result<RasterImage, DecodeError> {
        decode_image(&self.bytes, limits)
    }

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.bytes.len())
    }
}

/// Decode `source` on a blocking worker and return the raster.
///
/// # Errors
///
/// Any [`DecodeError`] from the source, or `DecodeError::WorkerStopped` if
/// the worker task panicked or the runtime shut down first.
pub async fn load_image<S: ImageSource>(source: S, limits: DecodeLimits) -> Result<RasterImage, DecodeError> {
    let label = source.describe();
    tracing::debug!(source = %label, ?limits, "loading image");

    let result = tokio::task::spawn_blocking(move || source.decode(limits))
        .await
        .map_err(|e| DecodeError::WorkerStopped(e.to_string()))?;

    match &result {
        Ok(img) => tracing::info!(source = %label, width = img.width(), height = img.height(), "image loaded"),
        Err(e) => tracing::warn!(source = %label, error = %e, "image load failed"),
    }
    result
}
