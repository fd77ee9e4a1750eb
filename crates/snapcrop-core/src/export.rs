//! Export sinks: where finished images are stored.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::decode::RasterImage;
use crate::encode::{encode_image, EncodeError, ExportFormat};

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Accepts a raster and an encoding and returns where it was stored.
pub trait ExportSink {
    fn export(&self, image: &RasterImage, format: ExportFormat) -> Result<PathBuf, ExportError>;
}

/// Writes `<prefix><unix-millis>.<ext>` files into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
    prefix: String,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path of the form `<prefix><millis>[_n].<ext>`.
    fn next_path(&self, format: ExportFormat) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let stem = format!("{}{}", self.prefix, millis);
        let ext = format.extension();

        let mut path = self.dir.join(format!("{stem}.{ext}"));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{stem}_{n}.{ext}"));
            n += 1;
        }
        path
    }
}

impl ExportSink for DirectoryExportSink {
    fn export(&self, image: &RasterImage, format: ExportFormat) -> Result<PathBuf, ExportError> {
        let bytes = encode_image(image, format)?;

        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Two exports in the same millisecond must not overwrite each other
        let path = self.next_path(format);

        std::fs::write(&path, &bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), mime = format.mime_type(), "exported image");
        Ok(path)
    }
}
