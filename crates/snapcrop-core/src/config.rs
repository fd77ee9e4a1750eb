//! Editor configuration.
//!
//! Stored as pretty-printed JSON. Missing fields fall back to their defaults,
//! so a config written by an older build still loads.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodeLimits;
use crate::encode::ExportFormat;
use crate::geometry::{DEFAULT_MIN_CROP_SIZE, DEFAULT_RESIZE_HANDLE_SIZE};

/// Errors that can occur while reading or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for an [`EditSession`](crate::session::EditSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Smallest crop side length in view-space pixels.
    pub min_crop_size: f32,
    /// Half-extent of the bottom-right resize touch target.
    pub resize_handle_size: f32,
    pub max_decode_width: Option<u32>,
    pub max_decode_height: Option<u32>,
    /// Maximum undo depth; `None` keeps every snapshot.
    pub history_limit: Option<usize>,
    pub jpeg_quality: u8,
    /// File name prefix used by the directory export sink.
    pub export_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_crop_size: DEFAULT_MIN_CROP_SIZE,
            resize_handle_size: DEFAULT_RESIZE_HANDLE_SIZE,
            max_decode_width: Some(2000),
            max_decode_height: Some(2000),
            history_limit: Some(32),
            jpeg_quality: 95,
            export_prefix: "EDIT_".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load from `path`, keeping defaults if the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded editor config");
                config
            }
            Err(e) => {
                tracing::info!(path = %path.display(), error = %e, "using default editor config");
                Self::default()
            }
        }
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_width: self.max_decode_width,
            max_height: self.max_decode_height,
        }
    }

    /// JPEG at the configured quality.
    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::Jpeg {
            quality: self.jpeg_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.min_crop_size, 120.0);
        assert_eq!(config.resize_handle_size, 60.0);
        assert_eq!(config.history_limit, Some(32));
        assert_eq!(config.decode_limits(), DecodeLimits::new(2000, 2000));
        assert_eq!(config.export_format(), ExportFormat::Jpeg { quality: 95 });
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapcrop.json");

        let config = EditorConfig {
            history_limit: None,
            export_prefix: "CROP_".to_string(),
            ..EditorConfig::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = EditorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "jpeg_quality": 80 }"#).unwrap();

        let loaded = EditorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.jpeg_quality, 80);
        assert_eq!(loaded.min_crop_size, 120.0);
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(EditorConfig::load_from_file(&path), Err(ConfigError::Json(_))));
        assert_eq!(EditorConfig::load_or_default(&path), EditorConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/snapcrop.json");
        assert!(matches!(EditorConfig::load_from_file(path), Err(ConfigError::Io(_))));
    }
}
