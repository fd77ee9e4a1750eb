//! Errors surfaced by the edit session.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::export::ExportError;
use crate::geometry::GeometryError;

/// Errors returned by [`EditSession`](crate::session::EditSession) operations.
///
/// None of these leave the session in a changed state.
#[derive(Debug, Error)]
pub enum EditError {
    /// The crop rectangle collapses under pixel rounding.
    #[error("Crop region is too small")]
    CropTooSmall,

    #[error("Failed to load image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to export image: {0}")]
    Export(#[from] ExportError),

    /// The operation needs a committed image but a crop is in progress.
    #[error("Finish or cancel the crop first")]
    NotInNormalMode,
}

impl From<GeometryError> for EditError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::CropTooSmall => EditError::CropTooSmall,
        }
    }
}
