//! Aspect-ratio presets offered while cropping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A selectable aspect constraint for the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectPreset {
    /// No constraint.
    #[default]
    Free,
    Square,
    Portrait3x4,
    Landscape4x3,
    Portrait9x16,
    Landscape16x9,
    Portrait2x3,
    Landscape3x2,
}

impl AspectPreset {
    /// All presets in the order they are offered.
    pub const ALL: [AspectPreset; 8] = [
        AspectPreset::Free,
        AspectPreset::Square,
        AspectPreset::Portrait3x4,
        AspectPreset::Landscape4x3,
        AspectPreset::Portrait9x16,
        AspectPreset::Landscape16x9,
        AspectPreset::Portrait2x3,
        AspectPreset::Landscape3x2,
    ];

    /// Width divided by height, or `None` for free.
    pub fn ratio(self) -> Option<f32> {
        match self {
            AspectPreset::Free => None,
            AspectPreset::Square => Some(1.0),
            AspectPreset::Portrait3x4 => Some(3.0 / 4.0),
            AspectPreset::Landscape4x3 => Some(4.0 / 3.0),
            AspectPreset::Portrait9x16 => Some(9.0 / 16.0),
            AspectPreset::Landscape16x9 => Some(16.0 / 9.0),
            AspectPreset::Portrait2x3 => Some(2.0 / 3.0),
            AspectPreset::Landscape3x2 => Some(3.0 / 2.0),
        }
    }

    /// Short human-readable label, e.g. `"16:9"`.
    pub fn label(self) -> &'static str {
        match self {
            AspectPreset::Free => "Free",
            AspectPreset::Square => "1:1",
            AspectPreset::Portrait3x4 => "3:4",
            AspectPreset::Landscape4x3 => "4:3",
            AspectPreset::Portrait9x16 => "9:16",
            AspectPreset::Landscape16x9 => "16:9",
            AspectPreset::Portrait2x3 => "2:3",
            AspectPreset::Landscape3x2 => "3:2",
        }
    }
}

impl fmt::Display for AspectPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown preset label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown aspect preset: {0}")]
pub struct ParseAspectError(pub String);

impl FromStr for AspectPreset {
    type Err = ParseAspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AspectPreset::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseAspectError(s.to_string()))
    }
}
