//! Normalized garment rows handed to the recommendation side.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse garment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentType {
    Top,
    Bottom,
    DressOrJumpsuit,
    Accessory,
    Unknown,
}

impl GarmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::DressOrJumpsuit => "dress_or_jumpsuit",
            Self::Accessory => "accessory",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GarmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much skin the garment shows, judged from its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl ExposureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ExposureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase record after title cleanup, attribute extraction and
/// classification. Built by [`Normalizer`](crate::normalize::Normalizer);
/// to change a field, re-derive from the raw record.
///
/// Serialize-only: rows are written out, never read back. The fields are
/// public, so a hand-built value carries no guarantee; `is_clothing` is not
/// trusted and [`is_usable`](crate::normalize::is_usable) re-checks the
/// fields themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedGarment {
    pub title: String,
    pub specification: String,
    pub image_url: String,
    pub price: String,
    pub status: String,
    #[serde(rename = "type")]
    pub garment_type: GarmentType,
    pub style: String,
    pub exposure_level: ExposureLevel,
    pub color: String,
    pub size: String,
    pub is_clothing: bool,
}
