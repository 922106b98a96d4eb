//! Records produced by the order scraper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One purchased line item as it appeared on the order-history page.
///
/// Every field is the trimmed visible text of its cell, except `image_url`
/// which is the thumbnail's `src` attribute. Items with any field missing are
/// never constructed; see [`ExtractionFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPurchaseRecord {
    pub title: String,
    pub specification: String,
    pub image_url: String,
    pub price: String,
    pub status: String,
}

/// The five sub-fields read from each item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Title,
    Specification,
    ImageUrl,
    Price,
    Status,
}

impl RecordField {
    pub const ALL: [RecordField; 5] = [
        RecordField::Title,
        RecordField::Specification,
        RecordField::ImageUrl,
        RecordField::Price,
        RecordField::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Specification => "specification",
            Self::ImageUrl => "image_url",
            Self::Price => "price",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container or item that was dropped during a scrape.
///
/// `row` is `None` when the whole container could not be enumerated. Row
/// indices count the header row, so the first purchase item is row 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub container: usize,
    pub row: Option<usize>,
    pub field: Option<RecordField>,
    pub reason: String,
}

impl ExtractionFailure {
    pub fn container(container: usize, reason: impl Into<String>) -> Self {
        Self {
            container,
            row: None,
            field: None,
            reason: reason.into(),
        }
    }

    pub fn item(
        container: usize,
        row: usize,
        field: Option<RecordField>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            container,
            row: Some(row),
            field,
            reason: reason.into(),
        }
    }

    pub fn is_container_failure(&self) -> bool {
        self.row.is_none()
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, self.field) {
            (None, _) => write!(f, "container {}: {}", self.container, self.reason),
            (Some(row), Some(field)) => write!(
                f,
                "container {} row {} ({}): {}",
                self.container, row, field, self.reason
            ),
            (Some(row), None) => {
                write!(f, "container {} row {}: {}", self.container, row, self.reason)
            }
        }
    }
}
