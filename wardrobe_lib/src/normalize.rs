//! Raw record → normalized garment, and the usability gate.

use purchase_scraper::RawPurchaseRecord;

use crate::attributes::AttributeExtractor;
use crate::error::WardrobeError;
use crate::garment::{GarmentType, NormalizedGarment};
use crate::taxonomy::Taxonomy;

/// Marker the order page appends to titles that link to a trade snapshot.
pub const SNAPSHOT_MARKER: &str = "[交易快照]";
const THUMBNAIL_SUFFIX: &str = "_80x80.jpg";
const FULL_IMAGE_SUFFIX: &str = "_640x640.jpg";

/// Strip trailing snapshot markers and surrounding whitespace.
pub fn normalize_title(title: &str) -> String {
    let mut rest = title.trim();
    while let Some(stripped) = rest.strip_suffix(SNAPSHOT_MARKER) {
        rest = stripped.trim_end();
    }
    rest.to_string()
}

/// Point an 80x80 thumbnail at the 640x640 rendition of the same image.
/// Any other URL is returned unchanged.
pub fn upgrade_image_url(url: &str) -> String {
    match url.strip_suffix(THUMBNAIL_SUFFIX) {
        Some(stem) => format!("{}{}", stem, FULL_IMAGE_SUFFIX),
        None => url.to_string(),
    }
}

/// A garment is usable only when it has a known type, a color and a size.
pub fn is_usable(garment: &NormalizedGarment) -> bool {
    usable_parts(garment.garment_type, &garment.color, &garment.size)
}

fn usable_parts(garment_type: GarmentType, color: &str, size: &str) -> bool {
    garment_type != GarmentType::Unknown && !color.is_empty() && !size.is_empty()
}

/// Attribute extraction plus title classification.
pub struct Normalizer {
    extractor: AttributeExtractor,
    taxonomy: Taxonomy,
}

impl Normalizer {
    pub fn new(taxonomy: Taxonomy) -> Result<Self, WardrobeError> {
        let extractor = AttributeExtractor::new()
            .map_err(|e| WardrobeError::Internal(format!("attribute patterns: {}", e)))?;
        Ok(Self {
            extractor,
            taxonomy,
        })
    }

    /// Normalizer over the built-in keyword tables.
    pub fn builtin() -> Result<Self, WardrobeError> {
        Self::new(Taxonomy::builtin()?)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Derive the normalized garment for one record. Pure and total.
    pub fn normalize(&self, raw: &RawPurchaseRecord) -> NormalizedGarment {
        let title = normalize_title(&raw.title);
        let (color, size) = self.extractor.extract(&raw.specification);
        let class = self.taxonomy.classify(&title);
        let is_clothing = usable_parts(class.garment_type, &color, &size);

        NormalizedGarment {
            title,
            specification: raw.specification.clone(),
            image_url: upgrade_image_url(&raw.image_url),
            price: raw.price.clone(),
            status: raw.status.clone(),
            garment_type: class.garment_type,
            style: class.style,
            exposure_level: class.exposure_level,
            color,
            size,
            is_clothing,
        }
    }

    /// Normalize every record, keeping page order.
    pub fn normalize_all(&self, records: &[RawPurchaseRecord]) -> Vec<NormalizedGarment> {
        records.iter().map(|r| self.normalize(r)).collect()
    }

    /// Normalize and keep only usable clothing.
    pub fn usable(&self, records: &[RawPurchaseRecord]) -> Vec<NormalizedGarment> {
        records
            .iter()
            .map(|r| self.normalize(r))
            .filter(is_usable)
            .collect()
    }
}
