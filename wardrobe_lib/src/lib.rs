//! Purchase-history harvesting and garment classification.
//!
//! [`pipeline::harvest`] drives a [`purchase_scraper::PageDriver`] through
//! login and the order page; [`Normalizer`] turns each raw record into a
//! [`NormalizedGarment`] and decides whether it is usable clothing.

pub mod attributes;
pub mod config;
pub mod error;
pub mod garment;
pub mod normalize;
pub mod pipeline;
pub mod taxonomy;

pub use purchase_scraper;

pub use attributes::AttributeExtractor;
pub use config::{ConfigError, WardrobeConfig};
pub use error::WardrobeError;
pub use garment::{ExposureLevel, GarmentType, NormalizedGarment};
pub use normalize::{is_usable, normalize_title, upgrade_image_url, Normalizer};
pub use pipeline::{harvest, HarvestPlan, HarvestReport, HarvestSummary};
pub use taxonomy::{Taxonomy, TaxonomyError, TitleClass};
