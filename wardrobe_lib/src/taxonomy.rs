//! Keyword tables mapping product titles to category, exposure and style.
//!
//! The tables are data, loaded from YAML (the built-in copy is embedded at
//! compile time), and evaluated first-match-wins in file order.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::garment::{ExposureLevel, GarmentType};

/// Style returned when no style keyword is present.
pub const UNKNOWN_STYLE: &str = "unknown";

/// Error types for loading keyword tables.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Failed to parse taxonomy YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read taxonomy file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Tag '{0}' appears more than once")]
    DuplicateTag(String),
    #[error("Tag '{0}' is the fallback and cannot have keywords")]
    ReservedTag(String),
    #[error("Tag '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

/// One `(keyword-set, tag)` row.
#[derive(Deserialize, Debug, Clone)]
pub struct Rule<T> {
    pub tag: T,
    pub keywords: Vec<String>,
}

impl<T> Rule<T> {
    fn matches(&self, title: &str) -> bool {
        self.keywords.iter().any(|kw| title.contains(kw.as_str()))
    }
}

#[derive(Deserialize, Debug)]
struct TaxonomyFile {
    categories: Vec<Rule<GarmentType>>,
    exposure: Vec<Rule<ExposureLevel>>,
    styles: Vec<String>,
}

/// Result of classifying one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleClass {
    pub garment_type: GarmentType,
    pub exposure_level: ExposureLevel,
    pub style: String,
}

/// Validated keyword tables.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Rule<GarmentType>>,
    exposure: Vec<Rule<ExposureLevel>>,
    styles: Vec<String>,
}

impl Taxonomy {
    /// The tables shipped in `seed_data/taxonomy.yml`.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        Self::from_yaml(include_str!("../../seed_data/taxonomy.yml"))
    }

    pub fn from_path(path: &Path) -> Result<Self, TaxonomyError> {
        let text = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse and validate keyword tables.
    ///
    /// Rejects duplicate tags, rows tagged with the `unknown` fallback, and
    /// empty keywords (which would match every title).
    pub fn from_yaml(yaml: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = serde_yml::from_str(yaml)?;

        validate_rules(&file.categories, GarmentType::Unknown, |t| t.as_str())?;
        validate_rules(&file.exposure, ExposureLevel::Unknown, |t| t.as_str())?;
        if file.styles.iter().any(|s| s.trim().is_empty()) {
            return Err(TaxonomyError::EmptyKeyword("styles".to_string()));
        }

        Ok(Self {
            categories: file.categories,
            exposure: file.exposure,
            styles: file.styles,
        })
    }

    pub fn garment_type(&self, title: &str) -> GarmentType {
        first_match(&self.categories, title).unwrap_or(GarmentType::Unknown)
    }

    pub fn exposure_level(&self, title: &str) -> ExposureLevel {
        first_match(&self.exposure, title).unwrap_or(ExposureLevel::Unknown)
    }

    /// First style keyword *in table order* that the title contains.
    pub fn style(&self, title: &str) -> String {
        self.styles
            .iter()
            .find(|kw| title.contains(kw.as_str()))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_STYLE.to_string())
    }

    pub fn classify(&self, title: &str) -> TitleClass {
        TitleClass {
            garment_type: self.garment_type(title),
            exposure_level: self.exposure_level(title),
            style: self.style(title),
        }
    }

    pub fn categories(&self) -> &[Rule<GarmentType>] {
        &self.categories
    }
}

fn first_match<T: Copy>(rules: &[Rule<T>], title: &str) -> Option<T> {
    rules.iter().find(|r| r.matches(title)).map(|r| r.tag)
}

fn validate_rules<T, F>(rules: &[Rule<T>], fallback: T, name: F) -> Result<(), TaxonomyError>
where
    T: Copy + PartialEq + Eq + std::hash::Hash,
    F: Fn(&T) -> &'static str,
{
    let mut seen = HashSet::new();
    for rule in rules {
        if rule.tag == fallback {
            return Err(TaxonomyError::ReservedTag(name(&rule.tag).to_string()));
        }
        if !seen.insert(rule.tag) {
            return Err(TaxonomyError::DuplicateTag(name(&rule.tag).to_string()));
        }
        if rule.keywords.iter().any(|kw| kw.is_empty()) {
            return Err(TaxonomyError::EmptyKeyword(name(&rule.tag).to_string()));
        }
    }
    Ok(())
}
