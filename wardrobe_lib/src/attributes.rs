//! Color and size extraction from the order's specification text.
//!
//! The storefront renders the chosen SKU as loose `label:value` pairs, e.g.
//! `颜色分类:樱花粉色 尺码:M`. Labels vary by seller and values carry encoding
//! debris, so extraction is best effort and never fails.

use regex::Regex;

/// Pulls `(color, size)` out of a specification string.
pub struct AttributeExtractor {
    color_section: Regex,
    color_token: Regex,
    color_separators: Regex,
    size_section: Regex,
    size_noise: Regex,
}

impl AttributeExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            color_section: Regex::new(r"(?:颜色分类|主要颜色)[:：]([^:：]+)")?,
            // a run of non-separators ending in the "-colored" suffix
            color_token: Regex::new(r"([^\s,，]+色)")?,
            color_separators: Regex::new(r"[,，\s\-]+")?,
            size_section: Regex::new(r"尺码[:：]([^:：]+)")?,
            size_noise: Regex::new(r"[\[\]【】()]")?,
        })
    }

    /// Returns `(color, size)`; either is empty when its label is absent.
    ///
    /// The labelled segment runs up to the next colon, so in
    /// `颜色分类:樱花粉色 尺码:M` the color segment is `樱花粉色 尺码`.
    pub fn extract(&self, spec: &str) -> (String, String) {
        if spec.is_empty() {
            return (String::new(), String::new());
        }
        (self.color(spec), self.size(spec))
    }

    fn color(&self, spec: &str) -> String {
        let Some(section) = self.color_section.captures(spec).and_then(|c| c.get(1)) else {
            return String::new();
        };
        let text = section.as_str().trim();
        if let Some(m) = self.color_token.find(text) {
            return m.as_str().to_string();
        }
        // Compound names without the suffix, e.g. 浆果玫红.
        self.color_separators
            .split(text)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn size(&self, spec: &str) -> String {
        let Some(section) = self.size_section.captures(spec).and_then(|c| c.get(1)) else {
            return String::new();
        };
        let trimmed = section.as_str().trim();
        self.size_noise.replace_all(trimmed, "").into_owned()
    }
}
