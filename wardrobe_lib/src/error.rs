//! Error types for the library layer.

use std::fmt;

use purchase_scraper::{DriverError, ScrapeError, SessionError};

use crate::config::ConfigError;
use crate::taxonomy::TaxonomyError;

/// Errors produced by the library layer, wrapping browser, login and scrape
/// failures and adding configuration and keyword-table problems.
#[derive(Debug)]
pub enum WardrobeError {
    /// Login never completed or the purchase-history link was not reachable.
    Session(SessionError),
    /// The order list never rendered.
    Scrape(ScrapeError),
    /// The browser backend could not be started or stopped.
    Driver(DriverError),
    Config(ConfigError),
    Taxonomy(TaxonomyError),
    /// A bug rather than an environmental failure.
    Internal(String),
}

impl WardrobeError {
    /// Stable reason string, so callers can tell "never logged in" from
    /// "page layout changed" without matching on variants.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Session(e) => e.reason(),
            Self::Scrape(e) => e.reason(),
            Self::Driver(_) => "driver",
            Self::Config(_) => "config",
            Self::Taxonomy(_) => "taxonomy",
            Self::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for WardrobeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "Session error: {}", e),
            Self::Scrape(e) => write!(f, "Scrape error: {}", e),
            Self::Driver(e) => write!(f, "Browser error: {}", e),
            Self::Config(e) => write!(f, "Config error: {}", e),
            Self::Taxonomy(e) => write!(f, "Taxonomy error: {}", e),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for WardrobeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            Self::Scrape(e) => Some(e),
            Self::Driver(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Taxonomy(e) => Some(e),
            Self::Internal(_) => None,
        }
    }
}

impl From<SessionError> for WardrobeError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<ScrapeError> for WardrobeError {
    fn from(e: ScrapeError) -> Self {
        Self::Scrape(e)
    }
}

impl From<DriverError> for WardrobeError {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

impl From<ConfigError> for WardrobeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TaxonomyError> for WardrobeError {
    fn from(e: TaxonomyError) -> Self {
        Self::Taxonomy(e)
    }
}
