//! TOML configuration with defaults for every field.
//!
//! ```toml
//! [webdriver]
//! url = "http://localhost:9515"
//!
//! [session]
//! login_timeout_secs = 300
//!
//! [scrape]
//! max_wait_secs = 10
//! title = 'p[data-reactid*="0.0.1.0"]'
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use purchase_scraper::{BrowserOptions, Locator, OrderSelectors, SessionConfig};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::taxonomy::{Taxonomy, TaxonomyError};

/// Environment variable overriding `[webdriver] url`.
pub const WEBDRIVER_URL_ENV: &str = "WARDROBE_WEBDRIVER_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WardrobeConfig {
    pub webdriver: WebDriverSection,
    pub session: SessionSection,
    pub scrape: ScrapeSection,
    pub taxonomy: TaxonomySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebDriverSection {
    pub url: String,
    pub headless: bool,
    pub args: Vec<String>,
}

impl Default for WebDriverSection {
    fn default() -> Self {
        let opts = BrowserOptions::default();
        Self {
            url: opts.webdriver_url,
            headless: opts.headless,
            args: opts.args,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub login_url: String,
    pub history_link_text: String,
    pub login_timeout_secs: u64,
    pub settle_secs: u64,
    pub navigation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub blocked_url_markers: Vec<String>,
}

impl Default for SessionSection {
    fn default() -> Self {
        let s = SessionConfig::default();
        Self {
            login_url: s.login_url,
            history_link_text: s.history_link_text,
            login_timeout_secs: s.login_timeout.as_secs(),
            settle_secs: s.settle_delay.as_secs(),
            navigation_timeout_secs: s.navigation_timeout.as_secs(),
            poll_interval_ms: s.poll_interval.as_millis() as u64,
            blocked_url_markers: s.blocked_url_markers,
        }
    }
}

/// Order-page locators are plain CSS selectors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeSection {
    pub max_wait_secs: u64,
    /// Requested history window. Only the first rendered page is read, so
    /// this is reported but does not limit or extend the scrape.
    pub window_days: u32,
    pub container: String,
    pub row: String,
    pub title: String,
    pub specification: String,
    pub image: String,
    pub image_attr: String,
    pub price: String,
    pub status: String,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        let sel = OrderSelectors::default();
        Self {
            max_wait_secs: 10,
            window_days: 30,
            container: css_of(&sel.container),
            row: css_of(&sel.row),
            title: css_of(&sel.title),
            specification: css_of(&sel.specification),
            image: css_of(&sel.image),
            image_attr: sel.image_attr,
            price: css_of(&sel.price),
            status: css_of(&sel.status),
        }
    }
}

fn css_of(locator: &Locator) -> String {
    match locator {
        Locator::Css(s) | Locator::LinkText(s) => s.clone(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaxonomySection {
    /// Replacement keyword tables; the built-in tables are used when unset.
    pub path: Option<PathBuf>,
}

impl WardrobeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` if given (defaults otherwise), apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(WEBDRIVER_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.webdriver.url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.webdriver.url).map_err(|e| ConfigError::Invalid {
            field: "webdriver.url",
            message: e.to_string(),
        })?;
        Url::parse(&self.session.login_url).map_err(|e| ConfigError::Invalid {
            field: "session.login_url",
            message: e.to_string(),
        })?;
        non_zero("session.login_timeout_secs", self.session.login_timeout_secs)?;
        non_zero("session.navigation_timeout_secs", self.session.navigation_timeout_secs)?;
        non_zero("session.poll_interval_ms", self.session.poll_interval_ms)?;
        non_zero("scrape.max_wait_secs", self.scrape.max_wait_secs)?;
        if self.session.poll_interval_ms > self.session.login_timeout_secs.saturating_mul(1000) {
            return Err(ConfigError::Invalid {
                field: "session.poll_interval_ms",
                message: "poll interval is longer than the login timeout".to_string(),
            });
        }
        if self.session.history_link_text.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "session.history_link_text",
                message: "must not be empty".to_string(),
            });
        }
        if self.session.blocked_url_markers.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::Invalid {
                field: "session.blocked_url_markers",
                message: "an empty marker would block every URL".to_string(),
            });
        }
        Ok(())
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            webdriver_url: self.webdriver.url.clone(),
            headless: self.webdriver.headless,
            args: self.webdriver.args.clone(),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let s = &self.session;
        SessionConfig {
            login_url: s.login_url.clone(),
            history_link_text: s.history_link_text.clone(),
            login_timeout: Duration::from_secs(s.login_timeout_secs),
            settle_delay: Duration::from_secs(s.settle_secs),
            navigation_timeout: Duration::from_secs(s.navigation_timeout_secs),
            poll_interval: Duration::from_millis(s.poll_interval_ms),
            blocked_url_markers: s.blocked_url_markers.clone(),
        }
    }

    pub fn order_selectors(&self) -> OrderSelectors {
        let s = &self.scrape;
        OrderSelectors {
            container: Locator::css(s.container.as_str()),
            row: Locator::css(s.row.as_str()),
            title: Locator::css(s.title.as_str()),
            specification: Locator::css(s.specification.as_str()),
            image: Locator::css(s.image.as_str()),
            image_attr: s.image_attr.clone(),
            price: Locator::css(s.price.as_str()),
            status: Locator::css(s.status.as_str()),
        }
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.scrape.max_wait_secs)
    }

    pub fn taxonomy(&self) -> Result<Taxonomy, TaxonomyError> {
        match &self.taxonomy.path {
            Some(path) => Taxonomy::from_path(path),
            None => Taxonomy::builtin(),
        }
    }
}

fn non_zero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
