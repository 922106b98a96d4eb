//! Error types for the browser seam, the login gate and the order scraper.

use std::time::Duration;

use crate::session::SessionState;

/// Failures reported by a [`PageDriver`](crate::PageDriver) backend.
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    /// The WebDriver server refused or failed to open a browser session.
    #[error("could not start browser session: {0}")]
    Connect(String),
    /// A WebDriver command (navigate, find, click, ...) failed.
    #[error("browser command failed: {0}")]
    Command(String),
    /// The status probe could not reach the WebDriver server.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The status probe got a non-success response.
    #[error("unexpected status {status}")]
    HttpStatus { status: u16 },
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A fixture element could not be resolved (simulated page breakage).
    #[error("fixture error: {0}")]
    Fixture(String),
}

impl From<fantoccini::error::CmdError> for DriverError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        Self::Command(e.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for DriverError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        Self::Connect(e.to_string())
    }
}

/// Reasons the login gate can fail to reach the purchase-history view.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The page never left the login/verification URLs within the bound.
    #[error("login was not completed within {}s", waited.as_secs())]
    LoginTimeout { waited: Duration },
    /// Logged in, but the purchase-history link was missing or not clickable.
    #[error("could not open purchase history via link '{link_text}'")]
    Navigation { link_text: String },
    /// An operation that needs a ready session was attempted too early.
    #[error("session is not ready (state: {state:?})")]
    NotReady { state: SessionState },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl SessionError {
    /// Stable machine-readable reason, used in reports and exit messages.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::LoginTimeout { .. } => "login_timeout",
            Self::Navigation { .. } => "navigation",
            Self::NotReady { .. } => "not_ready",
            Self::Driver(_) => "driver",
        }
    }
}

/// Page-level scrape failures. Per-item and per-container problems are not
/// errors; they are collected as [`ExtractionFailure`](crate::ExtractionFailure)s.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("order list did not render within {}s", waited.as_secs())]
    PageLoadTimeout { waited: Duration },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ScrapeError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::PageLoadTimeout { .. } => "page_load_timeout",
            Self::Driver(_) => "driver",
        }
    }
}
