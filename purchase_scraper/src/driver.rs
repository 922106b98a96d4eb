//! The narrow browser capability the gate and scraper are written against.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DriverError;

/// How to find an element on the rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// A CSS selector, evaluated relative to the search scope.
    Css(String),
    /// The exact visible text of an `<a>` element.
    LinkText(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{}`", s),
            Self::LinkText(s) => write!(f, "link text `{}`", s),
        }
    }
}

/// A page-automation backend.
///
/// Implementations own exactly one browser session. Nothing here waits:
/// bounded waiting is layered on top with [`poll_until`](crate::poll_until).
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: Clone + Send + Sync;

    /// Drop all cookies so a previous login cannot leak into this session.
    async fn clear_cookies(&self) -> Result<(), DriverError>;

    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// All elements matching `locator`, searched inside `scope` or the whole
    /// document when `scope` is `None`. No match is an empty list, not an error.
    async fn find_all(
        &self,
        scope: Option<&Self::Element>,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>, DriverError>;

    /// The first match, if any.
    async fn find(
        &self,
        scope: Option<&Self::Element>,
        locator: &Locator,
    ) -> Result<Option<Self::Element>, DriverError> {
        Ok(self.find_all(scope, locator).await?.into_iter().next())
    }

    async fn text(&self, element: &Self::Element) -> Result<String, DriverError>;

    async fn attr(&self, element: &Self::Element, name: &str)
        -> Result<Option<String>, DriverError>;

    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;

    /// Tear the session down. Called exactly once, on every exit path.
    async fn quit(self) -> Result<(), DriverError>
    where
        Self: Sized;
}
