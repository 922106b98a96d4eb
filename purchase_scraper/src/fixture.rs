//! Recorded-page replay backend.
//!
//! A [`PageFixture`] describes what the storefront showed during one session:
//! how the address bar changed while the user logged in, which links the
//! landing page offered, and the order-history containers that rendered after
//! the purchase-history link was clicked. [`FixtureDriver`] answers
//! [`PageDriver`] calls from that description, with time measured on the tokio
//! clock so paused-time tests are deterministic.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::driver::{Locator, PageDriver};
use crate::errors::DriverError;
use crate::scrape::OrderSelectors;
use crate::types::RecordField;

/// URL shown once the purchase-history link has been clicked.
pub const HISTORY_URL: &str = "fixture://purchase-history";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFixture {
    /// Address-bar changes after the login page is opened, in order.
    #[serde(default)]
    pub url_timeline: Vec<UrlStep>,
    /// Link texts present on the landing page.
    #[serde(default)]
    pub links: Vec<String>,
    /// Delay between clicking the history link and the orders appearing.
    #[serde(default)]
    pub render_delay_ms: u64,
    #[serde(default)]
    pub containers: Vec<ContainerFixture>,
    /// Links that are found but fail when clicked, as with an overlay.
    #[serde(default)]
    pub unclickable_links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlStep {
    pub after_ms: u64,
    pub url: String,
}

/// One date-grouped order. A header row is synthesized in front of `rows`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerFixture {
    /// Row enumeration fails for this container, as with a detached node.
    #[serde(default)]
    pub broken: bool,
    #[serde(default)]
    pub rows: Vec<RowFixture>,
}

/// One purchase item; a `None` field has no element on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowFixture {
    pub title: Option<String>,
    pub specification: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub status: Option<String>,
    /// The image element is present but has no source attribute.
    #[serde(default)]
    pub bare_image: bool,
    /// Fields whose element is present but errors when read.
    #[serde(default)]
    pub unreadable: Vec<RecordField>,
}

impl RowFixture {
    pub fn complete(
        title: &str,
        specification: &str,
        image_url: &str,
        price: &str,
        status: &str,
    ) -> Self {
        Self {
            title: Some(title.to_string()),
            specification: Some(specification.to_string()),
            image_url: Some(image_url.to_string()),
            price: Some(price.to_string()),
            status: Some(status.to_string()),
            ..Self::default()
        }
    }

    fn has_element(&self, field: RecordField) -> bool {
        self.get(field).is_some() || (field == RecordField::ImageUrl && self.bare_image)
    }

    fn check_readable(&self, field: RecordField) -> Result<(), DriverError> {
        if self.unreadable.contains(&field) {
            return Err(DriverError::Command(format!(
                "stale element reference for {}",
                field
            )));
        }
        Ok(())
    }

    fn get(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::Title => self.title.as_deref(),
            RecordField::Specification => self.specification.as_deref(),
            RecordField::ImageUrl => self.image_url.as_deref(),
            RecordField::Price => self.price.as_deref(),
            RecordField::Status => self.status.as_deref(),
        }
    }
}

impl PageFixture {
    pub fn from_json(text: &str) -> Result<Self, DriverError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Fixture(format!("read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }
}

/// Handles returned by [`FixtureDriver::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureElement {
    Link(usize),
    Container(usize),
    /// `(container, row)`; row 0 is the synthesized header.
    Row(usize, usize),
    Field(usize, usize, RecordField),
}

/// Side effects observed by the driver, for assertions after it is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    ClearedCookies,
    Navigated(String),
    Clicked(String),
    Quit,
}

/// Shared view of a driver's event log that outlives the driver.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<DriverEvent>>>);

impl Journal {
    fn push(&self, event: DriverEvent) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }

    pub fn events(&self) -> Vec<DriverEvent> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, event: &DriverEvent) -> bool {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).contains(event)
    }
}

#[derive(Debug, Default)]
struct Navigation {
    url: Option<String>,
    opened_at: Option<Instant>,
    history_opened_at: Option<Instant>,
}

pub struct FixtureDriver {
    fixture: PageFixture,
    selectors: OrderSelectors,
    nav: Mutex<Navigation>,
    journal: Journal,
}

impl FixtureDriver {
    /// `selectors` must be the ones the scraper will use; they are how the
    /// driver tells a title lookup from a price lookup.
    pub fn new(fixture: PageFixture, selectors: OrderSelectors) -> Self {
        Self {
            fixture,
            selectors,
            nav: Mutex::new(Navigation::default()),
            journal: Journal::default(),
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    fn nav(&self) -> MutexGuard<'_, Navigation> {
        self.nav.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn orders_rendered(&self) -> bool {
        let nav = self.nav();
        match nav.history_opened_at {
            Some(at) => at.elapsed() >= Duration::from_millis(self.fixture.render_delay_ms),
            None => false,
        }
    }

    fn container(&self, index: usize) -> Result<&ContainerFixture, DriverError> {
        self.fixture
            .containers
            .get(index)
            .ok_or_else(|| DriverError::Fixture(format!("no container {}", index)))
    }

    fn row(&self, container: usize, row: usize) -> Result<Option<&RowFixture>, DriverError> {
        if row == 0 {
            return Ok(None);
        }
        self.container(container)?
            .rows
            .get(row - 1)
            .map(Some)
            .ok_or_else(|| DriverError::Fixture(format!("no row {}/{}", container, row)))
    }

    fn field_for(&self, locator: &Locator) -> Option<RecordField> {
        RecordField::ALL
            .into_iter()
            .find(|f| self.selectors.field(*f) == locator)
    }
}

#[async_trait]
impl PageDriver for FixtureDriver {
    type Element = FixtureElement;

    async fn clear_cookies(&self) -> Result<(), DriverError> {
        self.journal.push(DriverEvent::ClearedCookies);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut nav = self.nav();
        nav.url = Some(url.to_string());
        nav.opened_at = Some(Instant::now());
        nav.history_opened_at = None;
        self.journal.push(DriverEvent::Navigated(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let nav = self.nav();
        if nav.history_opened_at.is_some() {
            return Ok(HISTORY_URL.to_string());
        }
        let (Some(url), Some(opened_at)) = (nav.url.as_ref(), nav.opened_at) else {
            return Ok("about:blank".to_string());
        };
        let elapsed = opened_at.elapsed();
        let current = self
            .fixture
            .url_timeline
            .iter()
            .filter(|step| elapsed >= Duration::from_millis(step.after_ms))
            .last()
            .map(|step| step.url.clone())
            .unwrap_or_else(|| url.clone());
        Ok(current)
    }

    async fn find_all(
        &self,
        scope: Option<&FixtureElement>,
        locator: &Locator,
    ) -> Result<Vec<FixtureElement>, DriverError> {
        match (scope, locator) {
            (None, Locator::LinkText(text)) => Ok(self
                .fixture
                .links
                .iter()
                .position(|l| l == text)
                .map(FixtureElement::Link)
                .into_iter()
                .collect()),
            (None, l) if *l == self.selectors.container => {
                if !self.orders_rendered() {
                    return Ok(Vec::new());
                }
                Ok((0..self.fixture.containers.len())
                    .map(FixtureElement::Container)
                    .collect())
            }
            (Some(FixtureElement::Container(ci)), l) if *l == self.selectors.row => {
                let container = self.container(*ci)?;
                if container.broken {
                    return Err(DriverError::Fixture(format!(
                        "stale element reference for container {}",
                        ci
                    )));
                }
                Ok((0..=container.rows.len())
                    .map(|ri| FixtureElement::Row(*ci, ri))
                    .collect())
            }
            (Some(FixtureElement::Row(ci, ri)), l) => {
                let Some(field) = self.field_for(l) else {
                    return Ok(Vec::new());
                };
                let present = self
                    .row(*ci, *ri)?
                    .is_some_and(|row| row.has_element(field));
                Ok(if present {
                    vec![FixtureElement::Field(*ci, *ri, field)]
                } else {
                    Vec::new()
                })
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn text(&self, element: &FixtureElement) -> Result<String, DriverError> {
        match element {
            FixtureElement::Link(i) => Ok(self.fixture.links[*i].clone()),
            FixtureElement::Field(ci, ri, field) => {
                let missing = || DriverError::Fixture(format!("no {} at {}/{}", field, ci, ri));
                let row = self.row(*ci, *ri)?.ok_or_else(missing)?;
                row.check_readable(*field)?;
                row.get(*field).map(str::to_string).ok_or_else(missing)
            }
            _ => Ok(String::new()),
        }
    }

    async fn attr(
        &self,
        element: &FixtureElement,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        match element {
            FixtureElement::Field(ci, ri, RecordField::ImageUrl)
                if name == self.selectors.image_attr =>
            {
                let Some(row) = self.row(*ci, *ri)? else {
                    return Ok(None);
                };
                row.check_readable(RecordField::ImageUrl)?;
                Ok(row.image_url.clone())
            }
            _ => Ok(None),
        }
    }

    async fn click(&self, element: &FixtureElement) -> Result<(), DriverError> {
        let FixtureElement::Link(i) = element else {
            return Ok(());
        };
        let text = self.fixture.links[*i].clone();
        if self.fixture.unclickable_links.contains(&text) {
            return Err(DriverError::Command(format!(
                "element click intercepted: '{}'",
                text
            )));
        }
        self.nav().history_opened_at = Some(Instant::now());
        self.journal.push(DriverEvent::Clicked(text));
        Ok(())
    }

    async fn quit(self) -> Result<(), DriverError> {
        self.journal.push(DriverEvent::Quit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_json_defaults() {
        let fx =
            PageFixture::from_json(r#"{"containers":[{"rows":[{"title":"T"}]}]}"#).unwrap();
        assert!(fx.url_timeline.is_empty());
        assert!(fx.links.is_empty());
        assert!(!fx.containers[0].broken);
        assert_eq!(fx.containers[0].rows[0].title.as_deref(), Some("T"));
        assert!(fx.containers[0].rows[0].price.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn url_follows_timeline() {
        let fx = PageFixture {
            url_timeline: vec![
                UrlStep {
                    after_ms: 1000,
                    url: "https://login.example/verify".into(),
                },
                UrlStep {
                    after_ms: 3000,
                    url: "https://home.example/".into(),
                },
            ],
            ..PageFixture::default()
        };
        let driver = FixtureDriver::new(fx, OrderSelectors::default());
        assert_eq!(driver.current_url().await.unwrap(), "about:blank");
        driver.goto("https://login.example/").await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://login.example/");
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(driver.current_url().await.unwrap(), "https://login.example/verify");
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(driver.current_url().await.unwrap(), "https://home.example/");
    }

    #[tokio::test]
    async fn containers_hidden_until_history_clicked() {
        let sel = OrderSelectors::default();
        let fx = PageFixture {
            links: vec!["已买到的宝贝".into()],
            containers: vec![ContainerFixture::default()],
            ..PageFixture::default()
        };
        let driver = FixtureDriver::new(fx, sel.clone());
        assert!(driver.find_all(None, &sel.container).await.unwrap().is_empty());

        let link = driver
            .find(None, &Locator::link_text("已买到的宝贝"))
            .await
            .unwrap()
            .unwrap();
        driver.click(&link).await.unwrap();
        assert_eq!(driver.find_all(None, &sel.container).await.unwrap().len(), 1);
        assert_eq!(driver.current_url().await.unwrap(), HISTORY_URL);
    }

    #[tokio::test]
    async fn missing_field_has_no_element() {
        let sel = OrderSelectors::default();
        let fx = PageFixture {
            containers: vec![ContainerFixture {
                broken: false,
                rows: vec![RowFixture {
                    title: Some("T".into()),
                    ..RowFixture::default()
                }],
            }],
            ..PageFixture::default()
        };
        let driver = FixtureDriver::new(fx, sel.clone());
        let row = FixtureElement::Row(0, 1);
        assert_eq!(driver.find_all(Some(&row), &sel.title).await.unwrap().len(), 1);
        assert!(driver.find_all(Some(&row), &sel.price).await.unwrap().is_empty());
        let header = FixtureElement::Row(0, 0);
        assert!(driver.find_all(Some(&header), &sel.title).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quit_is_journaled() {
        let driver = FixtureDriver::new(PageFixture::default(), OrderSelectors::default());
        let journal = driver.journal();
        driver.quit().await.unwrap();
        assert_eq!(journal.events(), vec![DriverEvent::Quit]);
    }

    #[tokio::test]
    async fn bare_image_has_element_but_no_source() {
        let sel = OrderSelectors::default();
        let fx = PageFixture {
            containers: vec![ContainerFixture {
                broken: false,
                rows: vec![RowFixture {
                    bare_image: true,
                    unreadable: vec![RecordField::Status],
                    status: Some("交易成功".into()),
                    ..RowFixture::default()
                }],
            }],
            ..PageFixture::default()
        };
        let driver = FixtureDriver::new(fx, sel.clone());
        let row = FixtureElement::Row(0, 1);
        let image = driver.find(Some(&row), &sel.image).await.unwrap().unwrap();
        assert_eq!(driver.attr(&image, "src").await.unwrap(), None);
        let status = driver.find(Some(&row), &sel.status).await.unwrap().unwrap();
        assert!(matches!(
            driver.text(&status).await,
            Err(DriverError::Command(_))
        ));
    }

    #[tokio::test]
    async fn unclickable_link_errors_without_navigating() {
        let fx = PageFixture {
            links: vec!["已买到的宝贝".into()],
            unclickable_links: vec!["已买到的宝贝".into()],
            ..PageFixture::default()
        };
        let driver = FixtureDriver::new(fx, OrderSelectors::default());
        let journal = driver.journal();
        let link = driver
            .find(None, &Locator::link_text("已买到的宝贝"))
            .await
            .unwrap()
            .unwrap();
        assert!(driver.click(&link).await.is_err());
        assert!(journal.events().is_empty());
        assert_eq!(driver.current_url().await.unwrap(), "about:blank");
    }
}
