//! Order-history traversal: containers → rows → five fields per row.

use std::time::Duration;

use crate::driver::{Locator, PageDriver};
use crate::errors::{DriverError, ScrapeError};
use crate::poll::poll_until;
use crate::types::{ExtractionFailure, RawPurchaseRecord, RecordField};

/// Locators for the order-history page layout.
///
/// Field locators are evaluated inside a single item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSelectors {
    /// One per date-grouped order.
    pub container: Locator,
    /// Rows inside a container; the first one is the order header.
    pub row: Locator,
    pub title: Locator,
    pub specification: Locator,
    pub image: Locator,
    /// Attribute of the image element holding its URL.
    pub image_attr: String,
    pub price: Locator,
    pub status: Locator,
}

impl Default for OrderSelectors {
    fn default() -> Self {
        Self {
            container: Locator::css(".index-mod__order-container___1ur4-"),
            row: Locator::css("tbody"),
            title: Locator::css(r#"p[data-reactid*="0.0.1.0"]"#),
            specification: Locator::css(r#"p[data-reactid*="0.0.1.1"]"#),
            image: Locator::css(".production-mod__pic___2Wuak img"),
            image_attr: "src".to_string(),
            price: Locator::css(r#"p[data-reactid*="1.0.1"]"#),
            status: Locator::css(r#"td[class*="sol-mod__no-br"] + td + td + td"#),
        }
    }
}

impl OrderSelectors {
    pub fn field(&self, field: RecordField) -> &Locator {
        match field {
            RecordField::Title => &self.title,
            RecordField::Specification => &self.specification,
            RecordField::ImageUrl => &self.image,
            RecordField::Price => &self.price,
            RecordField::Status => &self.status,
        }
    }
}

/// What one pass over the rendered page produced.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    /// Parsed items in page order, not deduplicated.
    pub records: Vec<RawPurchaseRecord>,
    /// Containers and items that were skipped, in the order they were hit.
    pub failures: Vec<ExtractionFailure>,
    pub containers_seen: usize,
}

/// Reads the currently rendered order-history page.
///
/// Obtained from a ready [`SessionGate`](crate::SessionGate). Only the page
/// that is on screen is read; there is no pagination.
pub struct OrderScraper<'a, D: PageDriver> {
    driver: &'a D,
    selectors: OrderSelectors,
    poll_interval: Duration,
}

enum ItemError {
    /// No element for the field in the row.
    Missing(RecordField),
    /// The element is there but lacks the attribute holding the value.
    MissingAttr(RecordField),
    Driver(RecordField, DriverError),
}

impl<'a, D: PageDriver> OrderScraper<'a, D> {
    pub(crate) fn new(driver: &'a D, selectors: OrderSelectors, poll_interval: Duration) -> Self {
        Self {
            driver,
            selectors,
            poll_interval,
        }
    }

    pub fn selectors(&self) -> &OrderSelectors {
        &self.selectors
    }

    /// Wait up to `max_wait` for the order list, then read every item.
    ///
    /// A broken item or container is logged, recorded in
    /// [`ScrapeOutcome::failures`], and skipped. Only a missing order list or
    /// a failure to enumerate the containers themselves is an error.
    pub async fn scrape(&self, max_wait: Duration) -> Result<ScrapeOutcome, ScrapeError> {
        let driver = self.driver;
        let container_locator = &self.selectors.container;
        let containers = poll_until(max_wait, self.poll_interval, || async move {
            let found = driver.find_all(None, container_locator).await?;
            Ok((!found.is_empty()).then_some(found))
        })
        .await?
        .ok_or(ScrapeError::PageLoadTimeout { waited: max_wait })?;

        tracing::info!("Found {} order groups", containers.len());

        let mut outcome = ScrapeOutcome {
            containers_seen: containers.len(),
            ..ScrapeOutcome::default()
        };

        for (ci, container) in containers.iter().enumerate() {
            let rows = match driver.find_all(Some(container), &self.selectors.row).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!("Skipping order group {}: {}", ci, e);
                    outcome
                        .failures
                        .push(ExtractionFailure::container(ci, e.to_string()));
                    continue;
                }
            };

            // Row 0 is the order header (date, order number, shop).
            for (ri, row) in rows.iter().enumerate().skip(1) {
                match self.read_item(row).await {
                    Ok(record) => outcome.records.push(record),
                    Err(err) => {
                        let (field, reason) = self.describe(err);
                        tracing::warn!("Skipping item {}/{}: {}: {}", ci, ri, field, reason);
                        outcome
                            .failures
                            .push(ExtractionFailure::item(ci, ri, Some(field), reason));
                    }
                }
            }
        }

        tracing::info!(
            "Scraped {} items ({} skipped)",
            outcome.records.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    async fn read_item(&self, row: &D::Element) -> Result<RawPurchaseRecord, ItemError> {
        Ok(RawPurchaseRecord {
            title: self.read_text(row, RecordField::Title).await?,
            specification: self.read_text(row, RecordField::Specification).await?,
            image_url: self.read_image(row).await?,
            price: self.read_text(row, RecordField::Price).await?,
            status: self.read_text(row, RecordField::Status).await?,
        })
    }

    async fn locate(&self, row: &D::Element, field: RecordField) -> Result<D::Element, ItemError> {
        self.driver
            .find(Some(row), self.selectors.field(field))
            .await
            .map_err(|e| ItemError::Driver(field, e))?
            .ok_or(ItemError::Missing(field))
    }

    async fn read_text(&self, row: &D::Element, field: RecordField) -> Result<String, ItemError> {
        let element = self.locate(row, field).await?;
        let text = self
            .driver
            .text(&element)
            .await
            .map_err(|e| ItemError::Driver(field, e))?;
        Ok(text.trim().to_string())
    }

    async fn read_image(&self, row: &D::Element) -> Result<String, ItemError> {
        let field = RecordField::ImageUrl;
        let element = self.locate(row, field).await?;
        self.driver
            .attr(&element, &self.selectors.image_attr)
            .await
            .map_err(|e| ItemError::Driver(field, e))?
            .ok_or(ItemError::MissingAttr(field))
    }

    fn describe(&self, err: ItemError) -> (RecordField, String) {
        match err {
            ItemError::Missing(field) => (field, "element not found".to_string()),
            ItemError::MissingAttr(field) => (
                field,
                format!("attribute `{}` missing", self.selectors.image_attr),
            ),
            ItemError::Driver(field, e) => (field, e.to_string()),
        }
    }
}
