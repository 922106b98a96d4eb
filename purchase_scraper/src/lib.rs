//! Session-gated scraping of a storefront's purchase history.
//!
//! Everything that touches a rendered page goes through [`PageDriver`], so the
//! login gate and the order scraper run unchanged against a live WebDriver
//! browser or a recorded page fixture.

mod driver;
mod errors;
pub mod fixture;
mod poll;
mod scrape;
mod session;
pub mod types;
pub mod webdriver;

pub use self::driver::{Locator, PageDriver};
pub use self::errors::{DriverError, ScrapeError, SessionError};
pub use self::fixture::{DriverEvent, FixtureDriver, Journal, PageFixture};
pub use self::poll::poll_until;
pub use self::scrape::{OrderScraper, OrderSelectors, ScrapeOutcome};
pub use self::session::{SessionConfig, SessionGate, SessionState};
pub use self::types::{ExtractionFailure, RawPurchaseRecord, RecordField};
pub use self::webdriver::{probe_status, BrowserOptions, DriverStatus, WebDriverSession};
