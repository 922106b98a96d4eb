//! One harvest: log in, read the order page, close the browser, classify.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use purchase_scraper::{
    ExtractionFailure, OrderSelectors, PageDriver, RawPurchaseRecord, ScrapeOutcome,
    SessionConfig, SessionGate,
};
use serde::Serialize;

use crate::config::WardrobeConfig;
use crate::error::WardrobeError;
use crate::garment::NormalizedGarment;
use crate::normalize::{is_usable, Normalizer};

/// Everything a harvest needs besides the browser itself.
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    pub session: SessionConfig,
    pub selectors: OrderSelectors,
    pub max_wait: Duration,
    /// Requested history window in days. Logged and reported only.
    pub window_days: u32,
}

impl Default for HarvestPlan {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            selectors: OrderSelectors::default(),
            max_wait: Duration::from_secs(10),
            window_days: 30,
        }
    }
}

impl HarvestPlan {
    pub fn from_config(config: &WardrobeConfig) -> Self {
        Self {
            session: config.session_config(),
            selectors: config.order_selectors(),
            max_wait: config.max_wait(),
            window_days: config.scrape.window_days,
        }
    }

    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }
}

#[derive(Debug)]
pub struct HarvestReport {
    /// Every record read off the page, in page order.
    pub raw: Vec<RawPurchaseRecord>,
    /// Every record after normalization, usable or not.
    pub classified: Vec<NormalizedGarment>,
    pub failures: Vec<ExtractionFailure>,
    pub containers_seen: usize,
    pub scraped_at: DateTime<Utc>,
    pub window_days: u32,
}

/// Counts for the end-of-run summary line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HarvestSummary {
    pub scraped_at: DateTime<Utc>,
    pub window_start: NaiveDate,
    pub containers: usize,
    pub records: usize,
    pub usable: usize,
    pub dropped: usize,
    pub failures: usize,
}

impl HarvestReport {
    pub fn from_outcome(
        outcome: ScrapeOutcome,
        normalizer: &Normalizer,
        window_days: u32,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        let classified = normalizer.normalize_all(&outcome.records);
        Self {
            raw: outcome.records,
            classified,
            failures: outcome.failures,
            containers_seen: outcome.containers_seen,
            scraped_at,
            window_days,
        }
    }

    /// The usable clothing, in page order.
    pub fn garments(&self) -> Vec<NormalizedGarment> {
        self.classified.iter().filter(|g| is_usable(g)).cloned().collect()
    }

    pub fn summary(&self) -> HarvestSummary {
        let usable = self.classified.iter().filter(|g| is_usable(g)).count();
        HarvestSummary {
            scraped_at: self.scraped_at,
            window_start: window_start(self.scraped_at, self.window_days),
            containers: self.containers_seen,
            records: self.raw.len(),
            usable,
            dropped: self.classified.len() - usable,
            failures: self.failures.len(),
        }
    }
}

/// First day covered by a window of `days` ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: u32) -> NaiveDate {
    let today = now.date_naive();
    today
        .checked_sub_days(chrono::Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Run one harvest over `driver`.
///
/// The browser is closed on every path, including login and page-load
/// failures. A close failure after a successful scrape is only logged; the
/// scraped records are still returned.
pub async fn harvest<D: PageDriver>(
    driver: D,
    plan: &HarvestPlan,
    normalizer: &Normalizer,
) -> Result<HarvestReport, WardrobeError> {
    let mut gate = SessionGate::new(driver, plan.session.clone());
    let scraped = scrape_page(&mut gate, plan).await;

    if let Err(e) = gate.quit().await {
        tracing::warn!("Failed to close browser: {}", e);
    } else {
        tracing::debug!("Browser closed");
    }

    let outcome = scraped?;
    let report = HarvestReport::from_outcome(outcome, normalizer, plan.window_days, Utc::now());
    let summary = report.summary();
    tracing::info!(
        "Harvest complete: {} records, {} usable, {} dropped, {} skipped",
        summary.records,
        summary.usable,
        summary.dropped,
        summary.failures
    );
    Ok(report)
}

async fn scrape_page<D: PageDriver>(
    gate: &mut SessionGate<D>,
    plan: &HarvestPlan,
) -> Result<ScrapeOutcome, WardrobeError> {
    gate.establish_session().await?;
    tracing::info!(
        "Requested window: {} days (since {}); reading the first rendered page only",
        plan.window_days,
        window_start(Utc::now(), plan.window_days)
    );
    let scraper = gate.order_scraper(plan.selectors.clone())?;
    Ok(scraper.scrape(plan.max_wait).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use purchase_scraper::fixture::{ContainerFixture, RowFixture, UrlStep};
    use purchase_scraper::{DriverEvent, FixtureDriver, PageFixture};

    fn plan() -> HarvestPlan {
        HarvestPlan {
            session: SessionConfig {
                settle_delay: Duration::ZERO,
                ..SessionConfig::default()
            },
            ..HarvestPlan::default()
        }
    }

    fn logged_in(containers: Vec<ContainerFixture>, links: &[&str]) -> PageFixture {
        PageFixture {
            url_timeline: vec![UrlStep {
                after_ms: 1_000,
                url: "https://i.taobao.com/my_taobao.htm".into(),
            }],
            links: links.iter().map(|l| l.to_string()).collect(),
            render_delay_ms: 500,
            containers,
            ..PageFixture::default()
        }
    }

    fn rows() -> Vec<RowFixture> {
        vec![
            RowFixture::complete(
                "法式碎花连衣裙[交易快照]",
                "颜色分类:碎花蓝色 尺码:S",
                "//img.example.com/a.jpg_80x80.jpg",
                "￥129.00",
                "交易成功",
            ),
            RowFixture::complete(
                "无线蓝牙耳机",
                "颜色分类:白色 尺码:均码",
                "//img.example.com/b.jpg_80x80.jpg",
                "￥199.00",
                "交易成功",
            ),
            RowFixture::complete(
                "高腰长裤",
                "颜色分类:黑色",
                "//img.example.com/c.jpg_80x80.jpg",
                "￥89.00",
                "卖家已发货",
            ),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_keeps_only_usable_clothing() {
        let fixture = logged_in(
            vec![ContainerFixture {
                broken: false,
                rows: rows(),
            }],
            &["已买到的宝贝"],
        );
        let driver = FixtureDriver::new(fixture, OrderSelectors::default());
        let journal = driver.journal();
        let normalizer = Normalizer::builtin().unwrap();

        let report = harvest(driver, &plan(), &normalizer).await.unwrap();
        assert_eq!(report.raw.len(), 3);
        assert_eq!(report.classified.len(), 3);
        let garments = report.garments();
        assert_eq!(garments.len(), 1);
        assert_eq!(garments[0].title, "法式碎花连衣裙");
        assert_eq!(garments[0].color, "碎花蓝色");
        assert_eq!(garments[0].image_url, "//img.example.com/a.jpg_640x640.jpg");

        let summary = report.summary();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.usable, 1);
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.failures, 0);
        assert!(journal.contains(&DriverEvent::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn browser_closed_when_navigation_fails() {
        let driver = FixtureDriver::new(logged_in(vec![], &[]), OrderSelectors::default());
        let journal = driver.journal();
        let normalizer = Normalizer::builtin().unwrap();

        let err = harvest(driver, &plan(), &normalizer).await.unwrap_err();
        assert_eq!(err.reason(), "navigation");
        assert_eq!(journal.events().last(), Some(&DriverEvent::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn browser_closed_when_page_never_renders() {
        let driver = FixtureDriver::new(
            logged_in(vec![], &["已买到的宝贝"]),
            OrderSelectors::default(),
        );
        let journal = driver.journal();
        let normalizer = Normalizer::builtin().unwrap();

        let err = harvest(driver, &plan(), &normalizer).await.unwrap_err();
        assert_eq!(err.reason(), "page_load_timeout");
        assert!(journal.contains(&DriverEvent::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn browser_closed_on_login_timeout() {
        let fixture = PageFixture {
            url_timeline: vec![UrlStep {
                after_ms: 0,
                url: "https://login.taobao.com/member/login.jhtml".into(),
            }],
            ..PageFixture::default()
        };
        let driver = FixtureDriver::new(fixture, OrderSelectors::default());
        let journal = driver.journal();
        let normalizer = Normalizer::builtin().unwrap();
        let plan = HarvestPlan {
            session: SessionConfig {
                login_timeout: Duration::from_secs(5),
                ..plan().session
            },
            ..plan()
        };

        let err = harvest(driver, &plan, &normalizer).await.unwrap_err();
        assert_eq!(err.reason(), "login_timeout");
        assert!(journal.contains(&DriverEvent::Quit));
    }

    #[test]
    fn window_start_counts_back_whole_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        assert_eq!(
            window_start(now, 30),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(window_start(now, 0), now.date_naive());
    }

    #[test]
    fn plan_from_config_carries_window() {
        let cfg = WardrobeConfig::from_toml_str("[scrape]\nwindow_days = 7\n").unwrap();
        let plan = HarvestPlan::from_config(&cfg).with_window_days(14);
        assert_eq!(plan.window_days, 14);
        assert_eq!(plan.max_wait, Duration::from_secs(10));
    }
}
