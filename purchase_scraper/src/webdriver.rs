//! Live browser backend over the W3C WebDriver protocol (chromedriver,
//! geckodriver, Selenium Grid).

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::driver::{Locator, PageDriver};
use crate::errors::DriverError;

/// Request timeout for the `/status` probe.
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// How to reach the WebDriver server and how to launch the browser.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    /// Headless mode hides the QR code; only useful with a saved profile.
    pub headless: bool,
    /// Extra Chrome command-line switches.
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            args: vec!["--disable-blink-features=AutomationControlled".to_string()],
        }
    }
}

impl BrowserOptions {
    /// Chrome capabilities that keep the automation banner and the
    /// `navigator.webdriver` flag away from the storefront's bot checks.
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut args = self.args.clone();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
                "useAutomationExtension": false,
            }),
        );
        caps
    }
}

/// Readiness reported by a WebDriver server's `/status` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverStatus {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    value: DriverStatus,
}

/// Ask the WebDriver server whether it can open a new session.
pub async fn probe_status(webdriver_url: &str) -> Result<DriverStatus, DriverError> {
    let mut base = Url::parse(webdriver_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let url = base.join("status")?;
    let http = reqwest::Client::builder().timeout(STATUS_TIMEOUT).build()?;
    let resp = http.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(DriverError::HttpStatus {
            status: resp.status().as_u16(),
        });
    }
    let body = resp.text().await?;
    let envelope: StatusEnvelope = serde_json::from_str(&body)?;
    Ok(envelope.value)
}

/// One live browser session.
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    pub async fn connect(options: &BrowserOptions) -> Result<Self, DriverError> {
        Url::parse(&options.webdriver_url)?;
        let client = ClientBuilder::native()
            .capabilities(options.capabilities())
            .connect(&options.webdriver_url)
            .await?;
        tracing::info!("Browser session opened via {}", options.webdriver_url);
        Ok(Self { client })
    }
}

fn to_fantoccini(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator {
        Locator::Css(s) => fantoccini::Locator::Css(s),
        Locator::LinkText(s) => fantoccini::Locator::LinkText(s),
    }
}

#[async_trait]
impl PageDriver for WebDriverSession {
    type Element = Element;

    async fn clear_cookies(&self) -> Result<(), DriverError> {
        Ok(self.client.delete_all_cookies().await?)
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        Ok(self.client.goto(url).await?)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn find_all(
        &self,
        scope: Option<&Element>,
        locator: &Locator,
    ) -> Result<Vec<Element>, DriverError> {
        let found = match scope {
            Some(element) => element.find_all(to_fantoccini(locator)).await?,
            None => self.client.find_all(to_fantoccini(locator)).await?,
        };
        Ok(found)
    }

    async fn text(&self, element: &Element) -> Result<String, DriverError> {
        Ok(element.text().await?)
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>, DriverError> {
        Ok(element.attr(name).await?)
    }

    async fn click(&self, element: &Element) -> Result<(), DriverError> {
        Ok(element.click().await?)
    }

    async fn quit(self) -> Result<(), DriverError> {
        self.client.close().await?;
        tracing::info!("Browser session closed");
        Ok(())
    }
}
