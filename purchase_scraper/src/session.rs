//! Login gate: waits for a human to finish logging in, then opens the
//! purchase-history view.

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;

use crate::driver::{Locator, PageDriver};
use crate::errors::SessionError;
use crate::poll::poll_until;
use crate::scrape::{OrderScraper, OrderSelectors};

/// Where the gate is in the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    /// The login page is open and the user is scanning a QR code, solving a
    /// slider, or passing some other verification step.
    AwaitingVerification,
    Ready,
    Failed,
}

/// Timing and page landmarks for the login flow.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub login_url: String,
    /// Visible text of the link that opens the purchase-history page.
    pub history_link_text: String,
    pub login_timeout: Duration,
    /// Pause after login before looking for the history link.
    pub settle_delay: Duration,
    pub navigation_timeout: Duration,
    pub poll_interval: Duration,
    /// URL substrings that mean "still logging in".
    pub blocked_url_markers: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_url: "https://login.taobao.com".to_string(),
            history_link_text: "已买到的宝贝".to_string(),
            login_timeout: Duration::from_secs(300),
            settle_delay: Duration::from_secs(3),
            navigation_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            blocked_url_markers: vec![
                "login".to_string(),
                "verify".to_string(),
                "validate".to_string(),
            ],
        }
    }
}

/// Owns the browser session for the lifetime of one harvest.
///
/// There is no retry here: whether to ask the user to log in again is the
/// caller's decision.
pub struct SessionGate<D: PageDriver> {
    driver: D,
    config: SessionConfig,
    state: SessionState,
}

impl<D: PageDriver> SessionGate<D> {
    pub fn new(driver: D, config: SessionConfig) -> Self {
        Self {
            driver,
            config,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Drive the browser to the purchase-history view.
    ///
    /// Returns [`SessionState::Ready`] on success. On any error the gate moves
    /// to [`SessionState::Failed`]; calling this again starts over from a
    /// clean cookie jar.
    pub async fn establish_session(&mut self) -> Result<SessionState, SessionError> {
        match self.login_and_navigate().await {
            Ok(()) => {
                self.state = SessionState::Ready;
                Ok(self.state)
            }
            Err(e) => {
                tracing::error!("Session setup failed: {}", e);
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    async fn login_and_navigate(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Unauthenticated;
        self.driver.clear_cookies().await?;
        self.driver.goto(&self.config.login_url).await?;
        self.state = SessionState::AwaitingVerification;
        tracing::info!(
            "Waiting up to {}s for login at {}",
            self.config.login_timeout.as_secs(),
            self.config.login_url
        );

        let driver = &self.driver;
        let markers = &self.config.blocked_url_markers;
        let landed = poll_until(
            self.config.login_timeout,
            self.config.poll_interval,
            || async move {
                let url = driver.current_url().await?;
                tracing::debug!("Polled location: {}", url);
                Ok((!is_blocked_url(&url, markers)).then_some(url))
            },
        )
        .await?;

        let Some(url) = landed else {
            return Err(SessionError::LoginTimeout {
                waited: self.config.login_timeout,
            });
        };
        tracing::info!("Login and verification complete ({})", url);

        sleep(self.config.settle_delay).await;
        self.open_purchase_history().await
    }

    async fn open_purchase_history(&self) -> Result<(), SessionError> {
        let link_text = &self.config.history_link_text;
        let locator = Locator::link_text(link_text.as_str());
        let driver = &self.driver;
        let target = &locator;

        let link = poll_until(
            self.config.navigation_timeout,
            self.config.poll_interval,
            || async move { driver.find(None, target).await },
        )
        .await?;

        let Some(link) = link else {
            tracing::error!("Link '{}' not found on landing page", link_text);
            return Err(SessionError::Navigation {
                link_text: link_text.clone(),
            });
        };

        if let Err(e) = self.driver.click(&link).await {
            tracing::error!("Link '{}' could not be clicked: {}", link_text, e);
            return Err(SessionError::Navigation {
                link_text: link_text.clone(),
            });
        }

        tracing::info!("Opened purchase history");
        Ok(())
    }

    /// Borrow the session for scraping. Only available once the gate is ready.
    pub fn order_scraper(
        &mut self,
        selectors: OrderSelectors,
    ) -> Result<OrderScraper<'_, D>, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady { state: self.state });
        }
        Ok(OrderScraper::new(
            &self.driver,
            selectors,
            self.config.poll_interval,
        ))
    }

    /// Close the browser, consuming the gate.
    pub async fn quit(self) -> Result<(), crate::DriverError> {
        self.driver.quit().await
    }
}

/// Whether `url` still points at a login or verification step.
pub fn is_blocked_url(url: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| url.contains(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        SessionConfig::default().blocked_url_markers
    }

    #[test]
    fn login_urls_are_blocked() {
        let m = markers();
        assert!(is_blocked_url("https://login.taobao.com/member/login.jhtml", &m));
        assert!(is_blocked_url("https://passport.example.com/verify?step=2", &m));
        assert!(is_blocked_url("https://sec.example.com/validate", &m));
    }

    #[test]
    fn landing_urls_are_not_blocked() {
        let m = markers();
        assert!(!is_blocked_url("https://i.taobao.com/my_taobao.htm", &m));
        assert!(!is_blocked_url("https://www.taobao.com/", &m));
    }

    #[test]
    fn default_config_matches_storefront() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.login_timeout, Duration::from_secs(300));
        assert_eq!(cfg.navigation_timeout, Duration::from_secs(10));
        assert_eq!(cfg.history_link_text, "已买到的宝贝");
    }
}
