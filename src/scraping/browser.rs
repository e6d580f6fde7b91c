use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::json;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use thirtyfour::support::sleep;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::scraping::constants::*;

/// What to load and how long to wait for it.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub timezone: Tz,
    pub navigation_timeout: Duration,
    pub ready_selector: String,
    pub ready_wait: Duration,
    pub settle_delay: Duration,
}

impl PageRequest {
    pub fn new(url: impl Into<String>, timezone: Tz) -> Self {
        Self {
            url: url.into(),
            timezone,
            navigation_timeout: Duration::from_millis(NAVIGATION_TIMEOUT_MS),
            ready_selector: READY_SELECTOR.to_string(),
            ready_wait: Duration::from_millis(READY_WAIT_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScrapeError>;

    async fn quit(self: Box<Self>) -> Result<(), ScrapeError>;
}

#[async_trait]
pub trait BrowserPage: Send {
    /// Navigates to the request URL and returns the rendered document.
    async fn render(&mut self, request: &PageRequest) -> Result<String, ScrapeError>;

    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}

/// Headless Chrome driven through a chromedriver endpoint.
pub struct WebDriverLauncher {
    webdriver_url: String,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.set_headless()
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        //we run in a container, these keep chrome alive there
        for arg in CHROME_ARGS {
            caps.add_arg(arg)
                .map_err(|e| ScrapeError::Launch(e.to_string()))?;
        }

        let driver = WebDriver::new(&self.webdriver_url, caps)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        if let Err(e) = driver
            .set_window_rect(0, 0, WINDOW_WIDTH, WINDOW_HEIGHT)
            .await
        {
            warn!("Failed to size browser window: {:?}", e);
        }

        info!(url = %self.webdriver_url, "Chrome session started");
        Ok(Box::new(WebDriverSession { driver }))
    }
}

struct WebDriverSession {
    driver: WebDriver,
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScrapeError> {
        let origin = self.driver.window().await?;
        let tab = self.driver.new_tab().await?;
        self.driver.switch_to_window(tab).await?;

        Ok(Box::new(WebDriverPage {
            driver: self.driver.clone(),
            origin,
        }))
    }

    async fn quit(self: Box<Self>) -> Result<(), ScrapeError> {
        info!("Quitting Chrome session");
        self.driver.quit().await?;
        Ok(())
    }
}

struct WebDriverPage {
    driver: WebDriver,
    origin: WindowHandle,
}

impl WebDriverPage {
    async fn force_timezone(&self, timezone: Tz) {
        let dev_tools = ChromeDevTools::new(self.driver.handle.clone());
        if let Err(e) = dev_tools
            .execute_cdp_with_params(
                "Emulation.setTimezoneOverride",
                json!({ "timezoneId": timezone.name() }),
            )
            .await
        {
            warn!("Could not override page timezone: {:?}", e);
        }
    }

    /// Polls for the readiness selector. Returns false when it never appears.
    async fn wait_until_ready(&self, selector: &str, wait: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Ok(found) = self.driver.find_all(By::Css(selector)).await {
                if !found.is_empty() {
                    return true;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(READY_POLL_MS)).await;
        }
    }
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn render(&mut self, request: &PageRequest) -> Result<String, ScrapeError> {
        self.force_timezone(request.timezone).await;

        info!("Loading booking page...");
        match tokio::time::timeout(request.navigation_timeout, self.driver.goto(&request.url)).await
        {
            Ok(navigated) => navigated?,
            Err(_) => return Err(ScrapeError::NavigationTimeout(request.navigation_timeout)),
        }

        if !self
            .wait_until_ready(&request.ready_selector, request.ready_wait)
            .await
        {
            debug!("Ready selector never appeared, settling for a fixed delay");
            sleep(request.settle_delay).await;
        }

        Ok(self.driver.source().await?)
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        self.driver.close_window().await?;
        self.driver.switch_to_window(self.origin).await?;
        debug!("Page closed");
        Ok(())
    }
}
