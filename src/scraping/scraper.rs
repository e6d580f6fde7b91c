use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use moka::future::Cache;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::service::service_duration;
use crate::models::slot::Slot;
use crate::scraping::browser::{BrowserLauncher, BrowserPage, BrowserSession, PageRequest};
use crate::scraping::constants::PAGE_CLOSE_TIMEOUT_MS;
use crate::scraping::normalize::build_slots;
use crate::scraping::strategies::{CandidateSet, ExtractionStrategy, default_strategies, extract_best};

/// Anything that can read open slots off the public booking page.
#[async_trait]
pub trait SlotScraper: Send + Sync {
    /// Starts a browser session. Returns false (and logs) when it cannot.
    async fn initialize(&self) -> bool;

    async fn scrape_available_slots(
        &self,
        service: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Slot>, ScrapeError>;

    /// Ends the browser session. Errors are logged, never returned.
    async fn close(&self);

    fn booking_url(&self) -> &str;
}

/**
Scrapes the third party booking page through a headless browser.

The browser session lives between `initialize` and `close`, and one scraper
instance is reused across sessions. What the page showed is memoized for a
few minutes so that back to back requests don't each pay for a page load.
*/
pub struct BookingPageScraper {
    launcher: Arc<dyn BrowserLauncher>,
    session: Mutex<Option<Box<dyn BrowserSession>>>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    memo: Cache<String, CandidateSet>,
    booking_url: String,
    timezone: Tz,
}

impl BookingPageScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: &ScraperConfig, timezone: Tz) -> Self {
        Self {
            launcher,
            session: Mutex::new(None),
            strategies: default_strategies(),
            memo: Cache::builder()
                .max_capacity(1)
                .time_to_live(config.cache_ttl)
                .build(),
            booking_url: config.booking_url.clone(),
            timezone,
        }
    }

    fn slots_from(&self, set: &CandidateSet, service: &str) -> Vec<Slot> {
        let now = Utc::now().with_timezone(&self.timezone);
        build_slots(set, now, service_duration(service))
    }

    async fn render_page(
        &self,
        session: &dyn BrowserSession,
        cancel: &CancellationToken,
    ) -> Result<String, ScrapeError> {
        let request = PageRequest::new(self.booking_url.clone(), self.timezone);

        let mut page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
            page = session.open_page() => page?,
        };

        let rendered = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScrapeError::Cancelled),
            html = page.render(&request) => html,
        };

        close_page(page).await;
        rendered
    }
}

/// Page cleanup runs whatever happened during the render, and is bounded so a
/// wedged browser can't hold the caller past its deadline.
async fn close_page(page: Box<dyn BrowserPage>) {
    let limit = Duration::from_millis(PAGE_CLOSE_TIMEOUT_MS);
    match tokio::time::timeout(limit, page.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to close booking page: {}", e),
        Err(_) => warn!("Timed out closing booking page after {:?}", limit),
    }
}

#[async_trait]
impl SlotScraper for BookingPageScraper {
    async fn initialize(&self) -> bool {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return true;
        }

        match self.launcher.launch().await {
            Ok(launched) => {
                *session = Some(launched);
                info!("Booking page scraper initialized");
                true
            }
            Err(e) => {
                error!("Failed to initialize booking page scraper: {}", e);
                *session = None;
                false
            }
        }
    }

    async fn scrape_available_slots(
        &self,
        service: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Slot>, ScrapeError> {
        if let Some(set) = self.memo.get(&self.booking_url).await {
            let slots = self.slots_from(&set, service);
            if !slots.is_empty() {
                debug!(count = slots.len(), "Using memoized booking page scrape");
                return Ok(slots);
            }
        }

        let html = {
            let session = self.session.lock().await;
            let session = session.as_deref().ok_or(ScrapeError::NotInitialized)?;
            self.render_page(session, cancel).await?
        };

        let Some(set) = extract_best(&html, &self.strategies) else {
            info!("No appointment times found on the booking page");
            return Ok(Vec::new());
        };

        let slots = self.slots_from(&set, service);
        info!(
            strategy = set.strategy,
            confidence = set.confidence,
            count = slots.len(),
            "Scraped booking page"
        );

        if !slots.is_empty() {
            self.memo.insert(self.booking_url.clone(), set).await;
        }
        Ok(slots)
    }

    async fn close(&self) {
        let Some(session) = self.session.lock().await.take() else {
            return;
        };
        if let Err(e) = session.quit().await {
            warn!("Error while closing browser session: {}", e);
        }
        info!("Booking page scraper closed");
    }

    fn booking_url(&self) -> &str {
        &self.booking_url
    }
}
