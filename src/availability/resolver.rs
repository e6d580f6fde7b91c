use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::availability::synthetic::{DEFAULT_SYNTHETIC_COUNT, generate_synthetic_slots};
use crate::cache::PendingBookingStore;
use crate::calendar::CalendarService;
use crate::config::ScraperConfig;
use crate::error::{BookingError, ScrapeError};
use crate::models::appointment::{AppointmentRequest, BookingRecord};
use crate::models::availability::{AttemptOutcome, Resolution, ResolutionSource, SourceAttempt};
use crate::models::slot::{MAX_SLOTS, Slot, SlotSource, normalize_slots};
use crate::scraping::constants::PAGE_CLOSE_TIMEOUT_MS;
use crate::scraping::scraper::SlotScraper;

// time a cancelled scrape gets to tidy up before it is abandoned
const SCRAPE_GRACE: Duration = Duration::from_millis(PAGE_CLOSE_TIMEOUT_MS + 1_000);

/// Walks the source chain (calendar, booking page, synthetic schedule) and
/// returns the first non-empty answer. Never fails.
pub struct AvailabilityResolver {
    calendar: Arc<dyn CalendarService>,
    scraper: Arc<dyn SlotScraper>,
    pending: PendingBookingStore,
    timezone: Tz,
    force_fallback: bool,
    scrape_timeout: Duration,
    // one browser at a time
    scrape_lock: Mutex<()>,
}

impl AvailabilityResolver {
    pub fn new(
        calendar: Arc<dyn CalendarService>,
        scraper: Arc<dyn SlotScraper>,
        pending: PendingBookingStore,
        config: &ScraperConfig,
        timezone: Tz,
    ) -> Self {
        Self {
            calendar,
            scraper,
            pending,
            timezone,
            force_fallback: config.force_fallback,
            scrape_timeout: config.timeout,
            scrape_lock: Mutex::new(()),
        }
    }

    pub async fn resolve(&self, service: &str, days_ahead: u32) -> Resolution {
        let mut attempts = Vec::new();

        let calendar = self.try_calendar(service, days_ahead).await;
        attempts.push(calendar.1);
        if !calendar.0.is_empty() {
            return finish(calendar.0, ResolutionSource::CalendarApi, None, attempts);
        }

        if self.force_fallback {
            let url = self.scraper.booking_url().to_string();
            info!(url = %url, "Scraper fallback forced, redirecting to booking page");
            attempts.push(
                SourceAttempt::new(SlotSource::Scraped, AttemptOutcome::Skipped)
                    .with_detail("force fallback enabled"),
            );
            return finish(
                Vec::new(),
                ResolutionSource::ForceFallbackRedirect,
                Some(url),
                attempts,
            );
        }

        let scraped = self.try_scraper(service).await;
        attempts.push(scraped.1);
        if !scraped.0.is_empty() {
            return finish(scraped.0, ResolutionSource::Scraped, None, attempts);
        }

        let now = Utc::now().with_timezone(&self.timezone);
        let slots = generate_synthetic_slots(now, DEFAULT_SYNTHETIC_COUNT);
        warn!(count = slots.len(), "Serving synthetic availability");
        attempts.push(SourceAttempt::new(SlotSource::Synthetic, AttemptOutcome::Ok));
        finish(slots, ResolutionSource::Synthetic, None, attempts)
    }

    async fn try_calendar(&self, service: &str, days_ahead: u32) -> (Vec<Slot>, SourceAttempt) {
        if !self.calendar.initialize().await {
            return (
                Vec::new(),
                SourceAttempt::new(SlotSource::CalendarApi, AttemptOutcome::Failed)
                    .with_detail("calendar not initialized"),
            );
        }

        match self.calendar.available_slots(service, days_ahead).await {
            Ok(slots) if slots.is_empty() => {
                info!("Calendar returned no free slots");
                (Vec::new(), SourceAttempt::new(SlotSource::CalendarApi, AttemptOutcome::Empty))
            }
            Ok(slots) => {
                info!(count = slots.len(), "Serving calendar availability");
                (slots, SourceAttempt::new(SlotSource::CalendarApi, AttemptOutcome::Ok))
            }
            Err(e) => {
                error!("Calendar availability failed: {}", e);
                (
                    Vec::new(),
                    SourceAttempt::new(SlotSource::CalendarApi, AttemptOutcome::Failed)
                        .with_detail(e.to_string()),
                )
            }
        }
    }

    /// Runs one browser session under the scrape deadline. When the deadline
    /// fires the token is cancelled and the session gets a short grace period
    /// to close its page and quit.
    async fn try_scraper(&self, service: &str) -> (Vec<Slot>, SourceAttempt) {
        let cancel = CancellationToken::new();

        let mut work = Box::pin(async {
            let _browser = self.scrape_lock.lock().await;
            if !self.scraper.initialize().await {
                return Err(ScrapeError::Launch("scraper failed to initialize".to_string()));
            }
            let result = self.scraper.scrape_available_slots(service, &cancel).await;
            self.scraper.close().await;
            result
        });

        let result = tokio::select! {
            result = &mut work => Some(result),
            _ = tokio::time::sleep(self.scrape_timeout) => {
                warn!(timeout = ?self.scrape_timeout, "Scrape deadline reached, cancelling");
                cancel.cancel();
                tokio::time::timeout(SCRAPE_GRACE, &mut work).await.ok()
            }
        };
        // an abandoned session still holds the browser lock until dropped
        drop(work);

        let attempt = |outcome| SourceAttempt::new(SlotSource::Scraped, outcome);
        match result {
            Some(Ok(slots)) if slots.is_empty() => (Vec::new(), attempt(AttemptOutcome::Empty)),
            Some(Ok(slots)) => {
                info!(count = slots.len(), "Serving scraped availability");
                (slots, attempt(AttemptOutcome::Ok))
            }
            Some(Err(ScrapeError::Cancelled)) => (
                Vec::new(),
                attempt(AttemptOutcome::Timeout).with_detail(format!("{:?}", self.scrape_timeout)),
            ),
            Some(Err(e)) => {
                error!("Booking page scrape failed: {}", e);
                (Vec::new(), attempt(AttemptOutcome::Failed).with_detail(e.to_string()))
            }
            None => {
                error!("Scraper ignored cancellation, abandoning the session");
                if tokio::time::timeout(SCRAPE_GRACE, self.scraper.close()).await.is_err() {
                    warn!("Timed out closing abandoned scraper session");
                }
                (
                    Vec::new(),
                    attempt(AttemptOutcome::Timeout).with_detail("scraper did not stop when cancelled"),
                )
            }
        }
    }

    /// Validation errors go back to the caller. Anything that goes wrong on the
    /// calendar side turns into a pending booking instead of an error.
    pub async fn book(&self, request: &AppointmentRequest) -> Result<BookingRecord, BookingError> {
        let appointment = request.validate()?;

        let reason = if self.calendar.initialize().await {
            match self.calendar.create_appointment(&appointment).await {
                Ok(event) => return Ok(BookingRecord::confirmed(appointment, event)),
                Err(e) => e.to_string(),
            }
        } else {
            "calendar not initialized".to_string()
        };

        let record = BookingRecord::pending(appointment, reason.clone());
        warn!(
            booking_id = %record.id,
            customer = %record.appointment.customer.email,
            start = %record.appointment.start_time,
            reason = %reason,
            "Calendar booking failed, recorded as pending confirmation"
        );
        self.pending.insert(record.clone()).await;
        Ok(record)
    }

    pub async fn pending_booking(&self, id: &str) -> Option<BookingRecord> {
        self.pending.get(id).await
    }

    pub fn pending_bookings(&self) -> Vec<BookingRecord> {
        self.pending.list()
    }

    pub fn calendar(&self) -> &Arc<dyn CalendarService> {
        &self.calendar
    }
}

fn finish(
    slots: Vec<Slot>,
    source: ResolutionSource,
    redirect_url: Option<String>,
    attempts: Vec<SourceAttempt>,
) -> Resolution {
    Resolution {
        slots: normalize_slots(slots, MAX_SLOTS),
        source,
        redirect_url,
        attempts,
        resolved_at: Utc::now(),
    }
}
