use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::slot::{Slot, SlotSource};

const DIAGNOSTIC_SAMPLE: usize = 2;

/// Which path satisfied an availability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    CalendarApi,
    Scraped,
    Synthetic,
    /// Operator override: send the customer to the booking page itself.
    ForceFallbackRedirect,
}

impl From<SlotSource> for ResolutionSource {
    fn from(source: SlotSource) -> Self {
        match source {
            SlotSource::CalendarApi => ResolutionSource::CalendarApi,
            SlotSource::Scraped => ResolutionSource::Scraped,
            SlotSource::Synthetic => ResolutionSource::Synthetic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Ok,
    Empty,
    Failed,
    Timeout,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceAttempt {
    pub source: SlotSource,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SourceAttempt {
    pub fn new(source: SlotSource, outcome: AttemptOutcome) -> Self {
        Self {
            source,
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Outcome of one pass through the source chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub slots: Vec<Slot>,
    pub source: ResolutionSource,
    pub redirect_url: Option<String>,
    pub attempts: Vec<SourceAttempt>,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub service: String,
    pub source: ResolutionSource,
    pub count: usize,
    pub sample: Vec<Slot>,
    pub attempts: Vec<SourceAttempt>,
    pub now: DateTime<Utc>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub success: bool,
    pub slots: Vec<Slot>,
    pub service: String,
    pub source: ResolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl AvailabilityResponse {
    pub fn new(resolution: Resolution, service: impl Into<String>) -> Self {
        let message = resolution
            .redirect_url
            .as_ref()
            .map(|_| "Redirecting to the booking page to complete your appointment.".to_string());
        Self {
            success: true,
            slots: resolution.slots,
            service: service.into(),
            source: resolution.source,
            redirect_url: resolution.redirect_url,
            message,
            diagnostics: None,
        }
    }

    /// Adds the debug block without touching the primary payload.
    pub fn with_diagnostics(
        mut self,
        attempts: Vec<SourceAttempt>,
        path: impl Into<String>,
    ) -> Self {
        self.diagnostics = Some(Diagnostics {
            service: self.service.clone(),
            source: self.source,
            count: self.slots.len(),
            sample: self.slots.iter().take(DIAGNOSTIC_SAMPLE).cloned().collect(),
            attempts,
            now: Utc::now(),
            path: path.into(),
        });
        self
    }
}
