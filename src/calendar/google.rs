use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};
use url::Url;

use crate::calendar::CalendarService;
use crate::calendar::auth::{Credentials, TokenProvider, authorization_url};
use crate::calendar::free_slots::{BusyInterval, free_slots};
use crate::config::CalendarConfig;
use crate::error::CalendarError;
use crate::models::appointment::{Appointment, CreatedEvent};
use crate::models::business_hours::{BusinessHoursTemplate, at_local};
use crate::models::service::service_duration;
use crate::models::slot::{MAX_SLOTS, Slot};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

const EMAIL_REMINDER_MINUTES: u32 = 24 * 60;
const POPUP_REMINDER_MINUTES: u32 = 60;

/// Google Calendar v3 over plain REST.
pub struct GoogleCalendar {
    config: CalendarConfig,
    hours: BusinessHoursTemplate,
    timezone: Tz,
    http: reqwest::Client,
    tokens: OnceCell<Arc<TokenProvider>>,
}

impl GoogleCalendar {
    pub fn new(config: CalendarConfig, hours: BusinessHoursTemplate, timezone: Tz) -> Self {
        Self {
            config,
            hours,
            timezone,
            http: reqwest::Client::new(),
            tokens: OnceCell::new(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CalendarError> {
        let mut url =
            Url::parse(API_BASE).map_err(|e| CalendarError::InvalidResponse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::InvalidResponse("calendar base url".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn connect(&self) -> Result<Arc<TokenProvider>, CalendarError> {
        let credentials = Credentials::from_config(&self.config)?;
        info!(kind = credentials.kind(), "Initializing Google Calendar client");
        let tokens = Arc::new(TokenProvider::new(self.http.clone(), credentials));

        // one cheap call proves the credentials actually work
        let mut probe = self.endpoint(&["users", "me", "calendarList"])?;
        probe.query_pairs_mut().append_pair("maxResults", "1");
        let token = tokens.access_token().await?;
        let response = self.http.get(probe).bearer_auth(token).send().await?;
        check_status(response).await?;

        Ok(tokens)
    }

    fn tokens(&self) -> Result<&TokenProvider, CalendarError> {
        self.tokens
            .get()
            .map(Arc::as_ref)
            .ok_or(CalendarError::NotInitialized)
    }

    async fn list_busy(
        &self,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
    ) -> Result<Vec<BusyInterval>, CalendarError> {
        let token = self.tokens()?.access_token().await?;
        let mut url = self.endpoint(&["calendars", &self.config.calendar_id, "events"])?;
        url.query_pairs_mut()
            .append_pair("timeMin", &time_min.to_rfc3339())
            .append_pair("timeMax", &time_max.to_rfc3339())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("maxResults", "2500");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let events: EventList = check_status(response).await?.json().await?;
        Ok(busy_intervals(&events.items, self.timezone))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CalendarError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CalendarError::Upstream {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Default, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Event {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    html_link: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transparency: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<DateTime<chrono::FixedOffset>>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl EventTime {
    /// All-day events start and end at local midnight.
    fn instant(&self, tz: Tz) -> Option<DateTime<Utc>> {
        if let Some(dt) = self.date_time {
            return Some(dt.with_timezone(&Utc));
        }
        self.date
            .and_then(|d| at_local(tz, d, 0, 0))
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn busy_intervals(events: &[Event], tz: Tz) -> Vec<BusyInterval> {
    events
        .iter()
        .filter(|e| e.status.as_deref() != Some("cancelled"))
        .filter(|e| e.transparency.as_deref() != Some("transparent"))
        .filter_map(|e| {
            let start = e.start.as_ref()?.instant(tz)?;
            let end = e.end.as_ref()?.instant(tz)?;
            Some(BusyInterval::new(start, end))
        })
        .collect()
}

fn event_description(appointment: &Appointment) -> String {
    format!(
        "Appointment Details:\n\
         - Service: {}\n\
         - Customer: {}\n\
         - Email: {}\n\
         - Phone: {}\n\
         - Notes: {}\n\n\
         Booked via: Booknow.Hair website",
        appointment.service_type,
        appointment.customer.name,
        appointment.customer.email,
        appointment.customer.phone.as_deref().unwrap_or("Not provided"),
        appointment.notes.as_deref().unwrap_or("None"),
    )
}

fn event_body(appointment: &Appointment, tz: Tz) -> Value {
    let start = appointment.start_time.with_timezone(&tz);
    let end = appointment.end_time.with_timezone(&tz);
    json!({
        "summary": format!("{} - {}", appointment.service_type, appointment.customer.name),
        "description": event_description(appointment),
        "start": { "dateTime": start.to_rfc3339(), "timeZone": tz.name() },
        "end": { "dateTime": end.to_rfc3339(), "timeZone": tz.name() },
        "attendees": [{
            "email": appointment.customer.email,
            "displayName": appointment.customer.name,
        }],
        "reminders": {
            "useDefault": false,
            "overrides": [
                { "method": "email", "minutes": EMAIL_REMINDER_MINUTES },
                { "method": "popup", "minutes": POPUP_REMINDER_MINUTES },
            ],
        },
    })
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn initialize(&self) -> bool {
        match self.tokens.get_or_try_init(|| self.connect()).await {
            Ok(_) => true,
            Err(CalendarError::NotConfigured) => {
                warn!("No Google Calendar credentials configured");
                false
            }
            Err(e) => {
                error!("Failed to initialize Google Calendar API: {}", e);
                false
            }
        }
    }

    async fn available_slots(&self, service: &str, days_ahead: u32) -> Result<Vec<Slot>, CalendarError> {
        self.tokens()?;

        let now = Utc::now().with_timezone(&self.timezone);
        let first_day = now.date_naive();
        let last_day = first_day + Duration::days(i64::from(days_ahead));

        let time_min = at_local(self.timezone, first_day, 0, 0).unwrap_or(now);
        let time_max = at_local(self.timezone, last_day, 23, 59)
            .map(|t| t + Duration::seconds(59))
            .unwrap_or(now + Duration::days(i64::from(days_ahead) + 1));

        let busy = self.list_busy(time_min, time_max).await?;
        let slots = free_slots(
            &self.hours,
            first_day,
            last_day,
            &busy,
            service_duration(service),
            now,
            MAX_SLOTS,
        );
        info!(
            busy = busy.len(),
            count = slots.len(),
            "Computed free calendar slots"
        );
        Ok(slots)
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<CreatedEvent, CalendarError> {
        let token = self.tokens()?.access_token().await?;
        let mut url = self.endpoint(&["calendars", &self.config.calendar_id, "events"])?;
        url.query_pairs_mut().append_pair("sendUpdates", "all");

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&event_body(appointment, self.timezone))
            .send()
            .await?;
        let event: Event = check_status(response).await?.json().await?;

        let event_id = event
            .id
            .ok_or_else(|| CalendarError::InvalidResponse("created event has no id".to_string()))?;
        let start_time = event
            .start
            .and_then(|t| t.date_time)
            .unwrap_or(appointment.start_time);
        let end_time = event
            .end
            .and_then(|t| t.date_time)
            .unwrap_or(appointment.end_time);

        info!(event_id = %event_id, "Appointment created");
        Ok(CreatedEvent {
            event_id,
            event_link: event.html_link,
            start_time,
            end_time,
        })
    }

    fn is_initialized(&self) -> bool {
        self.tokens.initialized()
    }

    fn authorization_url(&self) -> Option<String> {
        authorization_url(&self.config)
    }
}
