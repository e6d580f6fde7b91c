use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CalendarHealth {
    pub initialized: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub calendar: CalendarHealth,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

pub fn health(state: &AppState) -> HealthResponse {
    HealthResponse {
        status: "ok",
        calendar: CalendarHealth {
            initialized: state.resolver.calendar().is_initialized(),
        },
        timestamp: Utc::now(),
    }
}

pub fn calendar_auth_url(state: &AppState) -> Result<AuthUrlResponse, ApiError> {
    state
        .resolver
        .calendar()
        .authorization_url()
        .map(|url| AuthUrlResponse { url })
        .ok_or_else(|| ApiError::NotFound("Google OAuth client is not configured".to_string()))
}
