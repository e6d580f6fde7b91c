use serde::Deserialize;
use tracing::info;

use crate::models::availability::AvailabilityResponse;
use crate::models::service::DEFAULT_SERVICE;
use crate::state::AppState;

pub const DEFAULT_DAYS: u32 = 30;
const MAX_DAYS: u32 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub service: Option<String>,
    // kept as text so a bad value falls back instead of rejecting the request
    pub days: Option<String>,
    pub debug: Option<String>,
}

impl AvailabilityQuery {
    pub fn service(&self) -> String {
        self.service
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVICE)
            .to_string()
    }

    pub fn days(&self) -> u32 {
        self.days
            .as_deref()
            .and_then(|d| d.trim().parse::<u32>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DAYS)
            .min(MAX_DAYS)
    }

    pub fn debug(&self) -> bool {
        self.debug.as_deref() == Some("true")
    }
}

pub async fn get_available_slots(
    state: &AppState,
    query: &AvailabilityQuery,
    path: &str,
) -> AvailabilityResponse {
    let service = query.service();
    let days = query.days();
    info!(service = %service, days, "Resolving availability");

    let resolution = state.resolver.resolve(&service, days).await;
    let attempts = resolution.attempts.clone();
    let response = AvailabilityResponse::new(resolution, service);

    if query.debug() {
        response.with_diagnostics(attempts, path)
    } else {
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(service: Option<&str>, days: Option<&str>, debug: Option<&str>) -> AvailabilityQuery {
        AvailabilityQuery {
            service: service.map(String::from),
            days: days.map(String::from),
            debug: debug.map(String::from),
        }
    }

    #[test]
    fn defaults_fill_missing_or_bad_params() {
        let q = query(None, Some("soon"), None);
        assert_eq!(q.service(), "Premium Haircut");
        assert_eq!(q.days(), 30);
        assert!(!q.debug());

        let q = query(Some("Basic Kids Cut"), Some("7"), Some("true"));
        assert_eq!(q.service(), "Basic Kids Cut");
        assert_eq!(q.days(), 7);
        assert!(q.debug());

        assert_eq!(query(None, Some("10000"), None).days(), 365);
        assert_eq!(query(None, Some("0"), None).days(), 30);
    }
}
