use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thirtyfour::error::WebDriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar client not initialized")]
    NotInitialized,

    #[error("no calendar credentials configured")]
    NotConfigured,

    #[error("invalid calendar credentials: {0}")]
    Credentials(String),

    #[error("failed to sign service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("calendar request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("calendar API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected calendar response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("booking scraper not initialized")]
    NotInitialized,

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation did not finish within {0:?}")]
    NavigationTimeout(Duration),

    #[error("scrape cancelled")]
    Cancelled,

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<WebDriverError> for ScrapeError {
    fn from(err: WebDriverError) -> Self {
        ScrapeError::Browser(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Missing required booking information: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid customer email: {0}")]
    InvalidEmail(String),

    #[error("Invalid {field}: {value}")]
    InvalidTime { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ImageCacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache metadata error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("image worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("social feed error: {0}")]
    Upstream(String),

    #[error("no images were successfully processed")]
    Exhausted,
}

/// Errors that reach an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    ImageCache(#[from] ImageCacheError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Booking(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ImageCache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::ImageCache(err) => json!({
                "success": false,
                "message": "Failed to fetch cached images",
                "error": err.to_string(),
                "posts": [],
            }),
            other => json!({
                "success": false,
                "message": other.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = BookingError::MissingFields(vec!["slotId", "customerEmail"]);
        assert_eq!(
            err.to_string(),
            "Missing required booking information: slotId, customerEmail"
        );
    }

    #[test]
    fn api_error_status_codes() {
        let validation = ApiError::from(BookingError::InvalidEmail("nope".into()));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let exhausted = ApiError::from(ImageCacheError::Exhausted);
        assert_eq!(exhausted.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = ApiError::NotFound("oauth".into());
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
