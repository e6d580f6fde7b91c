//! Runtime configuration, read from the environment (optionally seeded from `.env`).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::models::business_hours::BusinessHoursTemplate;
use crate::scraping::constants::{
    DEFAULT_BOOKING_URL, DEFAULT_WEBDRIVER_URL, SCRAPE_CACHE_TTL_SECS, SCRAPE_TIMEOUT_SECS,
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub timezone: Tz,
    pub business_hours: BusinessHoursTemplate,
    pub calendar: CalendarConfig,
    pub scraper: ScraperConfig,
    pub images: ImageCacheConfig,
}

#[derive(Debug, Clone, Default)]
pub struct CalendarConfig {
    pub calendar_id: String,
    /// Service account JSON key.
    pub service_account_key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub booking_url: String,
    pub webdriver_url: String,
    /// Skip scraping and send customers straight to the booking page.
    pub force_fallback: bool,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    pub cache_dir: PathBuf,
    pub fallback_dir: PathBuf,
    pub rapidapi_key: Option<String>,
    pub instagram_user_id: String,
    pub ttl: Duration,
    pub refresh_interval: Duration,
}

impl ImageCacheConfig {
    pub fn images_dir(&self) -> PathBuf {
        self.cache_dir.join("images")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.cache_dir.join("metadata.json")
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            booking_url: DEFAULT_BOOKING_URL.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            force_fallback: false,
            timeout: Duration::from_secs(SCRAPE_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(SCRAPE_CACHE_TTL_SECS),
        }
    }
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            fallback_dir: PathBuf::from("public/fallback-images"),
            rapidapi_key: None,
            instagram_user_id: "69993321572".to_string(),
            ttl: hours(6),
            refresh_interval: hours(6),
        }
    }
}

fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 60 * 60)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys fall back to defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(&get, "PORT", 3001u16)?;
        let timezone = match get("BUSINESS_TIMEZONE") {
            Some(name) => Tz::from_str(&name).map_err(|e| anyhow!("Invalid BUSINESS_TIMEZONE: {e}"))?,
            None => chrono_tz::America::New_York,
        };

        let holidays = match get("BUSINESS_HOLIDAYS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date in BUSINESS_HOLIDAYS: {s}"))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let calendar = CalendarConfig {
            calendar_id: get("GOOGLE_CALENDAR_ID").unwrap_or_else(|| "primary".to_string()),
            service_account_key: get("GOOGLE_SERVICE_ACCOUNT_KEY"),
            client_id: get("GOOGLE_CLIENT_ID"),
            client_secret: get("GOOGLE_CLIENT_SECRET"),
            refresh_token: get("GOOGLE_REFRESH_TOKEN"),
            redirect_uri: get("GOOGLE_REDIRECT_URI"),
        };

        let scraper_defaults = ScraperConfig::default();
        let scraper = ScraperConfig {
            booking_url: get("BOOKING_PAGE_URL").unwrap_or(scraper_defaults.booking_url),
            webdriver_url: get("WEBDRIVER_URL").unwrap_or(scraper_defaults.webdriver_url),
            force_fallback: parse_or(&get, "SCRAPER_FORCE_FALLBACK", false)?,
            timeout: Duration::from_secs(parse_or(&get, "SCRAPER_TIMEOUT_SECONDS", SCRAPE_TIMEOUT_SECS)?),
            cache_ttl: scraper_defaults.cache_ttl,
        };

        let image_defaults = ImageCacheConfig::default();
        let images = ImageCacheConfig {
            cache_dir: get("CACHE_DIR").map(PathBuf::from).unwrap_or(image_defaults.cache_dir),
            fallback_dir: get("FALLBACK_IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(image_defaults.fallback_dir),
            rapidapi_key: get("RAPIDAPI_KEY"),
            instagram_user_id: get("INSTAGRAM_USER_ID").unwrap_or(image_defaults.instagram_user_id),
            ttl: hours(parse_or(&get, "IMAGE_CACHE_TTL_HOURS", 6)?),
            refresh_interval: hours(parse_or(&get, "IMAGE_REFRESH_INTERVAL_HOURS", 6)?),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            timezone,
            business_hours: BusinessHoursTemplate::default().with_holidays(holidays),
            calendar,
            scraper,
            images,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {key} value: {raw}")),
        None => Ok(default),
    }
}
