mod availability;
mod cache;
mod calendar;
mod config;
mod error;
mod handlers;
mod images;
mod models;
mod routes;
mod scraping;
mod state;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::availability::AvailabilityResolver;
use crate::cache::PendingBookingStore;
use crate::calendar::{CalendarService, GoogleCalendar};
use crate::config::AppConfig;
use crate::images::{ImageCacheManager, RapidApiInstagram};
use crate::scraping::browser::WebDriverLauncher;
use crate::scraping::scraper::BookingPageScraper;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("No .env file found, using process environment");
    }
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let calendar = Arc::new(GoogleCalendar::new(
        config.calendar.clone(),
        config.business_hours.clone(),
        config.timezone,
    ));
    if calendar.initialize().await {
        info!("Google Calendar connected");
    } else {
        warn!("Google Calendar unavailable, availability will use fallback sources");
    }

    let launcher = Arc::new(WebDriverLauncher::new(config.scraper.webdriver_url.clone()));
    let scraper = Arc::new(BookingPageScraper::new(launcher, &config.scraper, config.timezone));
    let resolver = AvailabilityResolver::new(
        calendar,
        scraper,
        PendingBookingStore::new(),
        &config.scraper,
        config.timezone,
    );

    let source = RapidApiInstagram::new(&config.images).context("Failed to build feed client")?;
    let images = Arc::new(ImageCacheManager::new(config.images.clone(), Arc::new(source)));
    {
        let images = images.clone();
        tokio::spawn(async move {
            if let Err(e) = images.initialize_cache().await {
                error!("Image cache initialization failed: {}", e);
            }
            images.run_periodic_refresh().await;
        });
    }

    let state = web::Data::new(AppState::new(resolver, images));

    info!(host = %config.host, port = config.port, "Starting booking backend");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::init))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;
    Ok(())
}
