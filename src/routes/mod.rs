pub mod availability;
pub mod booking;
pub mod calendar;
pub mod health;
pub mod images;

use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::init))
        .service(web::scope("/availability").configure(availability::init))
        .service(web::scope("/calendar").configure(calendar::init))
        .service(web::scope("/images").configure(images::init))
        .configure(booking::init);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::http::header::CACHE_CONTROL;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use crate::availability::AvailabilityResolver;
    use crate::cache::PendingBookingStore;
    use crate::calendar::MockCalendarService;
    use crate::config::{ImageCacheConfig, ScraperConfig};
    use crate::images::{ImageCacheManager, RapidApiInstagram};
    use crate::scraping::scraper::tests::{PageBehavior, scraper_with};
    use crate::state::AppState;

    // calendar offline, browser unavailable, no feed key: every request
    // exercises the fallback paths without touching the network
    fn offline_state(dir: &TempDir) -> web::Data<AppState> {
        let mut calendar = MockCalendarService::new();
        calendar.expect_initialize().returning(|| false);
        calendar.expect_is_initialized().returning(|| false);
        calendar.expect_authorization_url().returning(|| None);

        let (scraper, _) = scraper_with(PageBehavior::Hang, false);
        let resolver = AvailabilityResolver::new(
            Arc::new(calendar),
            Arc::new(scraper),
            PendingBookingStore::new(),
            &ScraperConfig::default(),
            chrono_tz::America::New_York,
        );

        let images_config = ImageCacheConfig {
            cache_dir: dir.path().join("cache"),
            fallback_dir: dir.path().join("fallback-images"),
            ..ImageCacheConfig::default()
        };
        let source = RapidApiInstagram::new(&images_config).unwrap();
        let images = ImageCacheManager::new(images_config, Arc::new(source));

        web::Data::new(AppState::new(resolver, Arc::new(images)))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(super::init)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_calendar_state() {
        let dir = TempDir::new().unwrap();
        let app = app!(offline_state(&dir));

        let req = test::TestRequest::get().uri("/health/ping").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"pong"));

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["calendar"]["initialized"], false);
    }

    #[actix_web::test]
    async fn availability_falls_back_and_is_never_cached() {
        let dir = TempDir::new().unwrap();
        let app = app!(offline_state(&dir));

        let req = test::TestRequest::get()
            .uri("/availability?days=oops&debug=true")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CACHE_CONTROL).unwrap(), "no-store");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["service"], "Premium Haircut");
        assert_eq!(body["source"], "synthetic");
        assert!(!body["slots"].as_array().unwrap().is_empty());
        assert_eq!(body["diagnostics"]["path"], "/availability");
        assert_eq!(body["diagnostics"]["attempts"][0]["outcome"], "failed");

        let req = test::TestRequest::get().uri("/availability").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.get("diagnostics").is_none());
    }

    #[actix_web::test]
    async fn booking_validation_is_a_bad_request() {
        let dir = TempDir::new().unwrap();
        let app = app!(offline_state(&dir));

        let req = test::TestRequest::post()
            .uri("/book")
            .set_json(json!({ "serviceType": "Premium Haircut" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("slotId"));
    }

    #[actix_web::test]
    async fn booking_without_calendar_is_pending() {
        let dir = TempDir::new().unwrap();
        let app = app!(offline_state(&dir));

        let req = test::TestRequest::post()
            .uri("/book")
            .set_json(json!({
                "slotId": "2026-10-19-09-00",
                "startTime": "2026-10-19T09:00:00-04:00",
                "serviceType": "Premium Haircut",
                "customerName": "Jordan Lee",
                "customerEmail": "jordan@example.com",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fallback"], true);
        assert_eq!(body["warning"], "Calendar integration temporarily unavailable");
        let id = body["bookingId"].as_str().unwrap().to_string();
        assert!(id.starts_with("booking_"));
        assert_eq!(body["appointment"]["endTime"], "2026-10-19T09:30:00-04:00");

        let req = test::TestRequest::get().uri("/bookings/pending").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["bookings"][0]["id"], id.as_str());

        let req = test::TestRequest::get()
            .uri(&format!("/bookings/pending/{id}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"]["state"], "pendingConfirmation");

        let req = test::TestRequest::get()
            .uri("/bookings/pending/booking_missing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn auth_url_is_not_found_without_oauth_client() {
        let dir = TempDir::new().unwrap();
        let app = app!(offline_state(&dir));

        let req = test::TestRequest::get().uri("/calendar/auth-url").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn gallery_serves_placeholder_posts_and_files() {
        let dir = TempDir::new().unwrap();
        let app = app!(offline_state(&dir));

        let req = test::TestRequest::get().uri("/images/posts?limit=2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["cached"], true);
        let posts = body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 2);

        let url = posts[0]["imageUrl"].as_str().unwrap().to_string();
        assert!(url.starts_with("/images/cache/fallback"));
        let req = test::TestRequest::get().uri(&url).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/images/cache/.metadata").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/images/refresh").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Cache refreshed successfully");
        assert_eq!(body["posts"].as_array().unwrap().len(), 6);
    }
}
