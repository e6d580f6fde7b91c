use actix_web::http::header::{CACHE_CONTROL, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};

use crate::handlers::availability::{AvailabilityQuery, get_available_slots};
use crate::state::AppState;

#[get("")]
async fn availability(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<AvailabilityQuery>,
) -> impl Responder {
    let body = get_available_slots(&state, &query, req.path()).await;
    HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, HeaderValue::from_static("no-store")))
        .json(body)
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(availability);
}
