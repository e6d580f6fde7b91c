use actix_web::{HttpResponse, get, post, web};

use crate::error::ApiError;
use crate::handlers::booking::{book_appointment, pending_booking, pending_bookings};
use crate::models::appointment::AppointmentRequest;
use crate::state::AppState;

#[post("/book")]
async fn book(
    state: web::Data<AppState>,
    request: web::Json<AppointmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = book_appointment(&state, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/bookings/pending")]
async fn pending(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(pending_bookings(&state))
}

#[get("/bookings/pending/{id}")]
async fn pending_by_id(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(pending_booking(&state, &id).await?))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(book).service(pending).service(pending_by_id);
}
