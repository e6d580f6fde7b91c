use actix_web::{HttpResponse, get, web};

use crate::error::ApiError;
use crate::handlers::health::calendar_auth_url;
use crate::state::AppState;

#[get("/auth-url")]
async fn auth_url(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(calendar_auth_url(&state)?))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(auth_url);
}
