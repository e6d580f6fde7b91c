use actix_web::{HttpResponse, Responder, get, web};

use crate::handlers::health::health;
use crate::state::AppState;

#[get("")]
async fn status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(health(&state))
}

#[get("/ping")]
async fn ping() -> impl Responder {
    HttpResponse::Ok().body("pong")
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(status).service(ping);
}
