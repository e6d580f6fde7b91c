use actix_files::NamedFile;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;

use crate::error::ApiError;
use crate::handlers::images::{cached_posts, refresh_cache, safe_filename};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PostsQuery {
    limit: Option<usize>,
}

#[get("/posts")]
async fn posts(
    state: web::Data<AppState>,
    query: web::Query<PostsQuery>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(cached_posts(&state, query.limit).await?))
}

#[post("/refresh")]
async fn refresh(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(refresh_cache(&state).await?))
}

#[get("/cache/{filename}")]
async fn cached_image(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<NamedFile, ApiError> {
    let name = safe_filename(&filename).ok_or_else(|| ApiError::NotFound(filename.to_string()))?;
    NamedFile::open_async(state.images.images_dir().join(name))
        .await
        .map_err(|_| ApiError::NotFound(name.to_string()))
}

#[get("/fallback/{filename}")]
async fn fallback_image(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<NamedFile, ApiError> {
    let name = safe_filename(&filename).ok_or_else(|| ApiError::NotFound(filename.to_string()))?;
    NamedFile::open_async(state.images.fallback_dir().join(name))
        .await
        .map_err(|_| ApiError::NotFound(name.to_string()))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(posts)
        .service(refresh)
        .service(cached_image)
        .service(fallback_image);
}
