use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::images::manager::DEFAULT_POST_LIMIT;
use crate::models::posts::PostView;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub success: bool,
    pub posts: Vec<PostView>,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: &'static str,
    pub posts: Vec<PostView>,
    pub timestamp: DateTime<Utc>,
}

pub async fn cached_posts(state: &AppState, limit: Option<usize>) -> Result<PostsResponse, ApiError> {
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_POST_LIMIT);
    let posts = state.images.get_cached_posts(limit).await?;
    Ok(PostsResponse {
        success: true,
        posts,
        cached: true,
        timestamp: Utc::now(),
    })
}

pub async fn refresh_cache(state: &AppState) -> Result<RefreshResponse, ApiError> {
    info!("Manual image cache refresh requested");
    state.images.update_cache().await?;
    let posts = state.images.get_cached_posts(DEFAULT_POST_LIMIT).await?;
    Ok(RefreshResponse {
        success: true,
        message: "Cache refreshed successfully",
        posts,
        timestamp: Utc::now(),
    })
}

/// Only bare file names are served; anything that could walk the tree is refused.
pub fn safe_filename(name: &str) -> Option<&str> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    ok.then_some(name)
}
