use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::config::ImageCacheConfig;
use crate::error::ImageCacheError;
use crate::models::posts::SourcePost;

pub const MAX_POSTS: usize = 6;

const FEED_HOST: &str = "instagram-looter2.p.rapidapi.com";
const FEED_PAGE_SIZE: u32 = 12;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Where gallery posts and their images come from.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<SourcePost>, ImageCacheError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageCacheError>;
}

/// The shop's Instagram feed through RapidAPI.
pub struct RapidApiInstagram {
    http: reqwest::Client,
    api_key: Option<String>,
    user_id: String,
}

impl RapidApiInstagram {
    pub fn new(config: &ImageCacheConfig) -> Result<Self, ImageCacheError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_key: config.rapidapi_key.clone(),
            user_id: config.instagram_user_id.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    data: Option<FeedData>,
}

#[derive(Debug, Deserialize)]
struct FeedData {
    user: Option<FeedUser>,
}

#[derive(Debug, Deserialize)]
struct FeedUser {
    edge_owner_to_timeline_media: Option<Edges<MediaNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Edges<T> {
    #[serde(default)]
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    id: String,
    shortcode: String,
    display_url: String,
    #[serde(default)]
    is_video: bool,
    #[serde(default)]
    taken_at_timestamp: i64,
    edge_media_to_caption: Option<Edges<CaptionNode>>,
}

#[derive(Debug, Deserialize)]
struct CaptionNode {
    text: String,
}

/// Keeps the first few image posts of a feed page.
fn posts_from_feed(feed: FeedResponse) -> Result<Vec<SourcePost>, ImageCacheError> {
    let media = feed
        .data
        .ok_or_else(|| ImageCacheError::Upstream("invalid feed response structure".to_string()))?
        .user
        .and_then(|u| u.edge_owner_to_timeline_media)
        .map(|m| m.edges)
        .unwrap_or_default();

    if media.is_empty() {
        return Err(ImageCacheError::Upstream("no posts found in feed".to_string()));
    }

    Ok(media
        .into_iter()
        .map(|edge| edge.node)
        .filter(|node| !node.is_video)
        .take(MAX_POSTS)
        .map(|node| {
            let caption = node
                .edge_media_to_caption
                .and_then(|c| c.edges.into_iter().next())
                .map(|edge| edge.node.text)
                .unwrap_or_default();
            SourcePost {
                permalink: format!("https://instagram.com/p/{}/", node.shortcode),
                id: node.id,
                shortcode: node.shortcode,
                display_url: node.display_url,
                caption,
                timestamp: node.taken_at_timestamp,
            }
        })
        .collect())
}

#[async_trait]
impl PostSource for RapidApiInstagram {
    async fn fetch_posts(&self) -> Result<Vec<SourcePost>, ImageCacheError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ImageCacheError::Upstream("RAPIDAPI_KEY is not set".to_string()));
        };

        info!("Fetching Instagram posts from API...");
        let count = FEED_PAGE_SIZE.to_string();
        let response = self
            .http
            .get(format!("https://{FEED_HOST}/user-feeds2"))
            .query(&[("id", self.user_id.as_str()), ("count", count.as_str())])
            .header("x-rapidapi-key", key)
            .header("x-rapidapi-host", FEED_HOST)
            .send()
            .await?
            .error_for_status()?;

        let posts = posts_from_feed(response.json().await?)?;
        info!(count = posts.len(), "Fetched Instagram posts");
        Ok(posts)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageCacheError> {
        let bytes = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
