use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{error, info, warn};

use crate::config::ImageCacheConfig;
use crate::error::ImageCacheError;
use crate::images::optimize::{optimize_image, placeholder_image};
use crate::images::source::{MAX_POSTS, PostSource};
use crate::models::posts::{CacheMetadata, CacheSource, CachedPost, PostView, SourcePost};

pub const CACHE_URL_PREFIX: &str = "/images/cache";
pub const DEFAULT_POST_LIMIT: usize = 6;

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const FALLBACK_PERMALINK: &str = "https://instagram.com/booknow.hair/";

/// Keeps a small on-disk gallery of recent social posts.
///
/// Everything the gallery serves is described by one metadata document that is
/// rewritten in full on each refresh; nothing edits it in place.
pub struct ImageCacheManager {
    config: ImageCacheConfig,
    source: Arc<dyn PostSource>,
}

impl ImageCacheManager {
    pub fn new(config: ImageCacheConfig, source: Arc<dyn PostSource>) -> Self {
        Self { config, source }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.config.images_dir()
    }

    pub fn fallback_dir(&self) -> &Path {
        &self.config.fallback_dir
    }

    pub async fn initialize_cache(&self) -> Result<(), ImageCacheError> {
        fs::create_dir_all(&self.config.cache_dir).await?;
        fs::create_dir_all(self.images_dir()).await?;
        fs::create_dir_all(&self.config.fallback_dir).await?;

        if self.is_cache_valid().await {
            info!("Using existing valid image cache");
            return Ok(());
        }

        info!("Image cache is invalid or expired, updating...");
        self.update_cache().await.map(|_| ())
    }

    pub async fn is_cache_valid(&self) -> bool {
        let metadata = match self.read_metadata().await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return false,
            Err(e) => {
                warn!("Error checking image cache validity: {}", e);
                return false;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - metadata.timestamp;
        let fresh = u128::try_from(age_ms)
            .map(|age| age < self.config.ttl.as_millis())
            .unwrap_or(true);
        if !fresh {
            info!(hours = age_ms / 3_600_000, "Image cache expired");
        }
        fresh && !metadata.posts.is_empty()
    }

    async fn read_metadata(&self) -> Result<Option<CacheMetadata>, ImageCacheError> {
        match fs::read(self.config.metadata_path()).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Pulls fresh posts, or placeholders when the feed can't deliver, and
    /// replaces the metadata document. Fails only when nothing at all could
    /// be cached.
    pub async fn update_cache(&self) -> Result<CacheMetadata, ImageCacheError> {
        info!("Starting image cache update...");
        if let Err(e) = fs::create_dir_all(self.images_dir()).await {
            warn!("Could not create image cache directory: {}", e);
        }

        let from_api = match self.source.fetch_posts().await {
            Ok(posts) if !posts.is_empty() => self.download_posts(posts).await,
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("Feed fetch failed, will use fallback images: {}", e);
                Vec::new()
            }
        };

        let (posts, source) = if from_api.is_empty() {
            info!("Using fallback images...");
            (self.stage_fallback_posts().await, CacheSource::Fallback)
        } else {
            (from_api, CacheSource::Api)
        };

        if posts.is_empty() {
            error!("No images were successfully processed");
            return Err(ImageCacheError::Exhausted);
        }

        let metadata = CacheMetadata {
            timestamp: Utc::now().timestamp_millis(),
            count: posts.len(),
            posts,
            source,
        };
        self.write_metadata(&metadata).await?;

        info!(
            count = metadata.count,
            source = ?metadata.source,
            "Image cache updated"
        );
        Ok(metadata)
    }

    async fn download_posts(&self, posts: Vec<SourcePost>) -> Vec<CachedPost> {
        let mut cached = Vec::new();
        for post in posts.into_iter().take(MAX_POSTS) {
            let filename = post.filename();
            match self.download_one(&post, &filename).await {
                Ok(()) => cached.push(cached_post(post, filename)),
                Err(e) => error!(file = %filename, "Error downloading image: {}", e),
            }
        }
        cached
    }

    async fn download_one(&self, post: &SourcePost, filename: &str) -> Result<(), ImageCacheError> {
        let bytes = self.source.download(&post.display_url).await?;
        let optimized = tokio::task::spawn_blocking(move || optimize_image(&bytes)).await??;
        fs::write(self.images_dir().join(filename), optimized).await?;
        info!(file = %filename, "Image optimized and saved");
        Ok(())
    }

    async fn stage_fallback_posts(&self) -> Vec<CachedPost> {
        let mut cached = Vec::new();
        for post in fallback_posts() {
            let filename = post.filename();
            match self.stage_fallback(&post, &filename).await {
                Ok(()) => cached.push(cached_post(post, filename)),
                Err(e) => error!(file = %filename, "Error setting up fallback image: {}", e),
            }
        }
        cached
    }

    async fn stage_fallback(&self, post: &SourcePost, filename: &str) -> Result<(), ImageCacheError> {
        let staged = self.config.fallback_dir.join(filename);
        let target = self.images_dir().join(filename);

        if fs::try_exists(&staged).await? {
            fs::copy(&staged, &target).await?;
            return Ok(());
        }

        let id = post.id.clone();
        let placeholder = tokio::task::spawn_blocking(move || placeholder_image(&id)).await??;
        fs::write(&target, placeholder).await?;
        Ok(())
    }

    async fn write_metadata(&self, metadata: &CacheMetadata) -> Result<(), ImageCacheError> {
        let json = serde_json::to_vec_pretty(metadata)?;
        let dir = self.config.cache_dir.clone();
        let path = self.config.metadata_path();

        // readers only ever see the old document or the new one
        tokio::task::spawn_blocking(move || -> Result<(), ImageCacheError> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    /// Up to `limit` posts whose image is actually on disk. Builds the cache
    /// first if there is no usable metadata yet.
    pub async fn get_cached_posts(&self, limit: usize) -> Result<Vec<PostView>, ImageCacheError> {
        let metadata = match self.read_metadata().await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                info!("No cached metadata found, initializing...");
                self.update_cache().await?
            }
            Err(e) => {
                warn!("Unreadable image cache metadata, rebuilding: {}", e);
                self.update_cache().await?
            }
        };

        let mut posts = Vec::new();
        for post in metadata.posts.iter().take(limit) {
            match fs::try_exists(self.images_dir().join(&post.filename)).await {
                Ok(true) => posts.push(PostView::from(post)),
                Ok(false) => warn!(file = %post.filename, "Cached image missing on disk"),
                Err(e) => warn!(file = %post.filename, "Could not check cached image: {}", e),
            }
        }
        Ok(posts)
    }

    /// Refreshes on a fixed interval until the process exits. Failures are
    /// only logged; the previous cache stays in place.
    pub async fn run_periodic_refresh(self: Arc<Self>) {
        let period = self.config.refresh_interval.max(MIN_REFRESH_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        // the first tick fires immediately and startup already initialized
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!("Running scheduled image cache update...");
            match self.update_cache().await {
                Ok(_) => info!("Scheduled image cache update completed"),
                Err(e) => error!("Scheduled image cache update failed: {}", e),
            }
        }
    }
}

fn cached_post(post: SourcePost, filename: String) -> CachedPost {
    CachedPost {
        image_url: format!("{CACHE_URL_PREFIX}/{filename}"),
        id: post.id,
        shortcode: post.shortcode,
        caption: post.caption,
        permalink: post.permalink,
        timestamp: post.timestamp,
        filename,
    }
}

fn fallback_posts() -> Vec<SourcePost> {
    let now = Utc::now().timestamp();
    (1..=MAX_POSTS)
        .map(|i| SourcePost {
            id: format!("fallback_{i}"),
            shortcode: format!("fallback{i}"),
            display_url: String::new(),
            caption: format!("Professional barbering service - Style {i}"),
            permalink: FALLBACK_PERMALINK.to_string(),
            timestamp: now,
        })
        .collect()
}
