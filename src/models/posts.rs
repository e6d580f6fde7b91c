use serde::{Deserialize, Serialize};

pub const DEFAULT_ALT: &str = "Instagram post from @booknow.hair";
const ALT_CAPTION_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Api,
    Fallback,
}

/// A post as pulled from the social feed, before its image is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePost {
    pub id: String,
    pub shortcode: String,
    pub display_url: String,
    pub caption: String,
    pub permalink: String,
    pub timestamp: i64,
}

impl SourcePost {
    pub fn filename(&self) -> String {
        format!("{}.jpg", self.shortcode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPost {
    pub id: String,
    pub shortcode: String,
    pub caption: String,
    pub permalink: String,
    pub timestamp: i64,
    pub filename: String,
    pub image_url: String,
}

/// On-disk record describing the current image cache. Replaced wholesale on
/// every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub posts: Vec<CachedPost>,
    pub source: CacheSource,
    pub count: usize,
}

/// A cached post as served to the gallery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub image_url: String,
    pub alt: String,
    pub caption: String,
    pub permalink: String,
}

impl From<&CachedPost> for PostView {
    fn from(post: &CachedPost) -> Self {
        Self {
            id: post.id.clone(),
            image_url: post.image_url.clone(),
            alt: alt_text(&post.caption),
            caption: post.caption.clone(),
            permalink: post.permalink.clone(),
        }
    }
}

pub fn alt_text(caption: &str) -> String {
    if caption.is_empty() {
        return DEFAULT_ALT.to_string();
    }
    let truncated: String = caption.chars().take(ALT_CAPTION_CHARS).collect();
    format!("{truncated}...")
}
