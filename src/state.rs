use std::sync::Arc;

use crate::availability::AvailabilityResolver;
use crate::images::ImageCacheManager;

/// Services shared by every worker, built once in `main`.
pub struct AppState {
    pub resolver: AvailabilityResolver,
    pub images: Arc<ImageCacheManager>,
}

impl AppState {
    pub fn new(resolver: AvailabilityResolver, images: Arc<ImageCacheManager>) -> Self {
        Self { resolver, images }
    }
}
