pub mod manager;
pub mod optimize;
pub mod source;

pub use manager::ImageCacheManager;
pub use source::{PostSource, RapidApiInstagram};
