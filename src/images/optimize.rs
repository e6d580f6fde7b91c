use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};

use crate::error::ImageCacheError;

pub const IMAGE_SIZE: u32 = 400;
pub const JPEG_QUALITY: u8 = 85;

// warm browns, picked by the last digit of the post id
const PLACEHOLDER_COLORS: [[u8; 3]; 6] = [
    [0x8B, 0x45, 0x13],
    [0xDE, 0xB8, 0x87],
    [0xD2, 0x69, 0x1E],
    [0xCD, 0x85, 0x3F],
    [0xF4, 0xA4, 0x60],
    [0xBC, 0x8F, 0x8F],
];

/// Center-crops to a square gallery tile and re-encodes as JPEG.
///
/// CPU bound; run it on the blocking pool.
pub fn optimize_image(bytes: &[u8]) -> Result<Vec<u8>, ImageCacheError> {
    let source = image::load_from_memory(bytes)?;
    let tile = source.resize_to_fill(IMAGE_SIZE, IMAGE_SIZE, FilterType::Lanczos3);
    encode_jpeg(&tile.to_rgb8())
}

/// A solid colour tile for posts whose real image is unavailable.
pub fn placeholder_image(post_id: &str) -> Result<Vec<u8>, ImageCacheError> {
    let index = post_id
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as usize;
    let color = PLACEHOLDER_COLORS[index % PLACEHOLDER_COLORS.len()];
    encode_jpeg(&RgbImage::from_pixel(IMAGE_SIZE, IMAGE_SIZE, Rgb(color)))
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, ImageCacheError> {
    let mut out = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
    Ok(out)
}
