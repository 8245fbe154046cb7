//! Upload normalization: every accepted image is bounded in size and re-encoded
//! as lossy WebP before it reaches object storage.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` with format sniffing |
//! | Resize | `DynamicImage::resize` with `Lanczos3`, never upscaling |
//! | Encode | `webp::Encoder` (libwebp, lossy) |

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use rand::Rng;

use crate::config::UploadConfig;

/// MIME types accepted from clients.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// MIME type of every stored upload.
pub const OUTPUT_MIME_TYPE: &str = "image/webp";

/// Stored uploads never change under the same key.
pub const UPLOAD_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("file is {actual} bytes, limit is {limit}")]
    TooLarge { actual: usize, limit: usize },
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode WebP: {0}")]
    Encode(String),
    #[error("image worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub max_dimension: u32,
    pub quality: f32,
}

impl From<&UploadConfig> for UploadLimits {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_dimension: config.max_dimension,
            quality: config.webp_quality.clamp(0.0, 100.0),
        }
    }
}

#[derive(Debug)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Whether a client-declared MIME type is accepted.
pub fn is_accepted_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}

/// Cheap checks that must pass before any decoding starts.
pub fn check_upload(mime: &str, size: usize, limits: &UploadLimits) -> Result<(), ImageError> {
    if !is_accepted_mime(mime) {
        return Err(ImageError::UnsupportedType(mime.to_string()));
    }
    if size > limits.max_file_size {
        return Err(ImageError::TooLarge {
            actual: size,
            limit: limits.max_file_size,
        });
    }
    Ok(())
}

/// Decode, bound to `max_dimension` on both axes, and re-encode as WebP.
pub fn process_image(bytes: &[u8], limits: &UploadLimits) -> Result<ProcessedImage, ImageError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let max = limits.max_dimension;
    let img = if img.width() > max || img.height() > max {
        img.resize(max, max, FilterType::Lanczos3)
    } else {
        img
    };

    // libwebp only takes 8-bit RGB(A).
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let encoder =
        webp::Encoder::from_image(&img).map_err(|e| ImageError::Encode(e.to_string()))?;
    let encoded = encoder.encode(limits.quality).to_vec();

    let (width, height) = ImageReader::new(Cursor::new(&encoded))
        .with_guessed_format()
        .map_err(|e| ImageError::Encode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    Ok(ProcessedImage {
        bytes: encoded,
        width,
        height,
    })
}

/// Validate, then run the CPU-bound pipeline on the blocking pool.
pub async fn process_upload(
    bytes: Vec<u8>,
    mime: &str,
    limits: UploadLimits,
) -> Result<ProcessedImage, ImageError> {
    check_upload(mime, bytes.len(), &limits)?;
    tokio::task::spawn_blocking(move || process_image(&bytes, &limits))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
}

const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Fresh object key: `uploads/<unix-millis>-<13 random [a-z0-9]>.webp`.
pub fn storage_key(now_millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..13)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!("uploads/{now_millis}-{suffix}.webp")
}
