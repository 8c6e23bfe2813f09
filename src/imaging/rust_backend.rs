//! Pure Rust codec backend, no system libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode | `image::load_from_memory_with_format` (JPEG) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | EXIF | custom [`segments`](super::segments) parser, see [`exif`](super::exif) |

use super::backend::{BackendError, ImageBackend};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};

/// File extensions treated as JPEG input (compared case-insensitively).
pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode JPEG: {}", e)))
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        let (width, height) = (image.width(), image.height());

        // JPEG has no alpha channel: grayscale stays single-channel, everything else goes RGB
        let result = match image {
            DynamicImage::ImageLuma8(gray) => {
                encoder.write_image(gray.as_raw(), width, height, ExtendedColorType::L8)
            }
            other => {
                let rgb = other.to_rgb8();
                encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
        };
        result.map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_test_jpeg, gradient_image, noise_image};

    #[test]
    fn decode_synthetic_jpeg() {
        let backend = RustBackend::new();
        let img = backend.decode(&encode_test_jpeg(200, 150, 90)).unwrap();
        assert_eq!((img.width(), img.height()), (200, 150));
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode(b"definitely not a jpeg").is_err());
    }

    #[test]
    fn decode_png_bytes_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode(b"\x89PNG\r\n\x1a\n").is_err());
    }

    #[test]
    fn resize_exact_dimensions() {
        let backend = RustBackend::new();
        let img = DynamicImage::ImageRgb8(noise_image(120, 80));
        let resized = backend.resize(&img, 60, 40);
        assert_eq!((resized.width(), resized.height()), (60, 40));
    }

    #[test]
    fn encode_produces_decodable_jpeg() {
        let backend = RustBackend::new();
        let img = DynamicImage::ImageRgb8(noise_image(64, 48));
        let bytes = backend.encode(&img, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = backend.decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn lower_quality_is_smaller() {
        let backend = RustBackend::new();
        let img = DynamicImage::ImageRgb8(noise_image(128, 128));
        let high = backend.encode(&img, 95).unwrap();
        let low = backend.encode(&img, 30).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn smooth_content_encodes_smaller_than_noise() {
        let backend = RustBackend::new();
        let smooth = DynamicImage::ImageRgb8(gradient_image(128, 128));
        let noisy = DynamicImage::ImageRgb8(noise_image(128, 128));
        assert!(backend.encode(&smooth, 90).unwrap().len() < backend.encode(&noisy, 90).unwrap().len());
    }

    #[test]
    fn encode_grayscale_and_alpha_inputs() {
        let backend = RustBackend::new();
        let gray = DynamicImage::new_luma8(32, 32);
        let rgba = DynamicImage::new_rgba8(32, 32);
        assert!(backend.decode(&backend.encode(&gray, 80).unwrap()).is_ok());
        assert!(backend.decode(&backend.encode(&rgba, 80).unwrap()).is_ok());
    }
}
