//! Shared test utilities: synthetic JPEGs, EXIF payloads, fixture directories.
//!
//! Everything is generated in-process with the `image` crate so tests never
//! depend on files checked into the repository.

use image::{ImageEncoder, RgbImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// Smooth gradient image: compresses well.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Deterministic pseudo-random noise: compresses badly, so small images
/// still produce large files.
pub fn noise_image(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x1234_5678;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        image::Rgb([next(), next(), next()])
    })
}

/// Encode an RGB image as JPEG bytes at the given quality.
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

/// Gradient JPEG bytes of the given size.
pub fn encode_test_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    encode_jpeg(&gradient_image(width, height), quality)
}

// =========================================================================
// Metadata
// =========================================================================

/// A minimal big-endian TIFF structure with one IFD entry (Orientation = 1).
pub fn sample_exif() -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\0\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1u16.to_be_bytes()); // entry count
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes()); // count
    tiff.extend_from_slice(&[0x00, 0x01, 0x00, 0x00]); // value
    tiff.extend_from_slice(&0u32.to_be_bytes()); // next IFD
    tiff
}

/// Insert a raw APP1 segment with `body` right after SOI.
pub fn with_app1(jpeg: &[u8], body: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut out = Vec::with_capacity(jpeg.len() + body.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Insert a proper EXIF APP1 segment (`Exif\0\0` + `tiff`) right after SOI.
pub fn with_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    let mut body = b"Exif\0\0".to_vec();
    body.extend_from_slice(tiff);
    with_app1(jpeg, &body)
}

// =========================================================================
// Fixture files
// =========================================================================

/// Write bytes to `dir/name`, creating `dir` if needed.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), bytes).unwrap();
}
