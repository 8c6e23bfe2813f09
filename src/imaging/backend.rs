//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three primitives the encoder and
//! the batch driver need: decode, resize, and quality-parameterized encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of
//! the `image` crate. Tests use the recording mock in [`tests`], which fakes
//! encoded sizes so the search policy can be exercised deterministically.

use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image codec backends.
///
/// `Sync` so one backend can be shared by every worker in the pool.
pub trait ImageBackend: Sync {
    /// Decode JPEG bytes into a pixel grid.
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width` x `height`.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encode as baseline JPEG at the given quality.
    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError>;
}
