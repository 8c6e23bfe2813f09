//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` JPEG codec, quality-parameterized |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Segments** | custom marker parser (SOI … SOS + verbatim scan data) |
//! | **EXIF** | APP1 `Exif\0\0` extract / re-embed on top of the segment parser |
//! | **Fit to ceiling** | measured (scale, quality) search |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the search policy and dimension math (unit testable)
//! - **Parameters**: Data structures describing what the encoder aims for
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Segments / EXIF**: JPEG structure handling, independent of pixel data
//! - **Operations**: The search itself, combining calculations + backend

pub mod backend;
mod calculations;
pub mod exif;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod segments;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    MAX_TARGET_BYTES, MIN_QUALITY, MIN_SCALE, SearchStep, checked_scaled_dimensions,
    scaled_dimensions, size_ratio,
};
pub use exif::ExifPayload;
pub use operations::{Encoded, FitError, FitMethod, fit_to_ceiling};
pub use params::{Estimate, FitConfig, GiveUpPolicy, Quality};
pub use rust_backend::{JPEG_EXTENSIONS, RustBackend};
