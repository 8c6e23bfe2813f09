//! # jpeg-fit
//!
//! Batch-fit a directory of JPEG photos under a byte-size ceiling.
//! Every JPEG in the source directory gets a counterpart in the destination
//! directory that is at or below the ceiling, with its EXIF block carried
//! over unchanged.
//!
//! # Pipeline
//!
//! ```text
//! source/  →  discover  →  worker pool  →  dest/
//!                          (read, extract EXIF, decode,
//!                           copy or fit, re-embed, write)
//! ```
//!
//! Files below the ceiling are copied byte-for-byte. Everything else is
//! re-encoded by a measured search over JPEG quality and resolution: each
//! attempt is actually encoded and its size checked, so the result is exact
//! rather than predicted.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Batch driver: file discovery, worker pool, per-file pipeline, reports |
//! | [`imaging`] | Codec backend, JPEG segment parser, EXIF carry-over, fit-to-ceiling search |
//! | [`config`] | Optional `jpeg-fit.toml` loading, validation, and the immutable [`config::RunConfig`] |
//! | [`output`] | CLI output formatting for progress events, summaries, and plans |
//!
//! # Design Decisions
//!
//! ## Measured Search Over Prediction
//!
//! JPEG size depends on content far more than on pixel count, so the search
//! never trusts a model: it starts at full resolution and quality 95 and
//! tightens in steps sized by how far off the last attempt was. The optional
//! estimate only picks a lower starting scale; every candidate is still
//! encoded and measured.
//!
//! ## EXIF Travels As Opaque Bytes
//!
//! The APP1 payload is never parsed into tags. It is lifted out of the source
//! before decoding and put back into the encoder output as-is, so every
//! maker note and private tag survives. Its size is subtracted from the
//! budget up front, so the ceiling holds with metadata included.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, and encoding all use the `image` crate.
//! The binary has no system library dependencies.
//!
//! ## Bounded Parallelism
//!
//! A dedicated rayon pool caps the number of decoded images held in memory
//! at once. Files are independent, so the only shared state is the progress
//! counter.

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
