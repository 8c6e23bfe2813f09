//! Parameter types for the size-constrained encoder.
//!
//! These describe *what* the encoder should aim for, not *how* it gets there.
//! They are the interface between the batch driver (which knows about files
//! and metadata) and [`operations`](super::operations) (which runs the search).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (0–100). Clamped on construction.
//! - [`GiveUpPolicy`]: what to do when the search floor is hit without meeting the ceiling.
//! - [`FitConfig`]: everything one image needs: ceiling, magnification, policy, fast path.

use serde::{Deserialize, Serialize};

/// JPEG quality setting (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Quality(u8);

impl Quality {
    /// Quality the adaptive search starts at, and the give-up fallback encodes at.
    pub const SEARCH_START: Quality = Quality(95);
    /// Quality used for a single explicit-magnification pass.
    pub const MAGNIFIED: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::SEARCH_START
    }
}

/// Behavior when the adaptive search reaches its floor without meeting the ceiling.
///
/// Applied uniformly to every file in a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum GiveUpPolicy {
    /// Encode the original, undownsized image at quality 95 and write it anyway.
    #[default]
    KeepOriginal,
    /// Report the file as failed, naming the ceiling and the best size reached.
    Fail,
}

/// Optional starting-scale prediction.
///
/// Assumes a fixed compressed size per pixel so the measured loop can skip
/// the first few obviously-too-large attempts. The loop still measures every
/// attempt; this only picks where it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub bytes_per_pixel: f64,
}

/// Parameters for fitting one decoded image under a byte ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    /// Maximum output size in bytes, metadata included.
    pub ceiling: u64,
    /// Bytes of the ceiling held back for data appended after encoding
    /// (the re-embedded EXIF segment).
    pub reserved: u64,
    /// When set, resize once by this factor at quality 100 and skip the search.
    pub magnification: Option<f64>,
    pub give_up: GiveUpPolicy,
    pub estimate: Option<Estimate>,
}

impl FitConfig {
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            reserved: 0,
            magnification: None,
            give_up: GiveUpPolicy::default(),
            estimate: None,
        }
    }

    /// Bytes available to the encoder itself.
    pub fn budget(&self) -> u64 {
        self.ceiling.saturating_sub(self.reserved)
    }

    /// Same parameters with `bytes` held back from the encoder's budget.
    pub fn reserving(self, bytes: u64) -> Self {
        Self {
            reserved: bytes,
            ..self
        }
    }
}
