//! Pure calculation functions for the size-constrained search.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Quality;

/// Below this scale the search stops.
pub const MIN_SCALE: f64 = 0.05;
/// Below this quality the search stops.
pub const MIN_QUALITY: u8 = 15;

/// Overshoot above which resolution is cut hard.
const LARGE_OVERSHOOT: f64 = 5.0;
/// Overshoot above which quality steps are coarse.
const MEDIUM_OVERSHOOT: f64 = 2.0;

/// One point in the (scale, quality) search space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStep {
    /// Width multiplier, 1.0 = original.
    pub scale: f64,
    pub quality: Quality,
}

impl SearchStep {
    /// Where the adaptive search begins: full resolution, quality 95.
    pub fn initial() -> Self {
        Self {
            scale: 1.0,
            quality: Quality::SEARCH_START,
        }
    }

    /// Compute the next attempt after an encode overshot its budget by `ratio`.
    ///
    /// | ratio | quality above floor | otherwise |
    /// |---|---|---|
    /// | > 5.0 | scale × 0.5, quality = 70 | (same) |
    /// | (2.0, 5.0] | quality − 20 (floor 60) | scale × 0.6 |
    /// | ≤ 2.0 | quality − 10 (floor 30) | scale × 0.8 |
    ///
    /// Scale never increases.
    pub fn tighten(self, ratio: f64) -> Self {
        let q = self.quality.value();
        if ratio > LARGE_OVERSHOOT {
            Self {
                scale: self.scale * 0.5,
                quality: Quality::new(70),
            }
        } else if ratio > MEDIUM_OVERSHOOT {
            if q > 60 {
                Self {
                    quality: Quality::new(u32::from(q - 20)),
                    ..self
                }
            } else {
                Self {
                    scale: self.scale * 0.6,
                    ..self
                }
            }
        } else if q > 30 {
            Self {
                quality: Quality::new(u32::from(q - 10)),
                ..self
            }
        } else {
            Self {
                scale: self.scale * 0.8,
                ..self
            }
        }
    }

    /// Whether this step has dropped below the search floor.
    pub fn is_exhausted(&self) -> bool {
        self.scale < MIN_SCALE || self.quality.value() < MIN_QUALITY
    }
}

/// How far an encoded size overshoots its budget.
///
/// A zero budget can never be met, so it reports an infinite overshoot
/// instead of dividing by zero.
pub fn size_ratio(encoded_len: u64, budget: u64) -> f64 {
    if budget == 0 {
        return f64::INFINITY;
    }
    encoded_len as f64 / budget as f64
}

/// Scale original dimensions by `scale` on the width, height following the aspect ratio.
///
/// The width is truncated (so 0.5 of an even width is exactly half), and
/// neither side drops below one pixel.
///
/// # Examples
/// ```
/// # use jpeg_fit::imaging::scaled_dimensions;
/// assert_eq!(scaled_dimensions((4000, 3000), 0.5), (2000, 1500));
/// assert_eq!(scaled_dimensions((4000, 3000), 1.0), (4000, 3000));
/// ```
pub fn scaled_dimensions(original: (u32, u32), scale: f64) -> (u32, u32) {
    let (w, h) = original;
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * new_w as f64 / w.max(1) as f64).round() as u32).max(1);
    (new_w, new_h)
}

/// Largest resize target allowed, in RGB bytes. Matches the `image` crate's
/// default decode allocation limit.
pub const MAX_TARGET_BYTES: u64 = 512 * 1024 * 1024;

/// [`scaled_dimensions`] for factors that may enlarge the image.
///
/// Returns `None` when a side would not fit in `u32` or the RGB buffer would
/// exceed [`MAX_TARGET_BYTES`].
pub fn checked_scaled_dimensions(original: (u32, u32), scale: f64) -> Option<(u32, u32)> {
    let (w, h) = original;
    let new_w = (w as f64 * scale).trunc().max(1.0);
    let new_h = (h as f64 * new_w / w.max(1) as f64).round().max(1.0);
    if !(new_w.is_finite() && new_h.is_finite())
        || new_w > u32::MAX as f64
        || new_h > u32::MAX as f64
        || new_w * new_h * 3.0 > MAX_TARGET_BYTES as f64
    {
        return None;
    }
    Some((new_w as u32, new_h as u32))
}

/// Predict a starting scale assuming every pixel costs `bytes_per_pixel`.
///
/// Pixel count shrinks with the square of the scale, so the prediction is
/// `sqrt(budget / predicted_size)`, clamped to `[MIN_SCALE, 1.0]`.
pub fn estimate_start_scale(original: (u32, u32), budget: u64, bytes_per_pixel: f64) -> f64 {
    let (w, h) = original;
    let predicted = w as f64 * h as f64 * bytes_per_pixel;
    if predicted <= 0.0 || predicted <= budget as f64 {
        return 1.0;
    }
    (budget as f64 / predicted).sqrt().clamp(MIN_SCALE, 1.0)
}
