//! Size-constrained encoding.
//!
//! [`fit_to_ceiling`] combines the pure step policy from
//! [`calculations`](super::calculations) with backend encode/resize calls.
//! Every attempt is really encoded and measured; the optional size estimate
//! only chooses the starting scale.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    MAX_TARGET_BYTES, SearchStep, checked_scaled_dimensions, estimate_start_scale,
    scaled_dimensions, size_ratio,
};
use super::params::{FitConfig, GiveUpPolicy, Quality};
use image::DynamicImage;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Could not reach the {ceiling}-byte ceiling (best attempt: {best} bytes)")]
    CeilingUnmet { ceiling: u64, best: u64 },
    #[error("Magnification {factor} of a {width}x{height} image exceeds the {limit}-byte size limit")]
    TargetTooLarge {
        factor: f64,
        width: u32,
        height: u32,
        limit: u64,
    },
}

/// How an [`Encoded`] result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// The adaptive search met the budget.
    Converged,
    /// One-shot resize by an explicit factor at quality 100.
    Magnified,
    /// The search gave up and the original was re-encoded at quality 95.
    KeptOriginal,
}

/// Final encoded JPEG plus the parameters that produced it.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    pub scale: f64,
    pub dimensions: Dimensions,
    /// Encode calls made, the give-up re-encode included.
    pub attempts: u32,
    pub method: FitMethod,
}

/// Encode `image` so the result fits the configured ceiling.
///
/// With an explicit magnification the image is resized once and encoded at
/// quality 100, whatever the resulting size. Otherwise the adaptive search
/// runs until an attempt fits the budget or the step falls below the search
/// floor, at which point the [`GiveUpPolicy`] decides the outcome.
pub fn fit_to_ceiling(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    config: &FitConfig,
) -> Result<Encoded, FitError> {
    match config.magnification {
        Some(factor) => magnify(backend, image, factor),
        None => search(backend, image, config),
    }
}

fn magnify(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    factor: f64,
) -> Result<Encoded, FitError> {
    let original = Dimensions::of(image);
    let (width, height) = checked_scaled_dimensions(original.as_tuple(), factor).ok_or(
        FitError::TargetTooLarge {
            factor,
            width: original.width,
            height: original.height,
            limit: MAX_TARGET_BYTES,
        },
    )?;
    let resized = backend.resize(image, width, height);
    let bytes = backend.encode(&resized, Quality::MAGNIFIED.value())?;
    tracing::debug!(factor, width, height, size = bytes.len(), "magnified");

    Ok(Encoded {
        bytes,
        quality: Quality::MAGNIFIED,
        scale: factor,
        dimensions: Dimensions { width, height },
        attempts: 1,
        method: FitMethod::Magnified,
    })
}

fn search(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    config: &FitConfig,
) -> Result<Encoded, FitError> {
    let original = Dimensions::of(image).as_tuple();
    let budget = config.budget();

    let mut step = SearchStep::initial();
    if let Some(estimate) = config.estimate {
        step.scale = estimate_start_scale(original, budget, estimate.bytes_per_pixel);
    }

    let mut attempts = 0;
    let mut best = u64::MAX;

    loop {
        let (width, height) = scaled_dimensions(original, step.scale);
        let candidate = if (width, height) == original {
            Cow::Borrowed(image)
        } else {
            Cow::Owned(backend.resize(image, width, height))
        };
        let bytes = backend.encode(&candidate, step.quality.value())?;
        attempts += 1;

        let size = bytes.len() as u64;
        let ratio = size_ratio(size, budget);
        tracing::debug!(
            scale = step.scale,
            quality = step.quality.value(),
            size,
            budget,
            ratio,
            "encode attempt"
        );

        if size <= budget {
            return Ok(Encoded {
                bytes,
                quality: step.quality,
                scale: step.scale,
                dimensions: Dimensions { width, height },
                attempts,
                method: FitMethod::Converged,
            });
        }

        best = best.min(size);
        step = step.tighten(ratio);
        if step.is_exhausted() {
            break;
        }
    }

    match config.give_up {
        GiveUpPolicy::KeepOriginal => {
            tracing::debug!(best, budget, "search exhausted, keeping original");
            let bytes = backend.encode(image, Quality::SEARCH_START.value())?;
            Ok(Encoded {
                bytes,
                quality: Quality::SEARCH_START,
                scale: 1.0,
                dimensions: Dimensions::of(image),
                attempts: attempts + 1,
                method: FitMethod::KeptOriginal,
            })
        }
        GiveUpPolicy::Fail => Err(FitError::CeilingUnmet {
            ceiling: config.ceiling,
            best: best.saturating_add(config.reserved),
        }),
    }
}
