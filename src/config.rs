//! Run configuration.
//!
//! A run is described by one immutable [`RunConfig`] built in `main` and
//! passed down to the batch driver; nothing reads configuration from global
//! state. It is assembled from three layers, later layers winning:
//!
//! 1. Stock defaults (the values shown below)
//! 2. An optional TOML file given with `--config`
//! 3. Command-line flags
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [search]
//! on_give_up = "keep-original"  # or "fail"
//! estimate_start = false        # predict the starting scale from pixel count
//! bytes_per_pixel = 0.6         # compressed size assumed by estimate_start
//!
//! [processing]
//! workers = 4                   # files processed at the same time
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{Estimate, FitConfig, GiveUpPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Files processed concurrently unless configured otherwise.
pub const DEFAULT_WORKERS: usize = 4;

/// Largest accepted `--magnify` factor.
pub const MAX_MAGNIFICATION: f64 = 100.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Contents of the optional config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Adaptive search settings.
    pub search: SearchConfig,
    /// Worker pool settings.
    pub processing: ProcessingConfig,
}

impl FileConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.search.bytes_per_pixel.is_finite() && self.search.bytes_per_pixel > 0.0) {
            return Err(ConfigError::Validation(
                "search.bytes_per_pixel must be a positive number".into(),
            ));
        }
        if self.processing.workers == 0 {
            return Err(ConfigError::Validation(
                "processing.workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Adaptive search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// What to write when the search floor is reached without meeting the ceiling.
    pub on_give_up: GiveUpPolicy,
    /// Predict the starting scale instead of always starting at full resolution.
    pub estimate_start: bool,
    /// Compressed bytes per pixel assumed by `estimate_start`.
    pub bytes_per_pixel: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            on_give_up: GiveUpPolicy::default(),
            estimate_start: false,
            bytes_per_pixel: 0.6,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of files processed at the same time.
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Load and validate a config file. No path means stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let content = fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Everything one batch run needs. Built once, never mutated during the run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Maximum output size per file, in bytes.
    pub ceiling: u64,
    /// Explicit resize factor; disables the adaptive search.
    pub magnification: Option<f64>,
    pub search: SearchConfig,
    pub workers: usize,
}

impl RunConfig {
    pub fn new(source_dir: PathBuf, dest_dir: PathBuf, ceiling: u64, file: &FileConfig) -> Self {
        Self {
            source_dir,
            dest_dir,
            ceiling,
            magnification: None,
            search: file.search,
            workers: file.processing.workers,
        }
    }

    /// Validate the assembled run configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ceiling == 0 {
            return Err(ConfigError::Validation(
                "size ceiling must be greater than 0 bytes".into(),
            ));
        }
        if let Some(factor) = self.magnification {
            if !(factor.is_finite() && factor > 0.0 && factor <= MAX_MAGNIFICATION) {
                return Err(ConfigError::Validation(format!(
                    "magnification must be greater than 0 and at most {MAX_MAGNIFICATION}, got {factor}"
                )));
            }
        }
        if self.workers == 0 {
            return Err(ConfigError::Validation(
                "worker count must be at least 1".into(),
            ));
        }
        if !(self.search.bytes_per_pixel.is_finite() && self.search.bytes_per_pixel > 0.0) {
            return Err(ConfigError::Validation(
                "search.bytes_per_pixel must be a positive number".into(),
            ));
        }
        if same_directory(&self.source_dir, &self.dest_dir) {
            return Err(ConfigError::Validation(format!(
                "destination must differ from source ({})",
                self.source_dir.display()
            )));
        }
        Ok(())
    }

    /// Encoder parameters shared by every file in the run.
    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            magnification: self.magnification,
            give_up: self.search.on_give_up,
            estimate: self.search.estimate_start.then_some(Estimate {
                bytes_per_pixel: self.search.bytes_per_pixel,
            }),
            ..FitConfig::new(self.ceiling)
        }
    }
}

/// Whether two paths name the same directory (resolving symlinks when both exist).
fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// A documented config file with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# jpeg-fit configuration
# All options are optional. Values shown are the defaults.

[search]
# What to write when quality and scale hit their floor without meeting the
# ceiling:
#   "keep-original"  re-encode the original at quality 95 and write it anyway
#   "fail"           skip the file and report the best size reached
on_give_up = "keep-original"

# Predict the starting scale from the pixel count instead of always starting
# at full resolution. Every attempt is still measured.
estimate_start = false

# Compressed bytes per pixel assumed by estimate_start.
bytes_per_pixel = 0.6

[processing]
# Number of files processed at the same time.
workers = 4
"#
}
