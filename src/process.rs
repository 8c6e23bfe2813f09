//! Batch driver: fit every JPEG in a directory under the size ceiling.
//!
//! ## Per-file Pipeline
//!
//! Each file goes through the same strictly sequential steps on one worker:
//!
//! ```text
//! read bytes → extract EXIF → decode → size check ─┬─ below ceiling → write bytes verbatim
//!                                                  └─ otherwise → fit_to_ceiling → embed EXIF → write
//! ```
//!
//! Absent or unreadable EXIF is not an error; the file is processed without
//! it. A file that cannot be read or decoded is *skipped*; one whose encode,
//! re-embed, or write fails is *failed*. Neither stops the batch.
//!
//! ## Output Writes
//!
//! Every destination file is written to a temporary sibling and renamed into
//! place, so a failed job never leaves a truncated or empty file behind.
//!
//! ## Parallel Processing
//!
//! Files run on a dedicated [rayon](https://docs.rs/rayon) pool with
//! `workers` threads (4 by default), so at most that many files are in
//! flight. [`process`] returns only once every file has an outcome. Progress
//! is reported through an optional [`ProcessEvent`] channel; the processed
//! counter behind it is the only state workers share.

use crate::config::RunConfig;
use crate::imaging::{
    ExifPayload, FitConfig, FitError, FitMethod, ImageBackend, JPEG_EXTENSIONS, RustBackend,
    exif, fit_to_ceiling,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cannot read source directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot create destination directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One file to process. Created by [`discover_jobs`], never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub fit: FitConfig,
}

impl Job {
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Already below the ceiling; written byte-for-byte.
    Copied { bytes: u64 },
    /// Re-encoded and written.
    Encoded {
        bytes: u64,
        original_bytes: u64,
        quality: u8,
        scale: f64,
        width: u32,
        height: u32,
        attempts: u32,
        method: FitMethod,
        exif: bool,
    },
    /// Could not be read or decoded.
    Skipped { reason: String },
    /// Decoded, but encoding, re-embedding, or writing failed.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Progress events, sent as work happens.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
        workers: usize,
        ceiling: u64,
    },
    FileFinished {
        /// Files finished so far, this one included.
        processed: usize,
        total: usize,
        report: FileReport,
    },
}

/// Count of outcomes for a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub copied: u32,
    pub encoded: u32,
    /// Encoded files where the search gave up and the original was kept.
    pub over_ceiling: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Copied { .. } => self.copied += 1,
            FileOutcome::Encoded { method, .. } => {
                self.encoded += 1;
                if *method == FitMethod::KeptOriginal {
                    self.over_ceiling += 1;
                }
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.copied + self.encoded + self.skipped + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} encoded, {} copied, {} skipped, {} failed ({} total)",
            self.encoded,
            self.copied,
            self.skipped,
            self.failed,
            self.total()
        )?;
        if self.over_ceiling > 0 {
            write!(f, "; {} still over the ceiling", self.over_ceiling)?;
        }
        Ok(())
    }
}

/// Everything a run produced, in source file name order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), ProcessError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Whether a path has a JPEG extension (case-insensitive).
pub fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| JPEG_EXTENSIONS.iter().any(|j| e.eq_ignore_ascii_case(j)))
}

/// List the JPEG files in the source directory (non-recursive, sorted by name).
///
/// Failing to read the directory is fatal for the whole run.
pub fn discover_jobs(config: &RunConfig) -> Result<Vec<Job>, ProcessError> {
    let read_dir_err = |source| ProcessError::ReadDir {
        path: config.source_dir.clone(),
        source,
    };

    let mut sources: Vec<PathBuf> = std::fs::read_dir(&config.source_dir)
        .map_err(read_dir_err)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_jpeg(p))
        .collect();
    sources.sort();

    let fit = config.fit_config();
    Ok(sources
        .into_iter()
        .filter_map(|source| {
            let name = source.file_name()?.to_owned();
            Some(Job {
                destination: config.dest_dir.join(name),
                source,
                fit,
            })
        })
        .collect())
}

pub fn process(
    config: &RunConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, config, progress)
}

/// Process a directory using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    config: &RunConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let jobs = discover_jobs(config)?;

    std::fs::create_dir_all(&config.dest_dir).map_err(|source| ProcessError::CreateDir {
        path: config.dest_dir.clone(),
        source,
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("jpeg-fit-worker-{i}"))
        .build()?;

    let total = jobs.len();
    if let Some(tx) = &progress {
        tx.send(ProcessEvent::BatchStarted {
            total,
            workers: config.workers,
            ceiling: config.ceiling,
        })
        .ok();
    }

    let processed = Mutex::new(0usize);

    let files: Vec<FileReport> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let report = FileReport {
                    file_name: job.file_name(),
                    outcome: process_job(backend, job),
                };

                let mut count = processed.lock().unwrap_or_else(|e| e.into_inner());
                *count += 1;
                if let Some(tx) = &progress {
                    tx.send(ProcessEvent::FileFinished {
                        processed: *count,
                        total,
                        report: report.clone(),
                    })
                    .ok();
                }
                report
            })
            .collect()
    });

    let mut summary = BatchSummary::default();
    for file in &files {
        summary.record(&file.outcome);
    }

    Ok(BatchReport { files, summary })
}

/// Run one file through the pipeline. Never panics on bad input; every
/// failure becomes a [`FileOutcome`].
pub fn process_job(backend: &impl ImageBackend, job: &Job) -> FileOutcome {
    let data = match std::fs::read(&job.source) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(file = %job.source.display(), "cannot read: {e}");
            return FileOutcome::Skipped {
                reason: format!("cannot read: {e}"),
            };
        }
    };
    let original_bytes = data.len() as u64;

    let exif = exif::extract(&data);
    match &exif {
        Some(payload) => tracing::debug!(file = %job.source.display(), bytes = payload.len(), "EXIF found"),
        None => tracing::debug!(file = %job.source.display(), "no EXIF, continuing without it"),
    }

    let image = match backend.decode(&data) {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(file = %job.source.display(), "cannot decode: {e}");
            return FileOutcome::Skipped {
                reason: e.to_string(),
            };
        }
    };

    if original_bytes < job.fit.ceiling {
        drop(image);
        return match write_atomic(&job.destination, &data) {
            Ok(()) => FileOutcome::Copied {
                bytes: original_bytes,
            },
            Err(e) => failed(job, format!("cannot write {}: {e}", job.destination.display())),
        };
    }
    drop(data);

    let fit = job
        .fit
        .reserving(exif.as_ref().map_or(0, ExifPayload::segment_len));
    let encoded = match fit_to_ceiling(backend, &image, &fit) {
        Ok(encoded) => encoded,
        Err(FitError::Backend(e)) => return failed(job, format!("encode failed: {e}")),
        Err(e) => return failed(job, e.to_string()),
    };
    drop(image);

    let quality = encoded.quality.value();
    let bytes = match exif::embed(encoded.bytes, exif.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => return failed(job, format!("cannot embed EXIF into encoded image: {e}")),
    };

    if let Err(e) = write_atomic(&job.destination, &bytes) {
        return failed(job, format!("cannot write {}: {e}", job.destination.display()));
    }

    FileOutcome::Encoded {
        bytes: bytes.len() as u64,
        original_bytes,
        quality,
        scale: encoded.scale,
        width: encoded.dimensions.width,
        height: encoded.dimensions.height,
        attempts: encoded.attempts,
        method: encoded.method,
        exif: exif.is_some(),
    }
}

fn failed(job: &Job, reason: String) -> FileOutcome {
    tracing::warn!(file = %job.source.display(), "{reason}");
    FileOutcome::Failed { reason }
}

/// Write `data` to `path` through a temporary file in the same directory.
///
/// The temporary file is removed if anything fails before the rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Dry-run decision for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    Copy,
    Encode,
}

/// A job and what [`process`] would do with it, judged by file size alone.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedJob {
    pub job: Job,
    pub bytes: u64,
    pub action: PlannedAction,
}

/// List what a run would do without decoding or writing anything.
pub fn plan(config: &RunConfig) -> Result<Vec<PlannedJob>, ProcessError> {
    discover_jobs(config)?
        .into_iter()
        .map(|job| {
            let bytes = std::fs::metadata(&job.source)?.len();
            let action = if bytes < job.fit.ceiling {
                PlannedAction::Copy
            } else {
                PlannedAction::Encode
            };
            Ok(PlannedJob { job, bytes, action })
        })
        .collect()
}
