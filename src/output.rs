//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Fitting 3 files under 2.0 MB (4 workers)
//! [1/3] IMG_0001.jpg: copied (812.4 KB)
//! [2/3] IMG_0002.jpg: encoded 9.5 MB → 1.9 MB
//!     Quality 55, scale 0.60 (2400x1800), 4 attempts
//!     EXIF: kept
//! [3/3] broken.jpg: skipped
//!     Reason: Processing failed: Failed to decode JPEG: ...
//!
//! Done: 1 encoded, 1 copied, 1 skipped, 0 failed (3 total)
//! ```
//!
//! Lines for different files arrive in completion order, so the counter is
//! the position in the run, not in the directory listing.
//!
//! ## Plan
//!
//! ```text
//! 001 IMG_0001.jpg (812.4 KB): copy
//! 002 IMG_0002.jpg (9.5 MB): encode
//!
//! 1 to encode, 1 to copy (ceiling 2.0 MB)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::FitMethod;
use crate::process::{
    BatchSummary, FileOutcome, PlannedAction, PlannedJob, ProcessEvent,
};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count using decimal units (1 KB = 1000 bytes).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = UNITS[0];
    for u in UNITS {
        value /= 1000.0;
        unit = u;
        if value < 1000.0 {
            break;
        }
    }
    format!("{:.1} {}", value, unit)
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted {
            total,
            workers,
            ceiling,
        } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!(
                "Fitting {} {} under {} ({} workers)",
                total,
                noun,
                format_bytes(*ceiling),
                workers
            )]
        }
        ProcessEvent::FileFinished {
            processed,
            total,
            report,
        } => {
            let prefix = format!("[{}/{}] {}", processed, total, report.file_name);
            match &report.outcome {
                FileOutcome::Copied { bytes } => {
                    vec![format!("{}: copied ({})", prefix, format_bytes(*bytes))]
                }
                FileOutcome::Encoded {
                    bytes,
                    original_bytes,
                    quality,
                    scale,
                    width,
                    height,
                    attempts,
                    method,
                    exif,
                } => {
                    let mut lines = vec![format!(
                        "{}: encoded {} → {}",
                        prefix,
                        format_bytes(*original_bytes),
                        format_bytes(*bytes)
                    )];
                    let attempts_str = if *attempts == 1 {
                        "1 attempt".to_string()
                    } else {
                        format!("{} attempts", attempts)
                    };
                    lines.push(format!(
                        "    Quality {}, scale {:.2} ({}x{}), {}",
                        quality, scale, width, height, attempts_str
                    ));
                    if *method == FitMethod::KeptOriginal {
                        lines.push("    Warning: ceiling not reached, kept original".to_string());
                    }
                    lines.push(format!("    EXIF: {}", if *exif { "kept" } else { "none" }));
                    lines
                }
                FileOutcome::Skipped { reason } => vec![
                    format!("{}: skipped", prefix),
                    format!("    Reason: {}", reason),
                ],
                FileOutcome::Failed { reason } => vec![
                    format!("{}: failed", prefix),
                    format!("    Reason: {}", reason),
                ],
            }
        }
    }
}

pub fn format_summary(summary: &BatchSummary) -> String {
    format!("Done: {}", summary)
}

/// Format the dry-run listing.
pub fn format_plan(planned: &[PlannedJob], ceiling: u64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut to_encode = 0;
    for (i, p) in planned.iter().enumerate() {
        let action = match p.action {
            PlannedAction::Copy => "copy",
            PlannedAction::Encode => {
                to_encode += 1;
                "encode"
            }
        };
        lines.push(format!(
            "{} {} ({}): {}",
            format_index(i + 1),
            p.job.file_name(),
            format_bytes(p.bytes),
            action
        ));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{} to encode, {} to copy (ceiling {})",
        to_encode,
        planned.len() - to_encode,
        format_bytes(ceiling)
    ));
    lines
}

pub fn print_plan(planned: &[PlannedJob], ceiling: u64) {
    for line in format_plan(planned, ceiling) {
        println!("{}", line);
    }
}
