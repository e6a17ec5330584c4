//! JSON report export for downstream analysis.
//!
//! The CSV tables are the primary artifact; the JSON report bundles the
//! same samples with metadata and summary statistics for consumers that
//! prefer a single self-describing file.

use std::path::Path;

use serde::Serialize;

use crate::config::ExperimentConfig;
use crate::error::HarnessError;
use crate::results::stats::{BatchStats, compute_stats};
use crate::runner::RunObservation;

/// JSON-serializable experiment report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub batches: Vec<BatchReport>,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub platform: String,
    pub harness_version: String,
    pub variant: String,
    pub opt_level: u8,
    pub else_if: bool,
    pub mode: String,
    pub iterations: usize,
}

/// One input size's batch: raw samples plus summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub input_size: u64,
    pub samples_seconds: Vec<f64>,
    pub exit_statuses: Vec<i32>,
    pub stats: BatchStats,
}

/// Export a report for the batches of one experiment to `path`.
pub fn export_json(
    batches: &[(u64, Vec<RunObservation>)],
    config: &ExperimentConfig,
    path: &Path,
) -> Result<(), HarnessError> {
    let batch_reports = batches
        .iter()
        .map(|(input_size, observations)| BatchReport {
            input_size: *input_size,
            samples_seconds: observations.iter().map(|o| o.wall_seconds).collect(),
            exit_statuses: observations.iter().map(|o| o.exit_status).collect(),
            stats: compute_stats(observations),
        })
        .collect();

    let report = Report {
        metadata: ReportMetadata {
            timestamp: chrono::Utc::now().to_rfc3339(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            harness_version: env!("CARGO_PKG_VERSION").to_string(),
            variant: config.variant.to_string(),
            opt_level: config.opt_level,
            else_if: config.else_if,
            mode: config.mode.to_string(),
            iterations: config.iterations,
        },
        batches: batch_reports,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| HarnessError::io(path, std::io::Error::other(e)))?;
    std::fs::write(path, json).map_err(|e| HarnessError::io(path, e))?;

    Ok(())
}
