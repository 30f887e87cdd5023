//! JSON export of a normalized report.
//!
//! The export is the canonical report pretty-printed with two-space
//! indentation. Loading it back through normalization yields the same report.

use crate::error::ReportError;
use crate::models::NormalizedReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialize a report to canonical JSON text.
pub fn serialize(report: &NormalizedReport) -> Result<String, ReportError> {
    serde_json::to_string_pretty(report).map_err(ReportError::Serialize)
}

/// Serialize a report to the bytes of a downloadable document.
pub fn export_report(report: &NormalizedReport) -> Result<Vec<u8>, ReportError> {
    serialize(report).map(String::into_bytes)
}

/// Timestamped export file name, e.g. `fraud_detection_2024-05-01T12-30-00.json`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("fraud_detection_{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Write an export into `dir` and return its path.
pub fn write_export(report: &NormalizedReport, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let bytes = export_report(report)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let path = dir.join(export_filename(now));
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    info!("Exported report to {}", path.display());
    Ok(path)
}
