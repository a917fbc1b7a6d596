//! Result Exporter
//!
//! Window results and duration summaries as CSV (spreadsheet) or JSON.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineResult;
use crate::logic::evaluate::{DurationSummary, WindowResult};

// ============================================================================
// EXPORT FORMATS
// ============================================================================

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// Pretty JSON array
    Json,
}

impl ExportFormat {
    /// Pick by file extension, CSV unless `.json`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    label: &'a str,
    duration_s: f64,
    ratio_pct: f64,
}

// ============================================================================
// EXPORT FUNCTIONS
// ============================================================================

/// Write `start_time_s,end_time_s,duration_s,label` rows
pub fn write_windows<W: Write>(writer: W, results: &[WindowResult]) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `label,duration_s,ratio_pct` rows
pub fn write_summary<W: Write>(writer: W, summary: &DurationSummary) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in summary.entries() {
        wtr.serialize(SummaryRow {
            label: &entry.label,
            duration_s: entry.duration_s,
            ratio_pct: entry.share_pct,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export window results to file; returns the row count
pub fn export_windows(results: &[WindowResult], destination: &Path) -> PipelineResult<usize> {
    let file = std::fs::File::create(destination)?;
    match ExportFormat::from_path(destination) {
        ExportFormat::Csv => write_windows(file, results)?,
        ExportFormat::Json => serde_json::to_writer_pretty(file, results)?,
    }
    log::info!("Exported {} window results to {}", results.len(), destination.display());
    Ok(results.len())
}

/// Export a duration summary to file; returns the row count
pub fn export_summary(summary: &DurationSummary, destination: &Path) -> PipelineResult<usize> {
    let file = std::fs::File::create(destination)?;
    match ExportFormat::from_path(destination) {
        ExportFormat::Csv => write_summary(file, summary)?,
        ExportFormat::Json => serde_json::to_writer_pretty(file, summary)?,
    }
    log::info!("Exported duration summary to {}", destination.display());
    Ok(summary.entries().len())
}
