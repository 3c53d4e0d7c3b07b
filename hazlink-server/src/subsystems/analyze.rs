//! Analysis orchestration subsystem
//!
//! Glue between the HTTP layer and the core: parse the three uploaded
//! datasets, run the correlation pipeline, export the XLSX workbook, and
//! shape the JSON body the dashboard consumes. Everything here is built
//! fresh per request; nothing is shared across requests except the
//! immutable config.

use std::path::Path;

use bytes::Bytes;
use hazlink_core::{analyze, HazlinkConfig, RawRecord};
use hazlink_ingest::IngestError;
use thiserror::Error;

use crate::subsystems::export;

/// One uploaded dataset file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// The client sent a file the ingest layer cannot parse (HTTP 400).
    #[error("{field}: {source}")]
    BadDataset {
        field: &'static str,
        source: IngestError,
    },

    /// Writing the report workbook failed (HTTP 500).
    #[error("Report export failed: {0}")]
    Export(#[from] anyhow::Error),
}

fn parse(field: &'static str, upload: &Upload) -> Result<Vec<RawRecord>, AnalyzeError> {
    hazlink_ingest::records_from_upload(&upload.filename, &upload.bytes)
        .map_err(|source| AnalyzeError::BadDataset { field, source })
}

/// Run one full analysis over the three uploads and return the response
/// body: hazards, per-hazard counts, relation counts, and the download URL
/// of the exported workbook.
pub fn run_analysis(
    so: &Upload,
    nm: &Upload,
    inc: &Upload,
    config: &HazlinkConfig,
    report_dir: &Path,
) -> Result<serde_json::Value, AnalyzeError> {
    let so_raw = parse("safety_observations", so)?;
    let nm_raw = parse("near_misses", nm)?;
    let inc_raw = parse("incidents", inc)?;

    let report = analyze(&so_raw, &nm_raw, &inc_raw, config);
    tracing::info!(
        so_inc = report.counts.so_inc,
        nm_inc = report.counts.nm_inc,
        so_nm_inc = report.counts.so_nm_inc,
        prevented = report.counts.prevented,
        "Analysis complete"
    );

    let file = export::write_report(&report, report_dir)?;

    Ok(serde_json::json!({
        "hazards": report.hazards,
        "hazard_counts": report.hazard_counts,
        "counts": report.counts,
        "report_url": format!("/download/{}", file),
    }))
}

// ============================================================================
// TESTS
// ============================================================================
