#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Input loading and output writing for the census pipeline.
//!
//! Loaders validate each table's header before deserializing rows, so a
//! missing column aborts the stage with a diagnostic naming the table
//! and field instead of failing row-by-row. Writers serialize the three
//! output artifacts (per-cell aerial summary, RAI table, comparison
//! table) with undefined rates rendered as `NA`, never as zero.

pub mod loaders;
pub mod writers;

use hexcensus_models::QualityReport;

/// Errors from loading or writing the pipeline's tables.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A required column is absent from an input table.
    #[error("required column {column:?} missing from {table} table")]
    MissingColumn {
        /// Which input table.
        table: &'static str,
        /// The absent column.
        column: &'static str,
    },

    /// A cell could not be interpreted.
    #[error("{table} row {row}: {message}")]
    InvalidValue {
        /// Which input table.
        table: &'static str,
        /// One-based data row number (header excluded).
        row: usize,
        /// What was wrong.
        message: String,
    },
}

/// Logs the collected data-quality issues. Best-effort reporting: the
/// output still exists, the analyst gets the list of labels to triage.
pub fn log_quality_report(report: &QualityReport) {
    if report.is_empty() {
        log::info!("No data-quality issues collected");
        return;
    }

    for ((side, label), count) in &report.unmapped {
        log::warn!("unmapped {side} species label {label:?} ({count} rows), kept as-is");
    }
    for site in &report.uncalendared_sites {
        log::warn!("camera site {site} has detections but no operation-calendar rows; RAI undefined");
    }
    if report.outside_grid > 0 {
        log::warn!(
            "{} aerial observations outside the study grid (kept in study-area totals)",
            report.outside_grid
        );
    }
    if report.excluded > 0 {
        log::info!("{} records dropped via the exclusion list", report.excluded);
    }
}
