//! CSV writers for the three output artifacts.
//!
//! Undefined rates serialize as `NA` so downstream tooling (R, pandas)
//! reads them as missing instead of zero. Study-area totals are emitted
//! with the reserved site id `total` alongside the per-cell rows.

use std::io::Write;

use hexcensus_aggregate::{AerialTable, CameraTable};
use hexcensus_models::ComparisonRow;

use crate::IngestError;

/// Reserved site id for study-area total rows.
pub const TOTAL_SITE: &str = "total";

/// Writes the per-cell aerial summary: site, species, individual total,
/// group total, with `total` rows appended for the study area.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on serialization failure.
pub fn write_aerial_summary(
    writer: impl Write,
    table: &AerialTable,
) -> Result<(), IngestError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["site", "species", "individuals", "groups"])?;

    for ((site, species), agg) in &table.per_cell {
        let individuals = agg.individuals.to_string();
        let groups = agg.groups.to_string();
        csv_writer.write_record([
            site.as_str(),
            species.as_str(),
            individuals.as_str(),
            groups.as_str(),
        ])?;
    }
    for (species, agg) in &table.totals {
        let individuals = agg.individuals.to_string();
        let groups = agg.groups.to_string();
        csv_writer.write_record([
            TOTAL_SITE,
            species.as_str(),
            individuals.as_str(),
            groups.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the per-(site, species, window) RAI table, with study-area
/// `total` rows per window.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on serialization failure.
pub fn write_rai_table(writer: impl Write, table: &CameraTable) -> Result<(), IngestError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["window", "site", "species", "nights", "detections", "rai"])?;

    for ((window, site, species), agg) in &table.per_site {
        let nights = agg.nights.to_string();
        let detections = agg.detections.to_string();
        let rai = agg.rai.to_string();
        csv_writer.write_record([
            window.as_str(),
            site.as_str(),
            species.as_str(),
            nights.as_str(),
            detections.as_str(),
            rai.as_str(),
        ])?;
    }
    for ((window, species), agg) in &table.totals {
        let nights = agg.nights.to_string();
        let detections = agg.detections.to_string();
        let rai = agg.rai.to_string();
        csv_writer.write_record([
            window.as_str(),
            TOTAL_SITE,
            species.as_str(),
            nights.as_str(),
            detections.as_str(),
            rai.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the combined comparison table, one row per
/// (site, species, window).
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on serialization failure.
pub fn write_comparison(
    writer: impl Write,
    rows: &[ComparisonRow],
) -> Result<(), IngestError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "site",
        "species",
        "window",
        "aerial_individuals",
        "aerial_groups",
        "detections",
        "nights",
        "rai",
        "ratio",
        "concordance",
    ])?;

    for row in rows {
        let aerial_individuals = row.aerial_individuals.to_string();
        let aerial_groups = row.aerial_groups.to_string();
        let detections = row.detections.to_string();
        let nights = row.nights.to_string();
        let rai = row.rai.to_string();
        let ratio = row.ratio.to_string();
        csv_writer.write_record([
            row.site.as_str(),
            row.species.as_str(),
            row.window.as_str(),
            aerial_individuals.as_str(),
            aerial_groups.as_str(),
            detections.as_str(),
            nights.as_str(),
            rai.as_str(),
            ratio.as_str(),
            row.concordance.as_ref(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use hexcensus_models::{
        AerialAggregate, CanonicalSpecies, Concordance, Rai, Ratio,
    };

    use super::*;

    #[test]
    fn aerial_summary_includes_total_rows() {
        let mut table = AerialTable::default();
        table.per_cell.insert(
            ("A1".to_string(), CanonicalSpecies::new("Baboon")),
            AerialAggregate {
                individuals: 7,
                groups: 2,
            },
        );
        table.totals.insert(
            CanonicalSpecies::new("Baboon"),
            AerialAggregate {
                individuals: 7,
                groups: 2,
            },
        );

        let mut out = Vec::new();
        write_aerial_summary(&mut out, &table).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("A1,Baboon,7,2"));
        assert!(text.contains("total,Baboon,7,2"));
    }

    #[test]
    fn comparison_rows_serialize_na_for_undefined_rates() {
        let rows = vec![ComparisonRow {
            site: "A1".to_string(),
            species: CanonicalSpecies::new("Baboon"),
            window: "survey".to_string(),
            aerial_individuals: 7,
            aerial_groups: 2,
            detections: 0,
            nights: 14,
            rai: Rai::Defined(0.0),
            ratio: Ratio::Undefined,
            concordance: Concordance::AerialOnly,
        }];

        let mut out = Vec::new();
        write_comparison(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("A1,Baboon,survey,7,2,0,14,0,NA,aerial_only"));
    }
}
