//! Aerial-side aggregation.
//!
//! Consumes observations already tagged with their enclosing grid cell
//! (or none) by the spatial join, reconciles species labels, and sums
//! individual and group counts per (cell, species) plus per-species
//! study-area totals. Outside-grid observations are excluded from
//! per-cell aggregates but still count toward the totals, so the raw
//! species total is always per-cell sum + outside-grid count.

use std::collections::{BTreeMap, BTreeSet};

use hexcensus_models::{
    AerialAggregate, AerialObservation, CanonicalSpecies, QualityReport, SurveySide,
};
use hexcensus_species::Resolution;

/// Aggregated aerial counts for the whole survey.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AerialTable {
    /// (`StudySite`, species) -> summed counts.
    pub per_cell: BTreeMap<(String, CanonicalSpecies), AerialAggregate>,
    /// Study-area totals per species, including outside-grid rows.
    pub totals: BTreeMap<CanonicalSpecies, AerialAggregate>,
    /// Counts from observations outside every grid cell.
    pub outside: BTreeMap<CanonicalSpecies, AerialAggregate>,
}

impl AerialTable {
    /// All species present anywhere in the aerial data.
    #[must_use]
    pub fn species(&self) -> BTreeSet<&CanonicalSpecies> {
        self.totals.keys().collect()
    }

    /// All cells with at least one aerial row.
    #[must_use]
    pub fn cells(&self) -> BTreeSet<&str> {
        self.per_cell.keys().map(|(site, _)| site.as_str()).collect()
    }
}

/// Aggregates joined observations into the aerial count tables.
///
/// `assignments` must be the spatial-join output for `observations`,
/// index-aligned. Excluded labels (non-focal taxa) are dropped and
/// counted in the report; pass-through labels aggregate under their
/// normalized name and are recorded for the analyst.
///
/// # Panics
///
/// Panics when `observations` and `assignments` differ in length, since
/// a silent truncation would drop observations from the totals.
#[must_use]
pub fn aggregate_aerial(
    observations: &[AerialObservation],
    assignments: &[Option<&str>],
    report: &mut QualityReport,
) -> AerialTable {
    assert_eq!(
        observations.len(),
        assignments.len(),
        "spatial-join assignments must be index-aligned with the observations"
    );

    let mut table = AerialTable::default();

    for (obs, assignment) in observations.iter().zip(assignments) {
        let species = match hexcensus_species::resolve(&obs.species) {
            Resolution::Canonical(species) => species,
            Resolution::Passthrough(species) => {
                report.record_unmapped(SurveySide::Aerial, &obs.species);
                species
            }
            Resolution::Excluded => {
                report.excluded += 1;
                continue;
            }
        };

        table
            .totals
            .entry(species.clone())
            .or_default()
            .add(obs.individuals, obs.group);

        match assignment {
            Some(site) => {
                table
                    .per_cell
                    .entry(((*site).to_string(), species))
                    .or_default()
                    .add(obs.individuals, obs.group);
            }
            None => {
                report.outside_grid += 1;
                table
                    .outside
                    .entry(species)
                    .or_default()
                    .add(obs.individuals, obs.group);
            }
        }
    }

    log::info!(
        "Aggregated {} aerial observations into {} (cell, species) rows, {} species",
        observations.len(),
        table.per_cell.len(),
        table.totals.len()
    );

    table
}
