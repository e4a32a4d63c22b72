#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Comparison assembly: the pipeline's primary output artifact.
//!
//! Outer-joins the aerial per-cell table and the camera RAI table on
//! (site, species, window), filling absence with zero counts, and
//! derives the ratio and concordance label for each row with pure
//! functions applied exactly once. No table column is ever mutated
//! after a row is built, so there is no order-dependent partial state.

mod summaries;

pub use summaries::{concordance_by_species, mass_ratio_correlation, pearson};

use std::collections::BTreeSet;

use hexcensus_aggregate::{AerialTable, CameraTable, compute_rai, compute_ratio};
use hexcensus_calendar::OperationCalendar;
use hexcensus_models::{CanonicalSpecies, ComparisonRow, Concordance, TimeWindow};

/// Builds the joined comparison table across every configured window.
///
/// The row universe is the cross product of every site that appears on
/// either side (aerial cells, calendared camera sites, and sites present
/// only in the camera table), every species seen by either method, and
/// every window. Missing aerial rows fill as zero counts; missing camera
/// rows fill as zero detections with RAI derived from the site's
/// exposure (0 when the camera ran, undefined when it did not).
#[must_use]
pub fn assemble(
    aerial: &AerialTable,
    camera: &CameraTable,
    calendar: &OperationCalendar,
    windows: &[TimeWindow],
) -> Vec<ComparisonRow> {
    let mut sites: BTreeSet<&str> = aerial.cells();
    sites.extend(calendar.sites());
    sites.extend(camera.per_site.keys().map(|(_, site, _)| site.as_str()));

    let mut species: BTreeSet<&CanonicalSpecies> = aerial.species();
    species.extend(camera.species());

    let mut rows =
        Vec::with_capacity(windows.len() * sites.len() * species.len());

    for window in windows {
        for &site in &sites {
            for &sp in &species {
                rows.push(build_row(aerial, camera, calendar, window, site, sp));
            }
        }
    }

    log::info!(
        "Assembled {} comparison rows ({} sites x {} species x {} windows)",
        rows.len(),
        sites.len(),
        species.len(),
        windows.len()
    );

    rows
}

/// Derives one fully-populated comparison row. Pure: all conditional
/// fields (RAI, ratio, concordance) are computed here and never patched
/// afterwards.
fn build_row(
    aerial: &AerialTable,
    camera: &CameraTable,
    calendar: &OperationCalendar,
    window: &TimeWindow,
    site: &str,
    species: &CanonicalSpecies,
) -> ComparisonRow {
    let aerial_agg = aerial
        .per_cell
        .get(&(site.to_string(), species.clone()))
        .copied()
        .unwrap_or_default();

    let (detections, nights, rai) = camera
        .per_site
        .get(&(window.id.clone(), site.to_string(), species.clone()))
        .map_or_else(
            || {
                // No camera row: zero detections against whatever
                // exposure the calendar records for this site.
                let nights = calendar.nights(site, window);
                (0, nights, compute_rai(0, nights))
            },
            |agg| (agg.detections, agg.nights, agg.rai),
        );

    ComparisonRow {
        site: site.to_string(),
        species: species.clone(),
        window: window.id.clone(),
        aerial_individuals: aerial_agg.individuals,
        aerial_groups: aerial_agg.groups,
        detections,
        nights,
        rai,
        ratio: compute_ratio(aerial_agg.individuals, rai),
        concordance: Concordance::classify(aerial_agg.individuals > 0, detections > 0),
    }
}
