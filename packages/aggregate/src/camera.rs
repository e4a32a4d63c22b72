//! Camera-side aggregation.
//!
//! Raw trigger records are first collapsed into independent detection
//! events: repeated triggers of the same species at the same site count
//! as one event until at least the configured minimum interval has
//! elapsed since the last retained event. Event counts are then tallied
//! per (site, species) within each configured time window, with
//! operational nights and RAI attached from the calendar.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use hexcensus_calendar::OperationCalendar;
use hexcensus_models::{
    CameraAggregate, CameraDetection, CanonicalSpecies, QualityReport, SurveySide, TimeWindow,
};
use hexcensus_species::Resolution;

use crate::rai::compute_rai;

/// Default independence interval between retained events, in minutes.
pub const DEFAULT_MIN_INTERVAL_MINUTES: i64 = 10;

/// One independent detection event after collapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraEvent {
    /// Camera site identifier.
    pub site: String,
    /// Reconciled species name.
    pub species: CanonicalSpecies,
    /// Timestamp of the first trigger in the collapsed run.
    pub timestamp: DateTime<Utc>,
}

/// Aggregated camera counts and rates for every configured window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraTable {
    /// (window id, site, species) -> detections, nights, RAI.
    pub per_site: BTreeMap<(String, String, CanonicalSpecies), CameraAggregate>,
    /// (window id, species) -> study-area detections and exposure.
    pub totals: BTreeMap<(String, CanonicalSpecies), CameraAggregate>,
}

impl CameraTable {
    /// All species with at least one independent event in any window.
    #[must_use]
    pub fn species(&self) -> BTreeSet<&CanonicalSpecies> {
        self.totals.keys().map(|(_, species)| species).collect()
    }
}

/// Collapses raw trigger records into independent events.
///
/// Records are grouped by (site, species) and sorted by timestamp; a
/// record is retained when it is the first of its group or at least
/// `min_interval` after the previously retained event of the same group.
/// Excluded labels are dropped here so housekeeping frames never become
/// events; pass-through labels are recorded in the report.
#[must_use]
pub fn independent_events(
    records: &[CameraDetection],
    min_interval: Duration,
    report: &mut QualityReport,
) -> Vec<CameraEvent> {
    let mut resolved: Vec<CameraEvent> = Vec::with_capacity(records.len());

    for record in records {
        match hexcensus_species::resolve(&record.species) {
            Resolution::Canonical(species) => resolved.push(CameraEvent {
                site: record.site.clone(),
                species,
                timestamp: record.timestamp,
            }),
            Resolution::Passthrough(species) => {
                report.record_unmapped(SurveySide::Camera, &record.species);
                resolved.push(CameraEvent {
                    site: record.site.clone(),
                    species,
                    timestamp: record.timestamp,
                });
            }
            Resolution::Excluded => report.excluded += 1,
        }
    }

    resolved.sort_by(|a, b| {
        (&a.site, &a.species, a.timestamp).cmp(&(&b.site, &b.species, b.timestamp))
    });

    let mut events: Vec<CameraEvent> = Vec::with_capacity(resolved.len());
    let mut last_kept: Option<(&str, &CanonicalSpecies, DateTime<Utc>)> = None;

    for event in &resolved {
        let independent = match last_kept {
            Some((site, species, ts))
                if site == event.site && *species == event.species =>
            {
                event.timestamp - ts >= min_interval
            }
            _ => true,
        };
        if independent {
            last_kept = Some((&event.site, &event.species, event.timestamp));
            events.push(event.clone());
        }
    }

    log::info!(
        "Collapsed {} camera records into {} independent events",
        records.len(),
        events.len()
    );

    events
}

/// Tallies independent events per (site, species) within each window and
/// attaches exposure-corrected rates.
///
/// Every calendared site gets a row for every species seen anywhere on
/// the camera side, so "operational but zero detections" (RAI = 0)
/// appears explicitly instead of being absent from the table. Sites
/// that appear only in the events keep their detections too, with zero
/// nights of exposure (undefined RAI), and are recorded in the report.
#[must_use]
pub fn aggregate_camera(
    events: &[CameraEvent],
    calendar: &OperationCalendar,
    windows: &[TimeWindow],
    report: &mut QualityReport,
) -> CameraTable {
    let species_universe: BTreeSet<&CanonicalSpecies> =
        events.iter().map(|e| &e.species).collect();

    let mut sites: BTreeSet<&str> = calendar.sites().collect();
    for event in events {
        if sites.insert(event.site.as_str()) {
            report.record_uncalendared(&event.site);
        }
    }

    let mut table = CameraTable::default();

    for window in windows {
        let mut counts: BTreeMap<(&str, &CanonicalSpecies), u64> = BTreeMap::new();
        for event in events {
            if window.contains_timestamp(event.timestamp) {
                *counts
                    .entry((event.site.as_str(), &event.species))
                    .or_insert(0) += 1;
            }
        }

        for &site in &sites {
            let nights = calendar.nights(site, window);
            for &species in &species_universe {
                let detections = counts.get(&(site, species)).copied().unwrap_or(0);
                table.per_site.insert(
                    (window.id.clone(), site.to_string(), species.clone()),
                    CameraAggregate {
                        detections,
                        nights,
                        rai: compute_rai(detections, nights),
                    },
                );
            }
        }

        let total_nights = calendar.total_nights(window);
        for &species in &species_universe {
            let detections: u64 = counts
                .iter()
                .filter(|((_, sp), _)| *sp == species)
                .map(|(_, &n)| n)
                .sum();
            table.totals.insert(
                (window.id.clone(), species.clone()),
                CameraAggregate {
                    detections,
                    nights: total_nights,
                    rai: compute_rai(detections, total_nights),
                },
            );
        }
    }

    table
}
