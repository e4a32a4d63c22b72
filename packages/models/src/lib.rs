#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Shared data model for the hexcensus pipeline.
//!
//! Defines the canonical species vocabulary, survey-side tags, analysis
//! time windows, per-cell/per-site aggregates, and the tagged rate values
//! (RAI and aerial-to-camera ratio) that every downstream stage consumes.
//! All types here are immutable value types; the pipeline never mutates
//! loaded reference data in place.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which census method a record came from.
///
/// Species-label reconciliation and data-quality reporting both need to
/// know the originating side, since the two datasets were collected and
/// labeled independently.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SurveySide {
    /// Fixed-wing aerial total-count survey.
    Aerial,
    /// Camera-trap detection records.
    Camera,
}

/// A species name in the unified vocabulary both datasets are mapped onto.
///
/// The vocabulary is open: labels without an explicit synonym entry pass
/// through (case-normalized) so analysts can extend the mapping table
/// later, but they are reported via [`QualityReport`] rather than
/// silently accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSpecies(String);

impl CanonicalSpecies {
    /// Wraps an already-canonical name. Callers outside the reconciler
    /// should go through `hexcensus_species` instead of constructing
    /// these directly.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The canonical name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalSpecies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A closed date interval over which detection rates are computed.
///
/// The standard configuration is the exact aerial-survey period plus
/// symmetric extensions around it (±2 and ±4 weeks). Windows are plain
/// data so adding a fourth is a configuration change, not a code change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Identifier used as the join key in output tables (e.g. `"survey"`).
    pub id: String,
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Creates a window over the closed interval `[start, end]`.
    #[must_use]
    pub fn new(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    /// Creates a window extending `weeks` weeks on both sides of
    /// `[start, end]`.
    #[must_use]
    pub fn extended(id: impl Into<String>, start: NaiveDate, end: NaiveDate, weeks: i64) -> Self {
        Self {
            id: id.into(),
            start: start - Duration::weeks(weeks),
            end: end + Duration::weeks(weeks),
        }
    }

    /// Whether `day` falls within the window (closed on both ends).
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Whether the timestamp's calendar date falls within the window.
    #[must_use]
    pub fn contains_timestamp(&self, ts: DateTime<Utc>) -> bool {
        self.contains(ts.date_naive())
    }
}

/// The standard three analysis windows around an aerial-survey period:
/// the exact period, ±2 weeks, and ±4 weeks.
#[must_use]
pub fn default_windows(survey_start: NaiveDate, survey_end: NaiveDate) -> Vec<TimeWindow> {
    vec![
        TimeWindow::new("survey", survey_start, survey_end),
        TimeWindow::extended("survey_pm2wk", survey_start, survey_end, 2),
        TimeWindow::extended("survey_pm4wk", survey_start, survey_end, 4),
    ]
}

/// A single aerial sighting: one point observation of one or more
/// individuals. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerialObservation {
    /// Species label exactly as recorded by the observer.
    pub species: String,
    /// Number of individuals counted at this point.
    pub individuals: u64,
    /// Whether the observation was recorded as a group/herd sighting.
    pub group: bool,
    /// Longitude (or easting, depending on the declared CRS).
    pub longitude: f64,
    /// Latitude (or northing, depending on the declared CRS).
    pub latitude: f64,
    /// Source survey identifier (year/period, e.g. `"2022-dry"`).
    pub survey: String,
}

/// A single raw camera-trap record before independence filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDetection {
    /// Camera site identifier; matches the grid's `StudySite` ids.
    pub site: String,
    /// Species label exactly as tagged by the image classifier/annotator.
    pub species: String,
    /// Trigger timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Relative Activity Index: camera detections per operational night.
///
/// `Undefined` means the camera had zero operational nights in the
/// window, which is "no data" rather than "no activity". It must never
/// be coerced to zero or it corrupts downstream means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rai {
    /// Detections / operational nights. Zero is a valid value (camera
    /// ran but saw nothing).
    Defined(f64),
    /// No operational nights in the window.
    Undefined,
}

impl Rai {
    /// The rate, if defined.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// Whether the rate is defined.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl std::fmt::Display for Rai {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v}"),
            Self::Undefined => f.write_str("NA"),
        }
    }
}

/// Aerial-individuals-to-RAI ratio for one comparison row.
///
/// Undefined when the aerial count is zero (no numerator signal), when
/// RAI is undefined (no camera exposure), or when RAI is zero (division
/// would fabricate an infinite ratio from "camera saw nothing").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    /// Aerial individual count divided by RAI.
    Defined(f64),
    /// No meaningful ratio exists for this row.
    Undefined,
}

impl Ratio {
    /// The ratio, if defined.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// Whether the ratio is defined.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v}"),
            Self::Undefined => f.write_str("NA"),
        }
    }
}

/// Which survey method(s) detected a species in a cell/window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Concordance {
    /// Both methods detected the species.
    BothDetected,
    /// Neither method detected the species.
    NeitherDetected,
    /// Only the aerial survey detected the species.
    AerialOnly,
    /// Only the camera traps detected the species.
    CameraOnly,
}

impl Concordance {
    /// Classifies a row by whether each side detected anything.
    ///
    /// Deterministic in the two presence flags; detection strength is
    /// irrelevant here.
    #[must_use]
    pub const fn classify(aerial_present: bool, camera_present: bool) -> Self {
        match (aerial_present, camera_present) {
            (true, true) => Self::BothDetected,
            (false, false) => Self::NeitherDetected,
            (true, false) => Self::AerialOnly,
            (false, true) => Self::CameraOnly,
        }
    }
}

/// Summed aerial counts for one (cell, species) key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AerialAggregate {
    /// Total individuals across all observations.
    pub individuals: u64,
    /// Number of observations flagged as group sightings.
    pub groups: u64,
}

impl AerialAggregate {
    /// Folds one observation's counts into the aggregate.
    pub fn add(&mut self, individuals: u64, group: bool) {
        self.individuals += individuals;
        self.groups += u64::from(group);
    }
}

/// Exposure-corrected camera counts for one (site, species, window) key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraAggregate {
    /// Independent detection events in the window.
    pub detections: u64,
    /// Operational camera nights in the window.
    pub nights: u32,
    /// Detections per operational night; undefined when `nights == 0`.
    pub rai: Rai,
}

/// One row of the primary output artifact: the outer-joined comparison
/// of both methods for a (site, species, window) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// Grid cell / camera site identifier.
    pub site: String,
    /// Canonical species name.
    pub species: CanonicalSpecies,
    /// Time-window identifier.
    pub window: String,
    /// Aerial individuals (0 when the aerial side had no row).
    pub aerial_individuals: u64,
    /// Aerial group sightings (0 when the aerial side had no row).
    pub aerial_groups: u64,
    /// Independent camera detection events (0 when the camera side had
    /// no row).
    pub detections: u64,
    /// Operational camera nights at the site in the window.
    pub nights: u32,
    /// Relative activity index for the camera side.
    pub rai: Rai,
    /// Aerial-to-camera detection ratio.
    pub ratio: Ratio,
    /// Which method(s) detected the species.
    pub concordance: Concordance,
}

/// Per-species trait covariates from the reference table. Used only for
/// downstream correlation summaries, never for join logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTraits {
    /// Adult body mass in kilograms.
    pub body_mass_kg: f64,
}

/// Data-quality issues collected during a run.
///
/// Structural problems (missing columns, CRS mismatch) abort the run;
/// everything here is best-effort reportage that accompanies the output
/// so analysts can extend the mapping table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityReport {
    /// Labels that resolved by pass-through rather than an explicit
    /// synonym entry, with occurrence counts, keyed by source side.
    pub unmapped: BTreeMap<(SurveySide, String), u64>,
    /// Observations that fell outside every grid cell.
    pub outside_grid: u64,
    /// Records dropped because their label is on the exclusion list.
    pub excluded: u64,
    /// Camera sites with detection events but no operation-calendar
    /// rows. Their detections are kept with zero nights of exposure.
    pub uncalendared_sites: BTreeSet<String>,
}

impl QualityReport {
    /// Records a label that had no explicit mapping.
    pub fn record_unmapped(&mut self, side: SurveySide, label: &str) {
        *self
            .unmapped
            .entry((side, label.to_string()))
            .or_insert(0) += 1;
    }

    /// Records a camera site that appears in the detections but not in
    /// the operation calendar.
    pub fn record_uncalendared(&mut self, site: &str) {
        self.uncalendared_sites.insert(site.to_string());
    }

    /// Whether anything noteworthy was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unmapped.is_empty()
            && self.outside_grid == 0
            && self.excluded == 0
            && self.uncalendared_sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_contains_is_closed_on_both_ends() {
        let w = TimeWindow::new("survey", date(2022, 10, 1), date(2022, 10, 14));
        assert!(w.contains(date(2022, 10, 1)));
        assert!(w.contains(date(2022, 10, 14)));
        assert!(!w.contains(date(2022, 9, 30)));
        assert!(!w.contains(date(2022, 10, 15)));
    }

    #[test]
    fn extended_window_widens_both_sides() {
        let w = TimeWindow::extended("survey_pm2wk", date(2022, 10, 1), date(2022, 10, 14), 2);
        assert_eq!(w.start, date(2022, 9, 17));
        assert_eq!(w.end, date(2022, 10, 28));
    }

    #[test]
    fn default_windows_are_three_and_nested() {
        let windows = default_windows(date(2022, 10, 1), date(2022, 10, 14));
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].id, "survey");
        assert!(windows[1].start < windows[0].start);
        assert!(windows[2].start < windows[1].start);
        assert!(windows[2].end > windows[1].end);
    }

    #[test]
    fn concordance_truth_table() {
        assert_eq!(
            Concordance::classify(false, true),
            Concordance::CameraOnly
        );
        assert_eq!(Concordance::classify(true, false), Concordance::AerialOnly);
        assert_eq!(
            Concordance::classify(false, false),
            Concordance::NeitherDetected
        );
        assert_eq!(Concordance::classify(true, true), Concordance::BothDetected);
    }

    #[test]
    fn undefined_rates_render_as_na() {
        assert_eq!(Rai::Undefined.to_string(), "NA");
        assert_eq!(Ratio::Undefined.to_string(), "NA");
        assert_eq!(Rai::Defined(0.5).to_string(), "0.5");
        assert!(Rai::Undefined.value().is_none());
    }

    #[test]
    fn aerial_aggregate_folds_counts() {
        let mut agg = AerialAggregate::default();
        agg.add(3, true);
        agg.add(4, false);
        assert_eq!(agg.individuals, 7);
        assert_eq!(agg.groups, 1);
    }

    #[test]
    fn quality_report_counts_repeat_labels() {
        let mut report = QualityReport::default();
        report.record_unmapped(SurveySide::Camera, "Civet");
        report.record_unmapped(SurveySide::Camera, "Civet");
        assert_eq!(
            report.unmapped[&(SurveySide::Camera, "Civet".to_string())],
            2
        );
        assert!(!report.is_empty());
    }
}
