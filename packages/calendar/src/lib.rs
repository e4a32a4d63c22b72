#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Camera operation calendar.
//!
//! Tracks which days each camera site was actively recording so that
//! detection counts can be exposure-corrected. The distinction between
//! "zero operational nights" (no exposure, RAI undefined) and
//! "operational but zero detections" (RAI = 0) lives here: a site with
//! no active days in a window reports zero nights, and the rate
//! normalizer turns that into an undefined RAI downstream.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use hexcensus_models::TimeWindow;

/// Per-site, per-day operational status for the camera array.
///
/// Built once from the operational-status table and read-only
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct OperationCalendar {
    /// site -> day -> active flag.
    days: BTreeMap<String, BTreeMap<NaiveDate, bool>>,
}

impl OperationCalendar {
    /// Records the operational status of a site for one day. A repeated
    /// (site, day) entry overwrites the earlier one, active winning over
    /// inactive only by arrival order.
    pub fn set(&mut self, site: impl Into<String>, day: NaiveDate, active: bool) {
        let site = site.into();
        if let Some(previous) = self.days.entry(site.clone()).or_default().insert(day, active)
            && previous != active
        {
            log::warn!("conflicting operational status for {site} on {day}, keeping {active}");
        }
    }

    /// Whether the camera at `site` was confirmed active on `day`.
    ///
    /// Days without a status row count as inactive.
    #[must_use]
    pub fn is_active(&self, site: &str, day: NaiveDate) -> bool {
        self.days
            .get(site)
            .and_then(|by_day| by_day.get(&day))
            .copied()
            .unwrap_or(false)
    }

    /// Number of operational nights for `site` within the closed window.
    #[must_use]
    pub fn nights(&self, site: &str, window: &TimeWindow) -> u32 {
        self.days.get(site).map_or(0, |by_day| {
            u32::try_from(
                by_day
                    .range(window.start..=window.end)
                    .filter(|&(_, &active)| active)
                    .count(),
            )
            .unwrap_or(u32::MAX)
        })
    }

    /// Total operational nights across all sites within the window (the
    /// study-area exposure).
    #[must_use]
    pub fn total_nights(&self, window: &TimeWindow) -> u32 {
        self.days
            .keys()
            .map(|site| self.nights(site, window))
            .sum()
    }

    /// All calendared site ids, in id order. Sites appear here even when
    /// every status row is inactive, which is what lets the assembler
    /// distinguish "camera was deployed but dead" from "no camera".
    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    /// Whether the calendar has any rows for `site`.
    #[must_use]
    pub fn has_site(&self, site: &str) -> bool {
        self.days.contains_key(site)
    }

    /// Number of calendared sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the calendar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
