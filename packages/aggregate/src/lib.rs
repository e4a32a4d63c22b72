#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Detection aggregation and rate normalization.
//!
//! Turns joined aerial observations into per-cell count tables, collapses
//! raw camera records into independent detection events, counts those
//! events per (site, species, window), and normalizes them into the
//! relative activity index (RAI). Species labels on both sides go through
//! the `hexcensus_species` reconciler so the two tables share one
//! vocabulary.

pub mod aerial;
pub mod camera;
pub mod rai;

pub use aerial::{AerialTable, aggregate_aerial};
pub use camera::{
    CameraEvent, CameraTable, DEFAULT_MIN_INTERVAL_MINUTES, aggregate_camera, independent_events,
};
pub use rai::{compute_rai, compute_ratio};
