#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the census reconciliation pipeline.
//!
//! `hexcensus run` executes the full batch: spatial join of aerial
//! observations onto the hex grid, camera independence filtering and
//! RAI normalization per time window, and the outer-joined comparison
//! table. `hexcensus check` runs the same pipeline without writing
//! anything, for validating inputs and reviewing the data-quality
//! report.

mod pipeline;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hexcensus_spatial::Crs;

use crate::pipeline::RunConfig;

#[derive(Parser)]
#[command(name = "hexcensus", about = "Aerial vs camera-trap census reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Aerial observation CSV (species, count, group, longitude, latitude, survey)
    #[arg(long)]
    aerial: PathBuf,
    /// Camera detection CSV (site, species, timestamp)
    #[arg(long)]
    camera: PathBuf,
    /// Camera operational-status CSV (site, date, active)
    #[arg(long)]
    calendar: PathBuf,
    /// Grid-cell GeoJSON with a `StudySite` property per feature
    #[arg(long)]
    grid: PathBuf,
    /// Species-trait CSV (species, body_mass_kg) for the mass-ratio correlation
    #[arg(long)]
    traits: Option<PathBuf>,
    /// First day of the aerial survey (YYYY-MM-DD)
    #[arg(long)]
    survey_start: NaiveDate,
    /// Last day of the aerial survey (YYYY-MM-DD)
    #[arg(long)]
    survey_end: NaiveDate,
    /// Declared CRS of the aerial coordinates
    #[arg(long, default_value = "EPSG:4326")]
    aerial_crs: Crs,
    /// Declared CRS of the grid polygons
    #[arg(long, default_value = "EPSG:4326")]
    grid_crs: Crs,
    /// Minimum minutes between independent camera events at one site
    #[arg(long, default_value_t = hexcensus_aggregate::DEFAULT_MIN_INTERVAL_MINUTES)]
    min_interval: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the output tables
    Run {
        #[command(flatten)]
        inputs: InputArgs,
        /// Output directory for the three artifact tables
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Validate inputs and report data quality without writing outputs
    Check {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

impl InputArgs {
    fn into_config(self, out: Option<PathBuf>) -> RunConfig {
        RunConfig {
            aerial: self.aerial,
            camera: self.camera,
            calendar: self.calendar,
            grid: self.grid,
            traits: self.traits,
            out,
            survey_start: self.survey_start,
            survey_end: self.survey_end,
            aerial_crs: self.aerial_crs,
            grid_crs: self.grid_crs,
            min_interval_minutes: self.min_interval,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { inputs, out } => pipeline::run(&inputs.into_config(Some(out)))?,
        Commands::Check { inputs } => pipeline::run(&inputs.into_config(None))?,
    }

    Ok(())
}
