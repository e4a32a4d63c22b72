//! CSV and `GeoJSON` loaders for the five input tables.
//!
//! All loaders take `impl io::Read` so tests can feed literal strings.
//! Coordinate reference systems are declared by the caller per input;
//! the loaders never guess a CRS from file contents.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hexcensus_calendar::OperationCalendar;
use hexcensus_models::{AerialObservation, CameraDetection, CanonicalSpecies, SpeciesTraits};
use hexcensus_spatial::GridCell;
use serde::Deserialize;

use crate::IngestError;

/// Verifies every required column is present before any row is parsed.
fn ensure_columns(
    headers: &csv::StringRecord,
    table: &'static str,
    required: &[&'static str],
) -> Result<(), IngestError> {
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(IngestError::MissingColumn { table, column });
        }
    }
    Ok(())
}

/// Parses a 0/1/true/false/yes/no flag cell.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

/// Parses a timestamp in ISO 8601 with either a space or `T` separator
/// and optional fractional seconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw.trim(), format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct AerialRow {
    species: String,
    count: u64,
    group: Option<String>,
    longitude: f64,
    latitude: f64,
    survey: String,
}

/// Loads the aerial observation table.
///
/// Required columns: `species`, `count`, `longitude`, `latitude`,
/// `survey`. The `group` flag column is optional and defaults to false.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] on a schema mismatch and
/// [`IngestError::InvalidValue`] for unparseable cells.
pub fn load_aerial(reader: impl Read) -> Result<Vec<AerialObservation>, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    ensure_columns(
        csv_reader.headers()?,
        "aerial",
        &["species", "count", "longitude", "latitude", "survey"],
    )?;

    let mut observations = Vec::new();
    for (idx, result) in csv_reader.deserialize::<AerialRow>().enumerate() {
        let row = result?;
        let group = match row.group.as_deref() {
            None => false,
            Some(raw) => parse_flag(raw).ok_or_else(|| IngestError::InvalidValue {
                table: "aerial",
                row: idx + 1,
                message: format!("unrecognized group flag {raw:?}"),
            })?,
        };
        observations.push(AerialObservation {
            species: row.species,
            individuals: row.count,
            group,
            longitude: row.longitude,
            latitude: row.latitude,
            survey: row.survey,
        });
    }

    log::info!("Loaded {} aerial observations", observations.len());
    Ok(observations)
}

#[derive(Debug, Deserialize)]
struct CameraRow {
    site: String,
    species: String,
    timestamp: String,
}

/// Loads the camera detection table.
///
/// Required columns: `site`, `species`, `timestamp`.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] on a schema mismatch and
/// [`IngestError::InvalidValue`] for unparseable timestamps.
pub fn load_camera(reader: impl Read) -> Result<Vec<CameraDetection>, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    ensure_columns(
        csv_reader.headers()?,
        "camera",
        &["site", "species", "timestamp"],
    )?;

    let mut records = Vec::new();
    for (idx, result) in csv_reader.deserialize::<CameraRow>().enumerate() {
        let row = result?;
        let timestamp =
            parse_timestamp(&row.timestamp).ok_or_else(|| IngestError::InvalidValue {
                table: "camera",
                row: idx + 1,
                message: format!("unparseable timestamp {:?}", row.timestamp),
            })?;
        records.push(CameraDetection {
            site: row.site,
            species: row.species,
            timestamp,
        });
    }

    log::info!("Loaded {} camera records", records.len());
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CalendarRow {
    site: String,
    date: String,
    active: String,
}

/// Loads the camera operational-status table into a calendar.
///
/// Required columns: `site`, `date`, `active` (0/1 flag).
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] on a schema mismatch and
/// [`IngestError::InvalidValue`] for unparseable dates or flags.
pub fn load_calendar(reader: impl Read) -> Result<OperationCalendar, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    ensure_columns(csv_reader.headers()?, "calendar", &["site", "date", "active"])?;

    let mut calendar = OperationCalendar::default();
    for (idx, result) in csv_reader.deserialize::<CalendarRow>().enumerate() {
        let row = result?;
        let day = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|_| {
            IngestError::InvalidValue {
                table: "calendar",
                row: idx + 1,
                message: format!("unparseable date {:?}", row.date),
            }
        })?;
        let active = parse_flag(&row.active).ok_or_else(|| IngestError::InvalidValue {
            table: "calendar",
            row: idx + 1,
            message: format!("unrecognized active flag {:?}", row.active),
        })?;
        calendar.set(row.site, day, active);
    }

    log::info!("Loaded operational calendar for {} sites", calendar.len());
    Ok(calendar)
}

#[derive(Debug, Deserialize)]
struct TraitRow {
    species: String,
    body_mass_kg: f64,
}

/// Loads the species-trait reference table.
///
/// Species names go through the reconciler so trait lookups join against
/// the same vocabulary as the detection tables.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] on a schema mismatch.
pub fn load_traits(
    reader: impl Read,
) -> Result<BTreeMap<CanonicalSpecies, SpeciesTraits>, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    ensure_columns(csv_reader.headers()?, "traits", &["species", "body_mass_kg"])?;

    let mut traits = BTreeMap::new();
    for result in csv_reader.deserialize::<TraitRow>() {
        let row = result?;
        if let Some(species) = hexcensus_species::resolve(&row.species).species() {
            traits.insert(
                species,
                SpeciesTraits {
                    body_mass_kg: row.body_mass_kg,
                },
            );
        }
    }

    log::info!("Loaded traits for {} species", traits.len());
    Ok(traits)
}

/// Loads the grid-cell polygons from a `GeoJSON` `FeatureCollection`.
///
/// Every feature needs a `StudySite` string property and a Polygon or
/// `MultiPolygon` geometry; `tree_cover` is an optional numeric
/// property. The grid's CRS is declared by the caller, not read from
/// the file.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when a feature lacks
/// `StudySite` and [`IngestError::InvalidValue`] for missing or
/// unsupported geometry.
pub fn load_grid(reader: impl Read) -> Result<Vec<GridCell>, IngestError> {
    let mut raw = String::new();
    let mut reader = reader;
    reader.read_to_string(&mut raw)?;

    let geojson: geojson::GeoJson = raw.parse()?;
    let geojson::GeoJson::FeatureCollection(collection) = geojson else {
        return Err(IngestError::InvalidValue {
            table: "grid",
            row: 0,
            message: "expected a FeatureCollection".to_string(),
        });
    };

    let mut cells = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.iter().enumerate() {
        let site = feature
            .property("StudySite")
            .and_then(|v| v.as_str())
            .ok_or(IngestError::MissingColumn {
                table: "grid",
                column: "StudySite",
            })?
            .to_string();

        let tree_cover = feature.property("tree_cover").and_then(serde_json::Value::as_f64);

        let geometry = feature
            .geometry
            .as_ref()
            .and_then(hexcensus_spatial::multipolygon_from_geometry)
            .ok_or_else(|| IngestError::InvalidValue {
                table: "grid",
                row: idx + 1,
                message: format!("feature {site:?} has no polygon geometry"),
            })?;

        cells.push(GridCell {
            site,
            polygon: geometry,
            tree_cover,
        });
    }

    log::info!("Loaded {} grid cells", cells.len());
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_aerial_rows_with_optional_group_flag() {
        let csv = "species,count,group,longitude,latitude,survey\n\
                   Baboon troop,12,1,34.35,-18.96,2022-dry\n\
                   Sable,1,0,34.40,-18.92,2022-dry\n";
        let observations = load_aerial(csv.as_bytes()).unwrap();
        assert_eq!(observations.len(), 2);
        assert!(observations[0].group);
        assert!(!observations[1].group);
        assert_eq!(observations[0].individuals, 12);
    }

    #[test]
    fn aerial_missing_column_is_fatal_with_diagnostic() {
        let csv = "species,count,latitude,survey\nSable,1,-18.92,2022-dry\n";
        let err = load_aerial(csv.as_bytes()).unwrap_err();
        match err {
            IngestError::MissingColumn { table, column } => {
                assert_eq!(table, "aerial");
                assert_eq!(column, "longitude");
            }
            other => panic!("expected MissingColumn, got {other}"),
        }
    }

    #[test]
    fn loads_camera_rows_with_both_timestamp_separators() {
        let csv = "site,species,timestamp\n\
                   A1,Impala,2022-10-03 06:00:00\n\
                   A1,Impala,2022-10-03T06:14:30.500\n";
        let records = load_camera(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].timestamp > records[0].timestamp);
    }

    #[test]
    fn camera_bad_timestamp_names_the_row() {
        let csv = "site,species,timestamp\nA1,Impala,yesterday\n";
        let err = load_camera(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidValue {
                table: "camera",
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn loads_calendar_flags() {
        let csv = "site,date,active\n\
                   A1,2022-10-01,1\n\
                   A1,2022-10-02,0\n\
                   A2,2022-10-01,true\n";
        let calendar = load_calendar(csv.as_bytes()).unwrap();
        let day = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap();
        assert!(calendar.is_active("A1", day));
        assert!(!calendar.is_active("A1", NaiveDate::from_ymd_opt(2022, 10, 2).unwrap()));
        assert!(calendar.is_active("A2", day));
    }

    #[test]
    fn loads_traits_through_the_reconciler() {
        let csv = "species,body_mass_kg\nsable,220.0\nImpala,50.0\n";
        let traits = load_traits(csv.as_bytes()).unwrap();
        assert!((traits[&CanonicalSpecies::new("Sable_antelope")].body_mass_kg - 220.0).abs()
            < f64::EPSILON);
        assert!(traits.contains_key(&CanonicalSpecies::new("Impala")));
    }

    #[test]
    fn loads_grid_features() {
        let geojson = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "StudySite": "A1", "tree_cover": 0.42 },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]
                }
            }]
        }"#;
        let cells = load_grid(geojson.as_bytes()).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site, "A1");
        assert_eq!(cells[0].tree_cover, Some(0.42));
    }

    #[test]
    fn grid_feature_without_site_id_is_fatal() {
        let geojson = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "tree_cover": 0.1 },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]
                }
            }]
        }"#;
        let err = load_grid(geojson.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn {
                table: "grid",
                column: "StudySite"
            }
        ));
    }
}
