#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for the hexagonal study grid.
//!
//! Builds an R-tree over the fixed grid-cell polygons and provides
//! point-in-polygon lookups that assign each aerial observation to its
//! enclosing `StudySite` cell, or to none. The grid and the point set
//! both carry a declared CRS; a mismatch rejects the whole join before
//! any geometry is touched, since comparing raw coordinates across
//! coordinate systems silently corrupts every downstream aggregate.

use geo::{Contains, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

/// Errors from grid construction or the spatial join.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// Point set and grid declare different coordinate reference systems.
    #[error("CRS mismatch: grid is {grid}, points are {points}")]
    CrsMismatch {
        /// CRS the grid was built with.
        grid: Crs,
        /// CRS declared for the point set.
        points: Crs,
    },

    /// A coordinate is impossible for the declared geographic CRS,
    /// which usually means projected data was mislabeled as lon/lat.
    #[error(
        "coordinate ({longitude}, {latitude}) at row {row} is out of range for {crs}; \
         input is likely in a different CRS"
    )]
    CoordinateOutOfRange {
        /// Zero-based row index of the offending point.
        row: usize,
        /// Offending longitude/easting.
        longitude: f64,
        /// Offending latitude/northing.
        latitude: f64,
        /// The CRS the point set claimed.
        crs: Crs,
    },

    /// Two grid cells share a `StudySite` id.
    #[error("duplicate StudySite id in grid: {site}")]
    DuplicateSite {
        /// The repeated site id.
        site: String,
    },

    /// A CRS string could not be parsed.
    #[error("unrecognized CRS {0:?}: expected \"EPSG:<code>\"")]
    InvalidCrs(String),
}

/// A coordinate reference system, identified by EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs(u32);

impl Crs {
    /// WGS 84 geographic coordinates (lon/lat degrees).
    pub const WGS84: Self = Self(4326);

    /// A CRS from its EPSG code.
    #[must_use]
    pub const fn epsg(code: u32) -> Self {
        Self(code)
    }

    /// The EPSG code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Whether this is a geographic (degree-based) CRS we can
    /// range-check coordinates against.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        self.0 == 4326
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl std::str::FromStr for Crs {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        code.parse::<u32>()
            .map(Self)
            .map_err(|_| SpatialError::InvalidCrs(s.to_string()))
    }
}

/// One grid cell as loaded from the reference dataset.
#[derive(Debug, Clone)]
pub struct GridCell {
    /// Unique `StudySite` identifier.
    pub site: String,
    /// Cell polygon in the grid's CRS.
    pub polygon: MultiPolygon<f64>,
    /// Tree-cover fraction habitat covariate, when present.
    pub tree_cover: Option<f64>,
}

/// A grid cell stored in the R-tree with its precomputed envelope.
#[derive(Debug)]
struct CellEntry {
    site: String,
    tree_cover: Option<f64>,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for CellEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over the study grid.
///
/// Constructed once from the fixed reference polygons and read-only
/// afterwards; every pipeline stage shares it without locking.
#[derive(Debug)]
pub struct GridIndex {
    cells: RTree<CellEntry>,
    crs: Crs,
    len: usize,
}

impl GridIndex {
    /// Builds the R-tree index from the grid cells.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::DuplicateSite`] if two cells share a
    /// `StudySite` id.
    pub fn from_cells(cells: Vec<GridCell>, crs: Crs) -> Result<Self, SpatialError> {
        let mut seen = std::collections::BTreeSet::new();
        let mut entries = Vec::with_capacity(cells.len());

        for cell in cells {
            if !seen.insert(cell.site.clone()) {
                return Err(SpatialError::DuplicateSite { site: cell.site });
            }

            let envelope = compute_envelope(&cell.polygon);
            entries.push(CellEntry {
                site: cell.site,
                tree_cover: cell.tree_cover,
                envelope,
                polygon: cell.polygon,
            });
        }

        let len = entries.len();
        log::info!("Built grid index with {len} cells ({crs})");

        Ok(Self {
            cells: RTree::bulk_load(entries),
            crs,
            len,
        })
    }

    /// Number of cells in the grid.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the grid is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The CRS the grid was built with.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// All `StudySite` ids, in id order.
    #[must_use]
    pub fn sites(&self) -> Vec<&str> {
        let mut sites: Vec<&str> = self.cells.iter().map(|e| e.site.as_str()).collect();
        sites.sort_unstable();
        sites
    }

    /// Tree-cover covariate for a site, when the grid carries one.
    #[must_use]
    pub fn tree_cover(&self, site: &str) -> Option<f64> {
        self.cells
            .iter()
            .find(|e| e.site == site)
            .and_then(|e| e.tree_cover)
    }

    /// Look up the enclosing cell for a point, without a CRS check.
    ///
    /// The grid is assumed non-overlapping; if a boundary point lands in
    /// more than one cell, the lexicographically smallest site id wins
    /// so the assignment is deterministic and never double-counts.
    #[must_use]
    pub fn locate(&self, longitude: f64, latitude: f64) -> Option<&str> {
        let point = geo::Point::new(longitude, latitude);
        let query_env = AABB::from_point([longitude, latitude]);

        let mut best: Option<&CellEntry> = None;
        for entry in self.cells.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                match best {
                    None => best = Some(entry),
                    Some(current) if entry.site < current.site => best = Some(entry),
                    _ => {}
                }
            }
        }

        best.map(|e| e.site.as_str())
    }

    /// Assigns every point to its enclosing cell (`Some(site)`) or to
    /// none, rejecting the whole batch up front on a CRS problem.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::CrsMismatch`] when `points_crs` differs
    /// from the grid's CRS, and [`SpatialError::CoordinateOutOfRange`]
    /// when a geographic point set contains coordinates outside
    /// [-180, 180] x [-90, 90].
    pub fn join(
        &self,
        points: &[(f64, f64)],
        points_crs: Crs,
    ) -> Result<Vec<Option<&str>>, SpatialError> {
        if points_crs != self.crs {
            return Err(SpatialError::CrsMismatch {
                grid: self.crs,
                points: points_crs,
            });
        }

        if points_crs.is_geographic() {
            for (row, &(lon, lat)) in points.iter().enumerate() {
                if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                    return Err(SpatialError::CoordinateOutOfRange {
                        row,
                        longitude: lon,
                        latitude: lat,
                        crs: points_crs,
                    });
                }
            }
        }

        let assignments: Vec<Option<&str>> = points
            .iter()
            .map(|&(lon, lat)| self.locate(lon, lat))
            .collect();

        let outside = assignments.iter().filter(|a| a.is_none()).count();
        if outside > 0 {
            log::info!(
                "{outside}/{} observations fall outside the study grid",
                points.len()
            );
        }

        Ok(assignments)
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`], accepting both
/// `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn multipolygon_from_geometry(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    /// Unit square with its lower-left corner at `(x, y)`.
    fn square(site: &str, x: f64, y: f64) -> GridCell {
        GridCell {
            site: site.to_string(),
            polygon: MultiPolygon(vec![polygon![
                (x: x, y: y),
                (x: x + 1.0, y: y),
                (x: x + 1.0, y: y + 1.0),
                (x: x, y: y + 1.0),
            ]]),
            tree_cover: None,
        }
    }

    fn two_cell_grid() -> GridIndex {
        GridIndex::from_cells(
            vec![square("A1", 0.0, 0.0), square("A2", 1.0, 0.0)],
            Crs::WGS84,
        )
        .unwrap()
    }

    #[test]
    fn locates_point_in_enclosing_cell() {
        let grid = two_cell_grid();
        assert_eq!(grid.locate(0.5, 0.5), Some("A1"));
        assert_eq!(grid.locate(1.5, 0.5), Some("A2"));
        assert_eq!(grid.locate(5.0, 5.0), None);
    }

    #[test]
    fn join_tags_each_point_once() {
        let grid = two_cell_grid();
        let assignments = grid
            .join(&[(0.5, 0.5), (1.5, 0.5), (9.0, 9.0)], Crs::WGS84)
            .unwrap();
        assert_eq!(assignments, vec![Some("A1"), Some("A2"), None]);
    }

    #[test]
    fn rejects_mismatched_crs() {
        let grid = two_cell_grid();
        let err = grid.join(&[(0.5, 0.5)], Crs::epsg(32736)).unwrap_err();
        assert!(matches!(err, SpatialError::CrsMismatch { .. }));
    }

    #[test]
    fn rejects_projected_coordinates_mislabeled_as_geographic() {
        let grid = two_cell_grid();
        // UTM-scale eastings cannot be longitudes.
        let err = grid
            .join(&[(576_431.0, 7_893_210.0)], Crs::WGS84)
            .unwrap_err();
        assert!(matches!(
            err,
            SpatialError::CoordinateOutOfRange { row: 0, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_site_ids() {
        let err = GridIndex::from_cells(
            vec![square("A1", 0.0, 0.0), square("A1", 1.0, 0.0)],
            Crs::WGS84,
        )
        .unwrap_err();
        assert!(matches!(err, SpatialError::DuplicateSite { .. }));
    }

    #[test]
    fn overlap_tie_breaks_to_smallest_site_id() {
        // Two identical squares; any interior point is inside both.
        let grid = GridIndex::from_cells(
            vec![square("B2", 0.0, 0.0), square("A1", 0.0, 0.0)],
            Crs::WGS84,
        )
        .unwrap();
        assert_eq!(grid.locate(0.5, 0.5), Some("A1"));
    }

    #[test]
    fn parses_crs_strings() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::WGS84);
        assert_eq!("epsg:32736".parse::<Crs>().unwrap(), Crs::epsg(32736));
        assert_eq!("4326".parse::<Crs>().unwrap(), Crs::WGS84);
        assert!("not-a-crs".parse::<Crs>().is_err());
    }

    #[test]
    fn exposes_habitat_covariates() {
        let mut cell = square("A1", 0.0, 0.0);
        cell.tree_cover = Some(0.42);
        let grid = GridIndex::from_cells(vec![cell], Crs::WGS84).unwrap();
        assert_eq!(grid.tree_cover("A1"), Some(0.42));
        assert_eq!(grid.tree_cover("A2"), None);
        assert_eq!(grid.sites(), vec!["A1"]);
    }
}
