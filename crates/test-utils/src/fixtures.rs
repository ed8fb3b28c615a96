//! Common test fixtures for zonal aggregation tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios: climate coverage axes, grid layouts, and on-disk fixture
//! directories.

use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Axis labels of the climate-era coverages.
pub mod climate {
    pub const HISTORICAL_ERA: &str = "1950-2008";
    pub const ERAS: [&str; 3] = ["1950-2008", "2040-2069", "2070-2099"];

    pub const BASELINE_MODEL: &str = "CRU-TS";
    pub const MODELS: [&str; 3] = ["CRU-TS", "GFDL-CM3", "NCAR-CCSM4"];

    pub const HISTORICAL_SCENARIO: &str = "historical";
    pub const SCENARIOS: [&str; 3] = ["historical", "rcp45", "rcp85"];
}

/// Common CRS identifiers.
pub mod crs {
    pub const EPSG_3338: &str = "EPSG:3338";
    pub const EPSG_3338_URL: &str = "http://www.opengis.net/def/crs/EPSG/0/3338";
    pub const EPSG_4326: &str = "EPSG:4326";
}

/// A regular, north-up grid layout.
///
/// Coordinates are cell centers: x ascends from `min_x + cell/2`, y
/// descends from `max_y - cell/2`.
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    pub width: usize,
    pub height: usize,
    pub min_x: f64,
    pub min_y: f64,
    pub cell: f64,
}

impl GridSpec {
    pub const fn new(width: usize, height: usize, min_x: f64, min_y: f64, cell: f64) -> Self {
        Self {
            width,
            height,
            min_x,
            min_y,
            cell,
        }
    }

    /// Returns the total number of grid cells.
    pub fn size(&self) -> usize {
        self.width * self.height
    }

    /// Returns the bounding box as (min_x, min_y, max_x, max_y).
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        (
            self.min_x,
            self.min_y,
            self.min_x + self.width as f64 * self.cell,
            self.min_y + self.height as f64 * self.cell,
        )
    }

    pub fn x_coords(&self) -> Vec<f64> {
        (0..self.width)
            .map(|i| self.min_x + (i as f64 + 0.5) * self.cell)
            .collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        let max_y = self.bbox().3;
        (0..self.height)
            .map(|j| max_y - (j as f64 + 0.5) * self.cell)
            .collect()
    }
}

/// Unit-cell 10x10 grid anchored at the origin.
pub const UNIT_10X10: GridSpec = GridSpec::new(10, 10, 0.0, 0.0, 1.0);

/// 2 km cells over interior Alaska in EPSG:3338 meters.
pub const ALASKA_2KM: GridSpec = GridSpec::new(20, 20, 250_000.0, 1_600_000.0, 2_000.0);

/// A temporary directory holding `<id>.json` and `<id>.grid.json`.
pub fn fixture_dir(coverage_id: &str, description: &Value, grid: &Value) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write_fixture(dir.path(), coverage_id, description, grid);
    dir
}

/// Write a coverage's description and grid documents into `dir`.
pub fn write_fixture(dir: &Path, coverage_id: &str, description: &Value, grid: &Value) {
    std::fs::write(
        dir.join(format!("{}.json", coverage_id)),
        serde_json::to_vec_pretty(description).expect("serialize description"),
    )
    .expect("write description");
    std::fs::write(
        dir.join(format!("{}.grid.json", coverage_id)),
        serde_json::to_vec_pretty(grid).expect("serialize grid"),
    )
    .expect("write grid");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_coords() {
        let spec = GridSpec::new(3, 2, 10.0, 20.0, 2.0);
        assert_eq!(spec.size(), 6);
        assert_eq!(spec.bbox(), (10.0, 20.0, 16.0, 24.0));
        assert_eq!(spec.x_coords(), vec![11.0, 13.0, 15.0]);
        assert_eq!(spec.y_coords(), vec![23.0, 21.0]);
    }

    #[test]
    fn test_fixture_dir_writes_both_documents() {
        let dir = fixture_dir("cov", &serde_json::json!({"a": 1}), &serde_json::json!({"b": 2}));
        assert!(dir.path().join("cov.json").exists());
        assert!(dir.path().join("cov.grid.json").exists());
    }
}
