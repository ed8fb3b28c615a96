//! Where grid slices come from.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use zonal_common::{BoundingBox, ZonalError, ZonalResult};

use crate::grid::{GridDocument, GridSlice};

/// A request for part of a coverage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageRequest {
    pub coverage_id: String,
    /// Spatial extent in the grid's own CRS.
    pub bbox: Option<BoundingBox>,
    /// Coordinates to keep per non-spatial axis.
    pub subsets: Vec<(String, Vec<f64>)>,
}

impl CoverageRequest {
    pub fn new(coverage_id: impl Into<String>) -> Self {
        Self {
            coverage_id: coverage_id.into(),
            ..Default::default()
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_subset(mut self, axis: impl Into<String>, coordinates: Vec<f64>) -> Self {
        self.subsets.push((axis.into(), coordinates));
        self
    }

    /// Clip and subset a full grid as requested.
    pub fn apply(&self, grid: GridSlice) -> ZonalResult<GridSlice> {
        let mut grid = match &self.bbox {
            Some(bbox) => grid.clip(bbox)?,
            None => grid,
        };
        for (axis, coordinates) in &self.subsets {
            grid = grid.subset(axis, coordinates)?;
        }
        Ok(grid)
    }
}

/// Fetches grid slices for coverage requests.
#[async_trait]
pub trait GridSource: Send + Sync {
    async fn fetch(&self, request: &CoverageRequest) -> ZonalResult<GridSlice>;
}

/// Reads `<dir>/<coverage_id>.grid.json`.
#[derive(Debug, Clone)]
pub struct DirectoryGridSource {
    root: PathBuf,
}

impl DirectoryGridSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, coverage_id: &str) -> ZonalResult<PathBuf> {
        let unsafe_id = coverage_id.contains(['/', '\\']) || coverage_id.contains("..");
        if coverage_id.is_empty() || unsafe_id {
            return Err(ZonalError::Config(format!("Invalid coverage id '{}'", coverage_id)));
        }
        Ok(self.root.join(format!("{}.grid.json", coverage_id)))
    }
}

#[async_trait]
impl GridSource for DirectoryGridSource {
    async fn fetch(&self, request: &CoverageRequest) -> ZonalResult<GridSlice> {
        let path = self.path_for(&request.coverage_id)?;
        debug!(path = %path.display(), "Reading grid");

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ZonalError::Io(format!("{}: {}", path.display(), e)))?;

        // Transposing large grids is CPU work
        let grid = tokio::task::spawn_blocking(move || -> ZonalResult<GridSlice> {
            let document: GridDocument = serde_json::from_str(&text)
                .map_err(|e| ZonalError::invalid_grid(format!("Malformed grid document: {}", e)))?;
            GridSlice::from_document(document)
        })
        .await
        .map_err(|e| ZonalError::Io(format!("Grid decoding task failed: {}", e)))??;

        request.apply(grid)
    }
}

/// Grids held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryGridSource {
    grids: HashMap<String, GridSlice>,
}

impl MemoryGridSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, coverage_id: impl Into<String>, grid: GridSlice) -> Self {
        self.grids.insert(coverage_id.into(), grid);
        self
    }
}

#[async_trait]
impl GridSource for MemoryGridSource {
    async fn fetch(&self, request: &CoverageRequest) -> ZonalResult<GridSlice> {
        let grid = self
            .grids
            .get(&request.coverage_id)
            .cloned()
            .ok_or_else(|| ZonalError::Io(format!("Unknown coverage '{}'", request.coverage_id)))?;
        request.apply(grid)
    }
}
