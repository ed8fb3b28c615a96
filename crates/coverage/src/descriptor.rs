//! Decoded, immutable coverage metadata.

use serde::Serialize;
use std::collections::BTreeMap;
use zonal_common::{Crs, ZonalError, ZonalResult};

use crate::axis::AxisDescriptor;
use crate::encoding::DimensionEncoding;

/// Everything the engine needs to know about one remote coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageDescriptor {
    pub coverage_id: String,
    /// Axes in declared order.
    pub axes: Vec<AxisDescriptor>,
    pub crs: Option<Crs>,
    pub encodings: BTreeMap<String, DimensionEncoding>,
    #[serde(skip)]
    x_index: usize,
    #[serde(skip)]
    y_index: usize,
}

impl CoverageDescriptor {
    /// Build a descriptor. `x_index`/`y_index` point into `axes`.
    pub fn new(
        coverage_id: impl Into<String>,
        axes: Vec<AxisDescriptor>,
        x_index: usize,
        y_index: usize,
        crs: Option<Crs>,
        encodings: BTreeMap<String, DimensionEncoding>,
    ) -> ZonalResult<Self> {
        if x_index >= axes.len() || y_index >= axes.len() || x_index == y_index {
            return Err(ZonalError::metadata(
                "Coverage must declare distinct x and y axes",
            ));
        }
        Ok(Self {
            coverage_id: coverage_id.into(),
            axes,
            crs,
            encodings,
            x_index,
            y_index,
        })
    }

    /// The spatial axes as (x, y), whatever order they were declared in.
    pub fn spatial_axes(&self) -> (&AxisDescriptor, &AxisDescriptor) {
        (&self.axes[self.x_index], &self.axes[self.y_index])
    }

    /// Non-spatial axes in declared order.
    pub fn non_spatial_axes(&self) -> impl Iterator<Item = &AxisDescriptor> {
        self.axes.iter().filter(|axis| !axis.is_spatial())
    }

    pub fn axis(&self, name: &str) -> Option<&AxisDescriptor> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    pub fn encoding(&self, axis: &str) -> Option<&DimensionEncoding> {
        self.encodings.get(axis)
    }

    /// Semantic label of `coordinate` on `axis`.
    pub fn label(&self, axis: &str, coordinate: i64) -> ZonalResult<&str> {
        self.encoding(axis)
            .ok_or_else(|| ZonalError::decode_key(axis, coordinate))?
            .label(coordinate)
    }

    /// Declared (dx, dy) resolution of the spatial axes, when both are regular.
    pub fn resolution(&self) -> Option<(f64, f64)> {
        let (x, y) = self.spatial_axes();
        Some((x.resolution?, y.resolution?))
    }
}
