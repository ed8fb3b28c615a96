//! Resolution-adaptive zonal aggregation.
//!
//! For a polygon much smaller than one grid cell, masking the native grid
//! would select no pixel at all (or a single pixel with full weight). The
//! aggregator instead upsamples the grid by a factor that grows as the
//! polygon shrinks, rasterizes the polygon on the finer grid, and averages
//! the replicated values under the mask. The result approximates an
//! area-weighted mean.
//!
//! ```text
//! polygon ──► reproject to grid CRS ──► area ratio ──► scale factor s
//!                                                         │
//! grid (n x m) ──► upsample (n*s x m*s) ──► rasterize ──► mask
//!                                                         │
//! every combination ──► values under mask ──► mean ──► ResultTree
//! ```

use coverage::CoverageDescriptor;
use ndarray::ArrayView2;
use projection::{is_geographic, reproject_area};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, info_span};
use zonal_common::{AreaOfInterest, Crs, ZonalError, ZonalResult};

use crate::combos::CombinationSet;
use crate::config::EngineConfig;
use crate::grid::GridSlice;
use crate::rasterize::{rasterize, Mask, PixelTransform};
use crate::resample::NearestSampler;
use crate::scale::scale_factor;
use crate::stats::{Statistic, ZonalStats};
use crate::tree::ResultTree;

/// A polygon prepared against one grid: upsampling factor, mask, and the
/// source cell behind every masked pixel.
#[derive(Debug, Clone)]
pub struct ZonalMask {
    pub scale_factor: usize,
    pub mask: Mask,
    /// Source (row, col) behind each masked pixel.
    sources: Vec<(usize, usize)>,
}

impl ZonalMask {
    /// Prepare `area` for aggregation over `grid`.
    ///
    /// The polygon is reprojected into the grid CRS, which must be known
    /// and projected.
    pub fn prepare(
        grid: &GridSlice,
        fallback_crs: Option<Crs>,
        area: &AreaOfInterest,
    ) -> ZonalResult<Self> {
        let crs = grid.crs().or(fallback_crs).ok_or_else(|| {
            ZonalError::spatial_reference("Grid has no coordinate reference system")
        })?;
        if is_geographic(crs) {
            return Err(ZonalError::spatial_reference(format!(
                "Grid CRS {} is geographic; zonal statistics need projected coordinates",
                crs
            )));
        }
        let area = reproject_area(area, crs)?;

        let cell_area = grid.cell_area()?;
        let factor = scale_factor(area.area(), cell_area)?;

        // Upsample one representative layer to fix the target shape
        let (x, y) = grid.upsampled_axes(factor)?;
        let representative = GridSlice::new(
            grid.crs(),
            Vec::new(),
            grid.x().clone(),
            grid.y().clone(),
            grid.layer(0).iter().copied().collect(),
        )?
        .upsampled(factor)?;

        let (dx, dy) = grid.cell_size()?;
        let transform = PixelTransform::from_coordinates(
            &x.coordinates,
            &y.coordinates,
            (dx / factor as f64, dy / factor as f64),
        )?;
        let mask = rasterize(&area, &transform, x.len(), y.len());

        if mask.shape() != (representative.height(), representative.width()) {
            return Err(ZonalError::invalid_grid(format!(
                "Mask shape {:?} does not match upsampled grid {:?}",
                mask.shape(),
                (representative.height(), representative.width())
            )));
        }

        let sampler = NearestSampler::new(grid.width(), grid.height(), x.len(), y.len());
        let sources = mask
            .pixels()
            .filter_map(|(col, row)| sampler.source_cell(col, row))
            .collect();

        debug!(
            cell_area = cell_area,
            polygon_area = area.area(),
            scale_factor = factor,
            mask_pixels = mask.count(),
            "Prepared zonal mask"
        );

        Ok(Self {
            scale_factor: factor,
            mask,
            sources,
        })
    }

    /// Number of upsampled pixels inside the polygon.
    pub fn pixel_count(&self) -> usize {
        self.sources.len()
    }

    /// Upsampled values under the mask for one layer.
    pub fn values<'a>(&'a self, layer: ArrayView2<'a, f64>) -> impl Iterator<Item = f64> + 'a {
        self.sources.iter().map(move |&cell| layer[cell])
    }
}

/// Fills result trees with polygon statistics.
#[derive(Debug, Clone, Default)]
pub struct ZonalAggregator {
    config: EngineConfig,
}

impl ZonalAggregator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the configured statistic for every combination of the
    /// grid's non-spatial axes inside `area`.
    ///
    /// Leaves are null where the polygon covers no valid pixel.
    pub fn aggregate(
        &self,
        descriptor: &CoverageDescriptor,
        grid: &GridSlice,
        area: &AreaOfInterest,
    ) -> ZonalResult<ResultTree> {
        let span = info_span!("zonal_aggregate", coverage_id = %descriptor.coverage_id);
        let _guard = span.enter();
        let start = Instant::now();

        let combinations =
            CombinationSet::enumerate(grid.non_spatial_axes(), &descriptor.encodings)?;
        let mut tree = combinations.empty_tree()?;
        let zonal = ZonalMask::prepare(grid, descriptor.crs, area)?;

        let statistic = self.config.statistic;
        let results: Vec<Option<f64>> = if zonal.pixel_count() == 0 {
            vec![empty_result(statistic); combinations.len()]
        } else if self.config.parallel {
            (0..combinations.len())
                .into_par_iter()
                .map(|layer| statistic.reduce(zonal.values(grid.layer(layer))))
                .collect()
        } else {
            (0..combinations.len())
                .map(|layer| statistic.reduce(zonal.values(grid.layer(layer))))
                .collect()
        };

        for (combination, value) in combinations.combinations().iter().zip(results) {
            tree.set_leaf(&combination.labels, value)?;
        }

        info!(
            scale_factor = zonal.scale_factor,
            mask_pixels = zonal.pixel_count(),
            combinations = combinations.len(),
            statistic = %statistic,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Zonal aggregation complete"
        );

        Ok(tree)
    }

    /// Full statistics for every combination, in enumeration order.
    pub fn zonal_statistics(
        &self,
        descriptor: &CoverageDescriptor,
        grid: &GridSlice,
        area: &AreaOfInterest,
    ) -> ZonalResult<Vec<(Vec<String>, ZonalStats)>> {
        let combinations =
            CombinationSet::enumerate(grid.non_spatial_axes(), &descriptor.encodings)?;
        let zonal = ZonalMask::prepare(grid, descriptor.crs, area)?;

        let stats: Vec<ZonalStats> = if self.config.parallel {
            (0..combinations.len())
                .into_par_iter()
                .map(|layer| ZonalStats::from_values(zonal.values(grid.layer(layer))))
                .collect()
        } else {
            (0..combinations.len())
                .map(|layer| ZonalStats::from_values(zonal.values(grid.layer(layer))))
                .collect()
        };

        Ok(combinations
            .combinations()
            .iter()
            .map(|c| c.labels.clone())
            .zip(stats)
            .collect())
    }
}

fn empty_result(statistic: Statistic) -> Option<f64> {
    statistic.reduce(std::iter::empty())
}
