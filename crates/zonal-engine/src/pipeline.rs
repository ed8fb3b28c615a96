//! End-to-end zonal requests: describe, fetch, aggregate, filter, finish.

use coverage::{CoverageDescriptor, CoverageRegistry, DescriptionSource};
use projection::reproject_bbox;
use std::sync::Arc;
use tracing::{debug, info};
use zonal_common::{AreaOfInterest, ZonalError, ZonalResult};

use crate::aggregate::ZonalAggregator;
use crate::filter::ValidityRules;
use crate::grid::GridSlice;
use crate::postprocess::{finalize, ZonalOutcome};
use crate::source::{CoverageRequest, GridSource};
use crate::tree::ResultTree;

/// Wires the registry, the fetch layer and the aggregator together.
pub struct ZonalPipeline {
    registry: Arc<CoverageRegistry>,
    descriptions: Arc<dyn DescriptionSource>,
    grids: Arc<dyn GridSource>,
    aggregator: ZonalAggregator,
    rules: ValidityRules,
}

impl ZonalPipeline {
    pub fn new(
        registry: Arc<CoverageRegistry>,
        descriptions: Arc<dyn DescriptionSource>,
        grids: Arc<dyn GridSource>,
        aggregator: ZonalAggregator,
    ) -> Self {
        Self {
            registry,
            descriptions,
            grids,
            aggregator,
            rules: ValidityRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: ValidityRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn registry(&self) -> &CoverageRegistry {
        &self.registry
    }

    /// Aggregate one coverage over `area`.
    ///
    /// `subsets` restricts non-spatial axes before aggregation. An area
    /// that misses the coverage comes back as `NoData`.
    pub async fn run(
        &self,
        coverage_id: &str,
        area: &AreaOfInterest,
        subsets: &[(String, Vec<f64>)],
    ) -> ZonalResult<ZonalOutcome> {
        let descriptor = self.registry.load(coverage_id, self.descriptions.as_ref()).await?;

        let request = build_request(&descriptor, area, subsets)?;
        let grid = match self.grids.fetch(&request).await {
            Ok(grid) => grid,
            Err(ZonalError::NoData(msg)) => {
                debug!(coverage_id = %coverage_id, reason = %msg, "Area misses coverage");
                return Ok(ZonalOutcome::NoData);
            }
            Err(e) => return Err(e),
        };

        let mut tree = self.aggregate_blocking(descriptor, grid, area.clone()).await?;

        let removed = self.rules.apply(&mut tree);
        let outcome = finalize(tree, &self.aggregator.config().finalize_options());
        info!(
            coverage_id = %coverage_id,
            removed = removed,
            no_data = outcome.is_no_data(),
            "Zonal request complete"
        );
        Ok(outcome)
    }

    async fn aggregate_blocking(
        &self,
        descriptor: Arc<CoverageDescriptor>,
        grid: GridSlice,
        area: AreaOfInterest,
    ) -> ZonalResult<ResultTree> {
        let aggregator = self.aggregator.clone();
        tokio::task::spawn_blocking(move || aggregator.aggregate(&descriptor, &grid, &area))
            .await
            .map_err(|e| ZonalError::Io(format!("Aggregation task failed: {}", e)))?
    }
}

/// The fetch request for `area`: its bounding box in the coverage CRS,
/// widened by one cell, plus the axis subsets.
pub fn build_request(
    descriptor: &CoverageDescriptor,
    area: &AreaOfInterest,
    subsets: &[(String, Vec<f64>)],
) -> ZonalResult<CoverageRequest> {
    let mut request = CoverageRequest::new(descriptor.coverage_id.clone());
    request.subsets = subsets.to_vec();

    if let (Some(crs), Some(bbox)) = (descriptor.crs, area.bbox()) {
        let mut bbox = reproject_bbox(&bbox, area.crs, crs)?;
        if let Some((dx, dy)) = descriptor.resolution() {
            bbox = bbox.expand(dx.abs().max(dy.abs()));
        }
        request.bbox = Some(bbox);
    }
    Ok(request)
}
