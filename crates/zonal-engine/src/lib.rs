//! Zonal aggregation over labeled multi-dimensional grids.
//!
//! Given a decoded coverage, a fetched grid and a polygon, the engine
//! computes one statistic per combination of the grid's non-spatial axis
//! labels and returns them as a nested [`ResultTree`]:
//!
//! 1. [`CombinationSet`] enumerates label paths and builds the empty tree.
//! 2. [`ZonalAggregator`] upsamples the grid by a polygon-dependent
//!    [`scale_factor`], rasterizes the polygon and fills every leaf.
//! 3. [`ValidityRules`] remove combinations the coverage cannot hold.
//! 4. [`finalize`] nullifies sentinels, prunes and rounds.
//!
//! [`ZonalPipeline`] runs all four steps against async description and
//! grid sources.

pub mod aggregate;
pub mod combos;
pub mod config;
pub mod filter;
pub mod grid;
pub mod pipeline;
pub mod postprocess;
pub mod rasterize;
pub mod resample;
pub mod scale;
pub mod source;
pub mod stats;
pub mod tree;

pub use aggregate::{ZonalAggregator, ZonalMask};
pub use combos::{Combination, CombinationSet};
pub use config::EngineConfig;
pub use filter::{AxisCondition, Condition, ValidityRule, ValidityRules};
pub use grid::{GridAxis, GridDocument, GridSlice};
pub use pipeline::{build_request, ZonalPipeline};
pub use postprocess::{finalize, FinalizeOptions, ZonalOutcome};
pub use rasterize::{rasterize, Mask, PixelTransform};
pub use scale::scale_factor;
pub use source::{CoverageRequest, DirectoryGridSource, GridSource, MemoryGridSource};
pub use stats::{Statistic, ValueCount, ZonalStats};
pub use tree::{ResultNode, ResultTree};
