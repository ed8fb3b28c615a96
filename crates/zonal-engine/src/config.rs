//! Configuration for the aggregation engine.

use crate::postprocess::FinalizeOptions;
use crate::stats::Statistic;
use serde::{Deserialize, Serialize};

/// Configuration for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Statistic written into result tree leaves.
    pub statistic: Statistic,

    /// Aggregate combinations on the rayon thread pool.
    pub parallel: bool,

    /// Decimal places to round leaves to; None leaves values untouched.
    pub round_places: Option<u32>,

    /// Sentinel values treated as missing data in results.
    pub nodata: Vec<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            statistic: Statistic::Mean,
            parallel: true,
            round_places: None,
            nodata: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ZONAL_STATISTIC") {
            if let Ok(statistic) = val.parse() {
                config.statistic = statistic;
            }
        }

        if let Ok(val) = std::env::var("ZONAL_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("ZONAL_ROUND_PLACES") {
            if let Ok(places) = val.parse() {
                config.round_places = Some(places);
            }
        }

        if let Ok(val) = std::env::var("ZONAL_NODATA") {
            config.nodata = parse_nodata_list(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(places) = self.round_places {
            if places > 15 {
                return Err("round_places must be 0-15".to_string());
            }
        }

        if self.nodata.iter().any(|v| !v.is_finite()) {
            return Err("nodata sentinels must be finite numbers".to_string());
        }

        Ok(())
    }

    /// Postprocessing options derived from this configuration.
    pub fn finalize_options(&self) -> FinalizeOptions {
        FinalizeOptions {
            nodata: self.nodata.clone(),
            round_places: self.round_places,
        }
    }
}

/// Parse a comma-separated list of numbers, skipping entries that do not
/// parse.
pub fn parse_nodata_list(s: &str) -> Vec<f64> {
    s.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
