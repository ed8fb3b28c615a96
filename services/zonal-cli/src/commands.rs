//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use coverage::{CoverageRegistry, DirectorySource};
use serde::Serialize;
use tracing::info;
use zonal_common::{AreaOfInterest, Crs};
use zonal_engine::{
    DirectoryGridSource, EngineConfig, ValidityRules, ZonalAggregator, ZonalPipeline,
};

use crate::{AggregateArgs, DescribeArgs};

/// Run one aggregation and render the result tree.
pub async fn aggregate(args: &AggregateArgs) -> Result<String> {
    let config = engine_config(args)?;
    let area = read_area(args)?;
    let subsets = args
        .subsets
        .iter()
        .map(|s| parse_subset(s))
        .collect::<Result<Vec<_>>>()?;

    let rules = match &args.rules {
        Some(path) => ValidityRules::from_path(Path::new(path))
            .with_context(|| format!("Failed to load rules from {}", path))?,
        None => ValidityRules::default(),
    };

    info!(
        coverage_id = %args.coverage_id,
        statistic = %config.statistic,
        rules = rules.rules.len(),
        "Running zonal aggregation"
    );

    let pipeline = ZonalPipeline::new(
        Arc::new(CoverageRegistry::new()),
        Arc::new(DirectorySource::new(&args.descriptions)),
        Arc::new(DirectoryGridSource::new(&args.grids)),
        ZonalAggregator::new(config),
    )
    .with_rules(rules);

    let tree = pipeline
        .run(&args.coverage_id, &area, &subsets)
        .await?
        .into_result()?;
    render(&tree, args.pretty)
}

/// Decode a description and render it.
pub async fn describe(args: &DescribeArgs) -> Result<String> {
    let registry = CoverageRegistry::new();
    let source = DirectorySource::new(&args.descriptions);
    let descriptor = registry
        .load(&args.coverage_id, &source)
        .await
        .with_context(|| format!("Failed to describe coverage '{}'", args.coverage_id))?;
    render(descriptor.as_ref(), true)
}

fn engine_config(args: &AggregateArgs) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env();
    if let Some(statistic) = &args.statistic {
        config.statistic = statistic.parse().map_err(|e: String| anyhow!(e))?;
    }
    if args.round.is_some() {
        config.round_places = args.round;
    }
    if !args.nodata.is_empty() {
        config.nodata = args.nodata.clone();
    }
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn read_area(args: &AggregateArgs) -> Result<AreaOfInterest> {
    let crs = Crs::parse(&args.polygon_crs).context("Invalid polygon CRS")?;
    match (&args.geojson, &args.wkt) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))?;
            Ok(AreaOfInterest::from_geojson(&text, crs)?)
        }
        (None, Some(wkt)) => Ok(AreaOfInterest::from_wkt(wkt, crs)?),
        (None, None) => Err(anyhow!("Either --geojson or --wkt is required")),
    }
}

/// Parse `axis=c1,c2,...`.
fn parse_subset(s: &str) -> Result<(String, Vec<f64>)> {
    let (axis, coordinates) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Subset '{}' must look like axis=1,2", s))?;
    let coordinates = coordinates
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid coordinates in subset '{}'", s))?;
    Ok((axis.trim().to_string(), coordinates))
}

fn render<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{
        climate, create_layered_values, crs, description_document, fixture_dir, grid_document,
        square_wkt, UNIT_10X10,
    };
    use zonal_common::ZonalError;

    fn args(dir: &Path, wkt: String) -> AggregateArgs {
        AggregateArgs {
            coverage_id: "cov".to_string(),
            descriptions: dir.display().to_string(),
            grids: dir.display().to_string(),
            geojson: None,
            wkt: Some(wkt),
            polygon_crs: crs::EPSG_3338.to_string(),
            rules: None,
            subsets: Vec::new(),
            statistic: Some("mean".to_string()),
            round: None,
            nodata: Vec::new(),
            pretty: false,
        }
    }

    fn fixtures() -> tempfile::TempDir {
        let description = description_document(
            "cov",
            &[("model", &climate::MODELS[..2])],
            &UNIT_10X10,
            crs::EPSG_3338,
        );
        let values = create_layered_values(2, 10, 10, |layer, _, _| layer as f64 + 0.5);
        let grid = grid_document(crs::EPSG_3338, &[("model", 2)], &UNIT_10X10, &values);
        fixture_dir("cov", &description, &grid)
    }

    #[test]
    fn test_parse_subset() {
        assert_eq!(parse_subset("model=0, 2").unwrap(), ("model".to_string(), vec![0.0, 2.0]));
        assert!(parse_subset("model").is_err());
        assert!(parse_subset("model=a").is_err());
    }

    #[tokio::test]
    async fn test_aggregate_command() {
        let dir = fixtures();
        let output = aggregate(&args(dir.path(), square_wkt(2.0, 2.0, 3.0))).await.unwrap();
        assert_eq!(output, r#"{"CRU-TS":0.5,"GFDL-CM3":1.5}"#);
    }

    #[tokio::test]
    async fn test_aggregate_outside_is_no_data() {
        let dir = fixtures();
        let err = aggregate(&args(dir.path(), square_wkt(500.0, 500.0, 1.0))).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZonalError>(), Some(ZonalError::NoData(_))));
    }

    #[tokio::test]
    async fn test_describe_command() {
        let dir = fixtures();
        let output = describe(&DescribeArgs {
            coverage_id: "cov".to_string(),
            descriptions: dir.path().display().to_string(),
        })
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["coverage_id"], "cov");
    }
}
