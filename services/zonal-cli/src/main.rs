//! Zonal aggregation CLI
//!
//! Runs zonal statistics against coverage descriptions and grids stored
//! as JSON files, printing the result tree to stdout.

mod commands;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};
use zonal_common::ZonalError;

/// Zonal aggregation CLI
#[derive(Parser, Debug)]
#[command(name = "zonal-cli")]
#[command(about = "Polygon statistics over labeled multi-dimensional coverages")]
pub struct Cli {
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "ZONAL_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate a coverage over a polygon
    Aggregate(AggregateArgs),
    /// Print the decoded axes and encodings of a coverage
    Describe(DescribeArgs),
}

#[derive(Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("polygon").required(true).args(["geojson", "wkt"]))]
pub struct AggregateArgs {
    /// Coverage identifier
    #[arg(long)]
    pub coverage_id: String,

    /// Directory of `<coverage_id>.json` descriptions
    #[arg(long, env = "ZONAL_DESCRIPTIONS_DIR")]
    pub descriptions: String,

    /// Directory of `<coverage_id>.grid.json` grids
    #[arg(long, env = "ZONAL_GRIDS_DIR")]
    pub grids: String,

    /// GeoJSON file holding the polygon
    #[arg(long)]
    pub geojson: Option<String>,

    /// Polygon as WKT
    #[arg(long)]
    pub wkt: Option<String>,

    /// CRS of the polygon coordinates
    #[arg(long, default_value = "EPSG:4326")]
    pub polygon_crs: String,

    /// YAML or JSON validity rules
    #[arg(long, env = "ZONAL_RULES")]
    pub rules: Option<String>,

    /// Restrict an axis to coordinates, e.g. `model=0,2`
    #[arg(long = "subset")]
    pub subsets: Vec<String>,

    /// Statistic written to each leaf (mean, min, max, count)
    #[arg(long)]
    pub statistic: Option<String>,

    /// Decimal places to round to
    #[arg(long)]
    pub round: Option<u32>,

    /// Values treated as missing
    #[arg(long, allow_negative_numbers = true)]
    pub nodata: Vec<f64>,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    /// Coverage identifier
    #[arg(long)]
    pub coverage_id: String,

    /// Directory of `<coverage_id>.json` descriptions
    #[arg(long, env = "ZONAL_DESCRIPTIONS_DIR")]
    pub descriptions: String,
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async move {
        match cli.command {
            Command::Aggregate(args) => commands::aggregate(&args).await,
            Command::Describe(args) => commands::describe(&args).await,
        }
    });

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => match e.downcast_ref::<ZonalError>() {
            Some(err @ ZonalError::NoData(message)) => {
                println!("{}", serde_json::json!({"error": err.code(), "message": message}));
                ExitCode::from(2)
            }
            _ => {
                error!(error = %format!("{:#}", e), "Command failed");
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
