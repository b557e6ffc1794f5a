//! Command-line interface for `stationgeo`, which turns station and sensor
//! metadata tables into map layers.
//!
//! This binary is a thin façade over the [`stationgeo_core`] library: it parses
//! arguments, configures logging, and delegates to command handlers.
//!
//! # Available Commands
//!
//! - `convert` - Convert a dataset into `GeoJSON` and a constrained layer
//! - `sector` - Print a single radar coverage sector as a `GeoJSON` Feature
//! - `schema` - Show the constrained schema a dataset would get
//! - `datasets` - List all known datasets

mod display;

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use geojson::{Feature, Geometry, JsonObject};
use tracing::{Level, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use stationgeo_core::error::dataset_not_found;
use stationgeo_core::{
    Catalog, ConvertOptions, RowErrorPolicy, StationGeoError, convert, find_dataset,
    get_datasets, inspect_dataset, wedge,
};
use stationgeo_core_common::schema::CollisionPolicy;

#[derive(Parser)]
#[command(
    name = "stationgeo",
    version,
    about = "Station metadata to GeoJSON and constrained vector layers",
    long_about = "stationgeo converts HF radar, observing station, glider and regional sensor\n\
                  tables into a GeoJSON FeatureCollection and an attribute-constrained layer."
)]
/// Command-line arguments and options for the `stationgeo` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `stationgeo` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Converts a station metadata file into `GeoJSON` and a constrained layer.
    ///
    /// Writes `<dataset>.geojson`, `<dataset>.csv` and `<dataset>.schema.json`
    /// into the output directory.
    Convert {
        /// Dataset short name (see `stationgeo datasets`).
        #[arg(long, value_name = "NAME")]
        dataset: String,

        /// Path to the input file.
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Directory receiving the output files.
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,

        #[command(flatten)]
        settings: Settings,

        /// Lower-case property names in the `GeoJSON` output.
        #[arg(long)]
        lowercase_keys: bool,

        /// Only write the `GeoJSON` output.
        #[arg(long)]
        no_layer: bool,
    },

    /// Prints one radar coverage sector as a `GeoJSON` Feature.
    Sector {
        /// Station latitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Station longitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Range in metres.
        #[arg(long, allow_hyphen_values = true)]
        distance: f64,

        /// Start angle in degrees, counter-clockwise from east.
        #[arg(long, allow_hyphen_values = true)]
        start_angle: f64,

        /// Angular width in degrees.
        #[arg(long, allow_hyphen_values = true)]
        spread_angle: f64,

        /// Arc resolution (default: 50).
        #[arg(long)]
        arc_points: Option<f64>,
    },

    /// Shows the constrained schema derived for a dataset, without writing anything.
    Schema {
        /// Dataset short name (see `stationgeo datasets`).
        #[arg(long, value_name = "NAME")]
        dataset: String,

        /// Path to the input file.
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        #[command(flatten)]
        settings: Settings,
    },

    /// Lists all datasets `stationgeo` can convert.
    Datasets,
}

/// Options shared by the commands that run a dataset pipeline.
#[derive(clap::Args)]
struct Settings {
    /// JSON file overriding the built-in lookup tables.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Arc resolution for every sector (default: per-row `ArcPoints` or 50).
    #[arg(long)]
    arc_points: Option<f64>,

    /// How to handle columns whose constrained names collide.
    #[arg(long, value_enum, default_value_t = CollisionArg::Warn)]
    collision_policy: CollisionArg,

    /// How to handle rows whose geometry cannot be built.
    #[arg(long, value_enum, default_value_t = InvalidRowArg::Skip)]
    on_invalid_row: InvalidRowArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum CollisionArg {
    LastWriteWins,
    Warn,
    Error,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::LastWriteWins => CollisionPolicy::LastWriteWins,
            CollisionArg::Warn => CollisionPolicy::Warn,
            CollisionArg::Error => CollisionPolicy::Error,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InvalidRowArg {
    Skip,
    Abort,
}

impl From<InvalidRowArg> for RowErrorPolicy {
    fn from(arg: InvalidRowArg) -> Self {
        match arg {
            InvalidRowArg::Skip => RowErrorPolicy::Skip,
            InvalidRowArg::Abort => RowErrorPolicy::Abort,
        }
    }
}

impl Settings {
    fn to_options(&self) -> Result<ConvertOptions> {
        let catalog = match &self.catalog {
            Some(path) => Catalog::from_path(path).map_err(friendly)?,
            None => Catalog::default(),
        };
        let mut options = ConvertOptions::new()
            .with_catalog(catalog)
            .with_collision_policy(self.collision_policy.into())
            .with_row_policy(self.on_invalid_row.into());
        if let Some(arc_points) = self.arc_points {
            options = options.with_arc_points(arc_points);
        }
        Ok(options)
    }
}

/// Entry point for the `stationgeo` command-line interface.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Convert {
            dataset,
            input,
            output_dir,
            settings,
            lowercase_keys,
            no_layer,
        } => {
            info!("Converting {} as {dataset}", input.display());
            let options = settings
                .to_options()?
                .with_lowercase_property_names(lowercase_keys)
                .with_layer(!no_layer);
            handle_convert(&dataset, &input, &output_dir, &options)?;
        },
        Commands::Sector {
            lat,
            lon,
            distance,
            start_angle,
            spread_angle,
            arc_points,
        } => {
            let feature = sector_feature(lat, lon, distance, start_angle, spread_angle, arc_points)?;
            println!("{}", serde_json::to_string_pretty(&feature)?);
        },
        Commands::Schema {
            dataset,
            input,
            settings,
        } => {
            info!("Inspecting {} as {dataset}", input.display());
            handle_schema(&dataset, &input, &settings.to_options()?)?;
        },
        Commands::Datasets => {
            display::display_datasets(&get_datasets());
        },
    }

    Ok(())
}

fn handle_convert(
    dataset_name: &str,
    input: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<()> {
    let dataset = find_dataset(dataset_name)
        .ok_or_else(|| friendly(dataset_not_found(dataset_name).into()))?;
    let summary = convert(input, output_dir, &dataset, options).map_err(friendly)?;
    display::display_summary(&summary);
    Ok(())
}

fn handle_schema(dataset_name: &str, input: &Path, options: &ConvertOptions) -> Result<()> {
    let dataset = find_dataset(dataset_name)
        .ok_or_else(|| friendly(dataset_not_found(dataset_name).into()))?;
    let report = inspect_dataset(input, &dataset, options).map_err(friendly)?;
    display::display_schema_report(dataset.short_name, &report);
    Ok(())
}

/// Builds the sector polygon and wraps it in a Feature carrying its parameters.
fn sector_feature(
    lat: f64,
    lon: f64,
    distance: f64,
    start_angle: f64,
    spread_angle: f64,
    arc_points: Option<f64>,
) -> Result<Feature> {
    let polygon =
        wedge(distance, start_angle, spread_angle, lat, lon, arc_points).map_err(|e| {
            friendly(StationGeoError::from(e))
        })?;

    let mut properties = JsonObject::new();
    properties.insert("distance".to_string(), distance.into());
    properties.insert("start_angle".to_string(), start_angle.into());
    properties.insert("spread_angle".to_string(), spread_angle.into());

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&polygon))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Turns a library error into the message shown to users.
fn friendly(err: StationGeoError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(suggestion) => anyhow!("{}\n\n{suggestion}", err.user_message()),
        None => anyhow!("{}", err.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_convert_unknown_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let result = handle_convert(
            "buoys",
            &dir.path().join("input.csv"),
            dir.path(),
            &ConvertOptions::default(),
        );
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Dataset 'buoys' not found."));
        assert!(message.contains("Run 'stationgeo datasets'"));
    }

    #[test]
    fn test_handle_schema_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = handle_schema(
            "stations",
            &dir.path().join("missing.csv"),
            &ConvertOptions::default(),
        );
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("File not found:"));
    }

    #[test]
    fn test_sector_feature() {
        let feature = sector_feature(27.0, -80.0, 190_000.0, 0.0, 90.0, Some(4.0)).unwrap();
        match feature.geometry.unwrap().value {
            geojson::Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 8);
                assert_eq!(rings[0][0], vec![-80.0, 27.0]);
            },
            other => panic!("unexpected geometry: {other:?}"),
        }
        assert_eq!(feature.properties.unwrap()["distance"], 190_000.0);
    }

    #[test]
    fn test_sector_feature_rejects_negative_distance() {
        let err = sector_feature(27.0, -80.0, -1.0, 0.0, 90.0, None).unwrap_err();
        assert!(err.to_string().starts_with("Geometry error:"));
    }

    #[test]
    fn test_settings_to_options() {
        let settings = Settings {
            catalog: None,
            arc_points: Some(12.0),
            collision_policy: CollisionArg::Error,
            on_invalid_row: InvalidRowArg::Abort,
        };
        let options = settings.to_options().unwrap();
        assert_eq!(options.arc_points, Some(12.0));
        assert_eq!(options.collision_policy, CollisionPolicy::Error);
        assert_eq!(options.row_policy, RowErrorPolicy::Abort);
    }
}
