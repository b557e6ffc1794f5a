//! Conversion pipelines for station metadata datasets.
//!
//! [`build_dataset`] and [`build_track_dataset`] are pure: they turn an
//! in-memory table (or track features) into the unconstrained features and
//! the constrained layer. [`convert`] wraps them with reading the input and
//! writing both artifacts.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geo_types::{Geometry, Point};
use log::{debug, info, warn};
use stationgeo_core_common::error::{GeometryError, TableError};
use stationgeo_core_common::feature::{Feature, GeoPoint, GeometryKind, Properties};
use stationgeo_core_common::schema::{CollisionPolicy, SchemaProjector, SchemaReport};
use stationgeo_core_common::table::{CellValue, Column, ColumnType, Row, Table};
use stationgeo_csv::{CsvReaderOptions, read_table_file};
use stationgeo_geojson::{
    FeatureRecord, GeoJsonWriterOptions, json_to_cell, read_features_file,
    write_feature_collection,
};
use stationgeo_layer::{ConstrainedLayer, LayerWriterOptions, write_layer};

use crate::catalog::Catalog;
use crate::datasets::{Dataset, DatasetKind, InputFormat};
use crate::error::{ConfigError, DatasetError, IoError, IoErrorExt, Result};
use crate::sector::{Sector, arc_points_from_cell, collapsed_polygon};
use crate::types::{ConversionSummary, DatasetOutput, SkippedRow};

/// Optional per-row arc resolution column of HF radar tables.
pub const ARC_POINTS_COLUMN: &str = "ArcPoints";

/// What to do with a row whose geometry cannot be built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowErrorPolicy {
    /// Drop the row from both artifacts and log a warning
    #[default]
    Skip,
    /// Fail the whole run
    Abort,
}

impl RowErrorPolicy {
    /// Returns the string representation of this policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RowErrorPolicy::Skip => "skip",
            RowErrorPolicy::Abort => "abort",
        }
    }
}

/// Options for dataset conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Lookup tables (default: built-in SECOORA tables)
    pub catalog: Catalog,
    /// Arc resolution for every sector; `None` reads [`ARC_POINTS_COLUMN`] or uses 50
    pub arc_points: Option<f64>,
    /// Name collision handling (default: warn)
    pub collision_policy: CollisionPolicy,
    /// Bad row handling (default: skip)
    pub row_policy: RowErrorPolicy,
    /// Lower-case `GeoJSON` property names (default: false)
    pub lowercase_property_names: bool,
    /// Write the constrained layer files (default: true)
    pub write_layer: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            catalog: Catalog::default(),
            arc_points: None,
            collision_policy: CollisionPolicy::default(),
            row_policy: RowErrorPolicy::default(),
            lowercase_property_names: false,
            write_layer: true,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lookup catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set a fixed arc resolution for every sector
    #[must_use]
    pub fn with_arc_points(mut self, arc_points: f64) -> Self {
        self.arc_points = Some(arc_points);
        self
    }

    /// Set the name collision policy
    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the bad row policy
    #[must_use]
    pub fn with_row_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    /// Set whether `GeoJSON` property names are lower-cased
    #[must_use]
    pub fn with_lowercase_property_names(mut self, lowercase: bool) -> Self {
        self.lowercase_property_names = lowercase;
        self
    }

    /// Set whether the constrained layer is written
    #[must_use]
    pub fn with_layer(mut self, write_layer: bool) -> Self {
        self.write_layer = write_layer;
        self
    }

    /// Schema projector for `dataset` under these options.
    #[must_use]
    pub fn projector(&self, dataset: &Dataset) -> SchemaProjector {
        SchemaProjector::new(dataset.name_rule).with_policy(self.collision_policy)
    }
}

/// Adds the computed columns of a tabular dataset and drops filtered rows.
///
/// # Errors
///
/// Returns [`TableError::MissingColumn`] when a column the dataset needs is
/// absent and [`ConfigError::MissingLookup`] for statuses or platform types
/// the catalog does not know.
pub fn decorate_table(table: &Table, dataset: &Dataset, catalog: &Catalog) -> Result<Table> {
    match dataset.kind {
        DatasetKind::HfRadar => table
            .derive_column("range", ColumnType::Float, |row| radar_range(row, catalog))?
            .derive_column("status_color", ColumnType::String, |row| status_color(row, catalog))?
            .derive_column("icon", ColumnType::String, |row| radar_icon(row, catalog))?
            .derive_column("popupContent", ColumnType::String, radar_popup),
        DatasetKind::Stations => {
            let decorated = table
                .derive_column("status_color", ColumnType::String, |row| status_color(row, catalog))?
                .derive_column("platform_icon", ColumnType::String, |row| {
                    platform_icon(row, catalog)
                })?;
            let description = require_column(&decorated, "LocationDescription")?;
            let popup = Column {
                name: "popupContent".to_string(),
                ..description.clone()
            };
            decorated
                .with_column(popup)?
                .derive_column("icon", ColumnType::String, |row| station_icon(row, catalog))
        },
        DatasetKind::Gliders => {
            let decorated = table.derive_column("popupContent", ColumnType::String, glider_popup)?;
            let icon = Column::new(
                "icon",
                ColumnType::String,
                vec![catalog.glider_icon.as_str(); decorated.num_rows()],
            );
            Ok(decorated.with_column(icon)?)
        },
        DatasetKind::RegionalStations => {
            require_column(table, "sensor")?;
            let filtered = table.filter_rows(|row| {
                !row.get("sensor")
                    .and_then(CellValue::as_str)
                    .is_some_and(|sensor| catalog.is_ignored_sensor(sensor))
            });
            info!(
                "Dropped {} rows with ignored sensors",
                table.num_rows() - filtered.num_rows()
            );
            Ok(filtered)
        },
        DatasetKind::GliderTracks => Ok(table.clone()),
    }
}

/// Builds both artifacts of a tabular dataset.
///
/// Rows are processed in order. A row whose position or sector is invalid
/// follows [`ConvertOptions::row_policy`].
///
/// # Errors
///
/// Returns an error for non-tabular datasets, missing columns, unknown lookup
/// keys, a collision under [`CollisionPolicy::Error`], or the first invalid
/// row under [`RowErrorPolicy::Abort`].
pub fn build_dataset(
    table: &Table,
    dataset: &Dataset,
    options: &ConvertOptions,
) -> Result<DatasetOutput> {
    let position = match (dataset.input, dataset.position) {
        (InputFormat::Csv, Some(position)) => position,
        _ => {
            return Err(ConfigError::InvalidOption {
                option: "dataset".to_string(),
                message: format!(
                    "'{}' reads {} features, not a table",
                    dataset.short_name, dataset.input
                ),
            }
            .into());
        },
    };

    let decorated = decorate_table(table, dataset, &options.catalog)?;
    let projector = options.projector(dataset);
    let schema = projector.infer_schema(decorated.columns())?;
    let report = projector.inspect(decorated.columns());

    let mut features = Vec::with_capacity(decorated.num_rows());
    let mut constrained = Vec::with_capacity(decorated.num_rows());
    let mut skipped = Vec::new();

    for row in decorated.rows() {
        let origin = GeoPoint::from_cells(
            row.require(position.latitude)?,
            row.require(position.longitude)?,
        );
        let built = origin.and_then(|origin| station_features(&row, origin, dataset.kind, options));
        let Some((mut unconstrained, layer_feature)) =
            isolate(options.row_policy, row.index() + 1, built, &mut skipped)?
        else {
            continue;
        };
        features.append(&mut unconstrained);
        constrained.push(layer_feature);
    }

    let layer = ConstrainedLayer::build(dataset.geometry, schema, &constrained, &projector)?;
    debug!(
        "{}: {} features, {} layer records, {} rows skipped",
        dataset.short_name,
        features.len(),
        layer.len(),
        skipped.len()
    );

    Ok(DatasetOutput {
        features,
        layer,
        report,
        skipped,
    })
}

/// Builds both artifacts of a track dataset from parsed features.
///
/// Properties are restricted to the catalog's track property list; every
/// constrained field is text.
///
/// # Errors
///
/// Returns an error for a collision under [`CollisionPolicy::Error`] or the
/// first feature without a track geometry under [`RowErrorPolicy::Abort`].
pub fn build_track_dataset(
    records: &[FeatureRecord],
    dataset: &Dataset,
    options: &ConvertOptions,
) -> Result<DatasetOutput> {
    let allowed = &options.catalog.track_properties;
    let mut tracks = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        let geometry = track_geometry(record, dataset.geometry);
        let Some(geometry) = isolate(options.row_policy, idx + 1, geometry, &mut skipped)? else {
            continue;
        };
        let properties: Properties = allowed
            .iter()
            .filter_map(|key| {
                record
                    .properties
                    .get(key)
                    .map(|value| (key.clone(), json_to_cell(value)))
            })
            .collect();
        tracks.push(Feature::new(geometry, properties));
    }

    let columns = track_columns(&tracks, allowed);
    let projector = options.projector(dataset);
    let schema = projector.infer_schema(&columns)?;
    let report = projector.inspect(&columns);
    let layer = ConstrainedLayer::build(dataset.geometry, schema, &tracks, &projector)?;

    Ok(DatasetOutput {
        features: tracks,
        layer,
        report,
        skipped,
    })
}

/// Reads `input` and reports the constrained schema the dataset would get.
///
/// # Errors
///
/// Returns an error if the input cannot be read or decorated.
pub fn inspect_dataset(
    input: &Path,
    dataset: &Dataset,
    options: &ConvertOptions,
) -> Result<SchemaReport> {
    check_input(input, dataset)?;
    match dataset.input {
        InputFormat::Csv => {
            let table = read_table_file(input, &CsvReaderOptions::default())?;
            let decorated = decorate_table(&table, dataset, &options.catalog)?;
            Ok(options.projector(dataset).inspect(decorated.columns()))
        },
        InputFormat::GeoJson => {
            let records = read_features_file(input)?;
            let inspect_options = options
                .clone()
                .with_collision_policy(CollisionPolicy::LastWriteWins);
            Ok(build_track_dataset(&records, dataset, &inspect_options)?.report)
        },
    }
}

/// Converts one input file into `<name>.geojson` and the constrained layer
/// files inside `output_dir`.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the dataset cannot be built,
/// or an artifact cannot be written.
pub fn convert(
    input: &Path,
    output_dir: &Path,
    dataset: &Dataset,
    options: &ConvertOptions,
) -> Result<ConversionSummary> {
    info!("Starting conversion:");
    info!("Input: {} (Dataset: {})", input.display(), dataset.short_name);
    info!("Output directory: {}", output_dir.display());

    check_input(input, dataset)?;

    let (rows_read, output) = match dataset.input {
        InputFormat::Csv => {
            info!("Reading CSV file: {}", input.display());
            let table = read_table_file(input, &CsvReaderOptions::default())?;
            (table.num_rows(), build_dataset(&table, dataset, options)?)
        },
        InputFormat::GeoJson => {
            info!("Reading GeoJSON file: {}", input.display());
            let records = read_features_file(input)?;
            (records.len(), build_track_dataset(&records, dataset, options)?)
        },
    };
    info!("Total rows: {rows_read}");

    std::fs::create_dir_all(output_dir).with_write_context("output", output_dir)?;

    let geojson = output_dir.join(format!("{}.geojson", dataset.short_name));
    info!("Writing GeoJSON file: {}", geojson.display());
    let file = File::create(&geojson).with_write_context("GeoJSON", &geojson)?;
    let writer_options =
        GeoJsonWriterOptions::new().with_lowercase_property_names(options.lowercase_property_names);
    write_feature_collection(BufWriter::new(file), &output.features, &writer_options)
        .with_write_context("GeoJSON", &geojson)?;

    let layer = if options.write_layer {
        Some(write_layer(
            output_dir,
            dataset.short_name,
            &output.layer,
            &LayerWriterOptions::default(),
        )?)
    } else {
        None
    };

    info!("Conversion completed successfully");
    Ok(ConversionSummary {
        dataset: dataset.short_name.to_string(),
        input: input.to_path_buf(),
        rows_read,
        features_written: output.features.len(),
        layer_records: output.layer.len(),
        skipped_rows: output.skipped.len(),
        schema_fields: output.layer.schema().len(),
        collisions: output.report.collisions.len(),
        geojson,
        layer,
    })
}

fn check_input(input: &Path, dataset: &Dataset) -> Result<()> {
    if !input.exists() {
        return Err(IoError::FileNotFound {
            path: input.to_path_buf(),
        }
        .into());
    }
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mismatch = match (dataset.input, extension.as_deref()) {
        (InputFormat::Csv, Some("geojson" | "json")) => true,
        (InputFormat::GeoJson, Some("csv")) => true,
        _ => false,
    };
    if mismatch {
        return Err(DatasetError::InputMismatch {
            dataset: dataset.short_name.to_string(),
            expected: dataset.input.to_string(),
            path: input.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

fn isolate<T>(
    policy: RowErrorPolicy,
    row: usize,
    result: std::result::Result<T, GeometryError>,
    skipped: &mut Vec<SkippedRow>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match policy {
            RowErrorPolicy::Abort => Err(err.into()),
            RowErrorPolicy::Skip => {
                warn!("Skipping row {row}: {err}");
                skipped.push(SkippedRow {
                    row,
                    reason: err.to_string(),
                });
                Ok(None)
            },
        },
    }
}

/// Unconstrained features and the constrained-layer feature of one station row.
fn station_features(
    row: &Row<'_>,
    origin: GeoPoint,
    kind: DatasetKind,
    options: &ConvertOptions,
) -> std::result::Result<(Vec<Feature>, Feature), GeometryError> {
    let properties = row.to_properties();
    let point = Feature::new(Point::from(origin), properties.clone());
    if kind != DatasetKind::HfRadar {
        return Ok((vec![point.clone()], point));
    }

    match (number(row, "StartAngle"), number(row, "SpreadAngle")) {
        (Some(start), Some(spread)) => {
            let range = number(row, "range").unwrap_or(0.0);
            let arc_points = options
                .arc_points
                .unwrap_or_else(|| arc_points_from_cell(row.get(ARC_POINTS_COLUMN)));
            let polygon = Sector::new(origin, range, start, spread)
                .with_arc_points(Some(arc_points))
                .polygon()?;
            let wedge = Feature::new(polygon, properties);
            Ok((vec![point, wedge.clone()], wedge))
        },
        _ => Ok((
            vec![point],
            Feature::new(collapsed_polygon(origin, 4), properties),
        )),
    }
}

fn track_geometry(
    record: &FeatureRecord,
    kind: GeometryKind,
) -> std::result::Result<Geometry<f64>, GeometryError> {
    match &record.geometry {
        None => Err(GeometryError::invalid("geometry", "feature has no geometry")),
        Some(geometry) if GeometryKind::of(geometry) == Some(kind) => Ok(geometry.clone()),
        Some(geometry) => Err(GeometryError::invalid(
            "geometry",
            format!(
                "expected {kind}, got {}",
                GeometryKind::of(geometry).map_or("an unsupported geometry type", |k| k.as_str())
            ),
        )),
    }
}

/// Text columns for every allowed property present on at least one track.
fn track_columns(tracks: &[Feature], allowed: &[String]) -> Vec<Column> {
    allowed
        .iter()
        .filter(|key| tracks.iter().any(|t| t.properties.contains_key(key)))
        .map(|key| {
            Column::new(
                key.clone(),
                ColumnType::String,
                tracks
                    .iter()
                    .map(|t| t.properties.get(key).cloned().unwrap_or(CellValue::Null)),
            )
        })
        .collect()
}

fn require_column<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    table.column(name).ok_or_else(|| {
        TableError::MissingColumn {
            column: name.to_string(),
        }
        .into()
    })
}

fn text(row: &Row<'_>, name: &str) -> Result<String> {
    Ok(row.require(name)?.to_string())
}

fn number(row: &Row<'_>, name: &str) -> Option<f64> {
    row.get(name).and_then(CellValue::as_f64)
}

fn radar_range(row: &Row<'_>, catalog: &Catalog) -> Result<CellValue> {
    let mhz = row.require("MHz")?.as_f64();
    Ok(CellValue::Float(catalog.radar_range_meters(mhz)))
}

fn status_color(row: &Row<'_>, catalog: &Catalog) -> Result<CellValue> {
    let status = text(row, "Status")?;
    Ok(catalog.status_color(&status)?.into())
}

fn platform_icon(row: &Row<'_>, catalog: &Catalog) -> Result<CellValue> {
    let platform = text(row, "PlatformType")?;
    Ok(catalog.platform_icon(&platform)?.into())
}

fn radar_icon(row: &Row<'_>, catalog: &Catalog) -> Result<CellValue> {
    Ok(catalog.radar_icon(&text(row, "status_color")?).into())
}

fn station_icon(row: &Row<'_>, catalog: &Catalog) -> Result<CellValue> {
    let icon = catalog.station_icon(&text(row, "platform_icon")?, &text(row, "status_color")?);
    Ok(icon.into())
}

fn radar_popup(row: &Row<'_>) -> Result<CellValue> {
    let title = row.require("DisplayTitle")?;
    let mhz = row.require("MHz")?;
    Ok(format!("{title} ({mhz} MHz)").into())
}

fn glider_popup(row: &Row<'_>) -> Result<CellValue> {
    let party = row.require("Responsible Party")?;
    let gliders = row.require("Number of gliders")?;
    Ok(format!("{party} ({gliders})").into())
}
