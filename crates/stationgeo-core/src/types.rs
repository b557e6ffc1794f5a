//! Data types returned by the conversion pipelines.

use std::path::PathBuf;

use stationgeo_core_common::feature::Feature;
use stationgeo_core_common::schema::SchemaReport;
use stationgeo_layer::{ConstrainedLayer, LayerFiles};

/// An input row left out of both artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based data row (or feature) number
    pub row: usize,
    /// Why the row was dropped
    pub reason: String,
}

/// Everything a dataset pipeline produces, before any file is written.
#[derive(Debug, Clone)]
pub struct DatasetOutput {
    /// Unconstrained features with raw property names, in input order
    pub features: Vec<Feature>,
    /// Constrained layer with projected properties
    pub layer: ConstrainedLayer,
    /// Schema derivation details (collisions, dropped columns)
    pub report: SchemaReport,
    /// Rows dropped under the skip policy
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of a conversion run.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    /// Dataset short name
    pub dataset: String,
    /// Input path
    pub input: PathBuf,
    /// Rows (or features) read from the input
    pub rows_read: usize,
    /// Features in the `GeoJSON` artifact
    pub features_written: usize,
    /// Records in the constrained layer
    pub layer_records: usize,
    /// Rows dropped under the skip policy
    pub skipped_rows: usize,
    /// Fields in the constrained schema
    pub schema_fields: usize,
    /// Name collisions resolved while deriving the schema
    pub collisions: usize,
    /// Path of the `GeoJSON` artifact
    pub geojson: PathBuf,
    /// Paths of the layer files, when written
    pub layer: Option<LayerFiles>,
}
