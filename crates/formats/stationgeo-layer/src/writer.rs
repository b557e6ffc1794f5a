//! Layer persistence: a WKT-geometry CSV file plus a schema sidecar.
//!
//! `<name>.csv` starts with a `geometry` column holding WKT, followed by one
//! column per schema field in schema order. `<name>.schema.json` records the
//! geometry kind and the ordered `[name, type]` field list.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use geozero::ToWkt;
use log::info;
use serde_json::{Value, json};
use stationgeo_core_common::error::{FormatError, FormatResult};

use crate::layer::ConstrainedLayer;

/// Options for layer writing
#[derive(Debug, Clone)]
pub struct LayerWriterOptions {
    /// Column delimiter of the data file (default: b',')
    pub delimiter: u8,
    /// Whether to write the `.schema.json` sidecar (default: true)
    pub write_schema: bool,
}

impl Default for LayerWriterOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            write_schema: true,
        }
    }
}

impl LayerWriterOptions {
    /// Create new writer options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set column delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the schema sidecar is written
    #[must_use]
    pub fn with_schema_sidecar(mut self, write_schema: bool) -> Self {
        self.write_schema = write_schema;
        self
    }
}

/// Paths written by [`write_layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFiles {
    /// The CSV data file
    pub data: PathBuf,
    /// The schema sidecar, when written
    pub schema: Option<PathBuf>,
}

/// Write the layer's records as CSV with a WKT geometry column.
///
/// Fields absent from a record are written as empty cells.
///
/// # Errors
///
/// Returns [`FormatError::Encode`] if a geometry cannot be rendered as WKT
/// and [`FormatError::Io`] if writing fails.
pub fn write_layer_csv<W: Write>(
    writer: W,
    layer: &ConstrainedLayer,
    options: &LayerWriterOptions,
) -> FormatResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let fields = layer.schema().fields();
    let header = std::iter::once("geometry").chain(fields.iter().map(|f| f.name.as_str()));
    csv_writer.write_record(header).map_err(csv_error)?;

    for (idx, record) in layer.records().iter().enumerate() {
        let wkt = record.geometry.to_wkt().map_err(|e| FormatError::Encode {
            message: format!("Failed to encode geometry as WKT: {e}"),
            context: Some(format!("record {}", idx + 1)),
        })?;
        let mut row = Vec::with_capacity(fields.len() + 1);
        row.push(wkt);
        row.extend(fields.iter().map(|field| {
            record
                .properties
                .get(&field.name)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        csv_writer.write_record(&row).map_err(csv_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// The schema sidecar document of a layer.
#[must_use]
pub fn schema_document(layer: &ConstrainedLayer) -> Value {
    let properties: Vec<Value> = layer
        .schema()
        .fields()
        .iter()
        .map(|field| json!([field.name, field.field_type.as_str()]))
        .collect();
    json!({
        "geometry": layer.geometry_kind().as_str(),
        "properties": properties,
    })
}

/// Write `<name>.csv` (and `<name>.schema.json`) into `directory`.
///
/// # Errors
///
/// Returns an error if a file cannot be created or written; the error
/// context names the file.
pub fn write_layer(
    directory: impl AsRef<Path>,
    name: &str,
    layer: &ConstrainedLayer,
    options: &LayerWriterOptions,
) -> FormatResult<LayerFiles> {
    let directory = directory.as_ref();
    let data = directory.join(format!("{name}.csv"));
    let file = File::create(&data).map_err(|e| with_path(e.into(), &data))?;
    write_layer_csv(BufWriter::new(file), layer, options).map_err(|e| with_path(e, &data))?;

    let schema = if options.write_schema {
        let path = directory.join(format!("{name}.schema.json"));
        let mut text = serde_json::to_string_pretty(&schema_document(layer)).map_err(|e| {
            FormatError::Encode {
                message: e.to_string(),
                context: Some(path.display().to_string()),
            }
        })?;
        text.push('\n');
        std::fs::write(&path, text).map_err(|e| with_path(e.into(), &path))?;
        Some(path)
    } else {
        None
    };

    info!(
        "Wrote {} {} records to {}",
        layer.len(),
        layer.geometry_kind(),
        data.display()
    );
    Ok(LayerFiles { data, schema })
}

fn with_path(err: FormatError, path: &Path) -> FormatError {
    err.with_additional_context(path.display().to_string())
}

fn csv_error(err: csv::Error) -> FormatError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => FormatError::from(source),
        _ => FormatError::Encode {
            message,
            context: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, LineString, Point, Polygon};
    use stationgeo_core_common::feature::{GeometryKind, Properties};
    use stationgeo_core_common::schema::{FieldType, PropertySchema};
    use stationgeo_core_common::table::CellValue;

    fn radar_layer() -> ConstrainedLayer {
        let mut schema = PropertySchema::new();
        schema.insert("status", FieldType::Str);
        schema.insert("mhz", FieldType::Float);
        schema.insert("sites", FieldType::Int);
        let mut layer = ConstrainedLayer::new(GeometryKind::Polygon, schema);
        let ring = LineString::from(vec![(-80.0, 27.0), (-79.0, 27.0), (-79.0, 28.0), (-80.0, 27.0)]);
        let properties: Properties = vec![
            ("status".to_string(), CellValue::from("Operational, seasonal")),
            ("mhz".to_string(), CellValue::Float(5.0)),
        ]
        .into_iter()
        .collect();
        layer
            .push(Geometry::Polygon(Polygon::new(ring, vec![])), properties)
            .unwrap();
        layer
    }

    #[test]
    fn test_csv_layout() {
        let mut buffer = Vec::new();
        write_layer_csv(&mut buffer, &radar_layer(), &LayerWriterOptions::default()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["geometry", "status", "mhz", "sites"]);

        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 1);
        assert!(records[0][0].starts_with("POLYGON"));
        assert_eq!(&records[0][1], "Operational, seasonal");
        assert_eq!(&records[0][2], "5.0");
        // absent field
        assert_eq!(&records[0][3], "");
    }

    #[test]
    fn test_schema_document() {
        assert_eq!(
            schema_document(&radar_layer()),
            json!({
                "geometry": "Polygon",
                "properties": [["status", "str"], ["mhz", "float"], ["sites", "int"]]
            })
        );
    }

    #[test]
    fn test_write_layer_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_layer(dir.path(), "hfradar", &radar_layer(), &LayerWriterOptions::default())
            .unwrap();
        assert_eq!(files.data, dir.path().join("hfradar.csv"));
        let schema_path = files.schema.unwrap();
        let schema: Value =
            serde_json::from_str(&std::fs::read_to_string(schema_path).unwrap()).unwrap();
        assert_eq!(schema["geometry"], "Polygon");
    }

    #[test]
    fn test_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut layer = ConstrainedLayer::new(GeometryKind::Point, PropertySchema::new());
        layer
            .push(Geometry::Point(Point::new(1.0, 2.0)), Properties::new())
            .unwrap();
        let options = LayerWriterOptions::new().with_schema_sidecar(false);
        let files = write_layer(dir.path(), "gliders", &layer, &options).unwrap();
        assert!(files.schema.is_none());
        assert!(!dir.path().join("gliders.schema.json").exists());
        let text = std::fs::read_to_string(files.data).unwrap();
        assert!(text.starts_with("geometry\n"));
    }

    #[test]
    fn test_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nested").join("deeper");
        let err = write_layer(&missing, "x", &radar_layer(), &LayerWriterOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("x.csv"));
    }
}
