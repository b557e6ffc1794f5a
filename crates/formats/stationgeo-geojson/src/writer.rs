//! `GeoJSON` `FeatureCollection` writer.

use std::collections::BTreeMap;
use std::io::Write;

use geojson::{Geometry as GeoJsonGeometry, Value as GeoJsonValue};
use log::debug;
use serde_json::{Map, Value};
use stationgeo_core_common::error::{FormatError, FormatResult};
use stationgeo_core_common::feature::Feature;
use stationgeo_core_common::table::CellValue;

/// Options for `GeoJSON` writing
#[derive(Debug, Clone)]
pub struct GeoJsonWriterOptions {
    /// Lower-case property names (default: false, names are written verbatim)
    pub lowercase_property_names: bool,
    /// Two-space indented output (default: true)
    pub pretty: bool,
}

impl Default for GeoJsonWriterOptions {
    fn default() -> Self {
        Self {
            lowercase_property_names: false,
            pretty: true,
        }
    }
}

impl GeoJsonWriterOptions {
    /// Create new writer options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether property names are lower-cased
    #[must_use]
    pub fn with_lowercase_property_names(mut self, lowercase: bool) -> Self {
        self.lowercase_property_names = lowercase;
        self
    }

    /// Set pretty printing
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// JSON representation of a cell. Missing and non-finite values become `null`.
#[must_use]
pub fn cell_to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(v) => Value::from(*v),
        CellValue::Float(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
        CellValue::Str(s) => Value::String(s.clone()),
    }
}

/// Write features as a `FeatureCollection` followed by a newline.
///
/// # Errors
///
/// Returns [`FormatError::Io`] if writing fails and [`FormatError::Encode`]
/// if a geometry cannot be serialised.
pub fn write_feature_collection<W: Write>(
    mut writer: W,
    features: &[Feature],
    options: &GeoJsonWriterOptions,
) -> FormatResult<()> {
    let encoded = features
        .iter()
        .map(|feature| feature_to_json(feature, options))
        .collect::<FormatResult<Vec<_>>>()?;

    let mut collection = Map::new();
    collection.insert("type".to_string(), Value::from("FeatureCollection"));
    collection.insert("features".to_string(), Value::Array(encoded));
    let document = sort_keys(Value::Object(collection));

    if options.pretty {
        serde_json::to_writer_pretty(&mut writer, &document)
    } else {
        serde_json::to_writer(&mut writer, &document)
    }
    .map_err(json_error)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    debug!("Wrote {} GeoJSON features", features.len());
    Ok(())
}

/// Write features to an in-memory buffer.
///
/// # Errors
///
/// Returns an error if a geometry cannot be serialised.
pub fn write_feature_collection_to_bytes(
    features: &[Feature],
    options: &GeoJsonWriterOptions,
) -> FormatResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_feature_collection(&mut buffer, features, options)?;
    Ok(buffer)
}

fn feature_to_json(feature: &Feature, options: &GeoJsonWriterOptions) -> FormatResult<Value> {
    let geometry = GeoJsonGeometry::new(GeoJsonValue::from(&feature.geometry));
    let geometry = serde_json::to_value(&geometry).map_err(json_error)?;

    let properties: Map<String, Value> = feature
        .properties
        .iter()
        .map(|(name, value)| {
            let key = if options.lowercase_property_names {
                name.to_lowercase()
            } else {
                name.to_string()
            };
            (key, cell_to_json(value))
        })
        .collect();

    let mut object = Map::new();
    object.insert("type".to_string(), Value::from("Feature"));
    object.insert("geometry".to_string(), geometry);
    object.insert("properties".to_string(), Value::Object(properties));
    Ok(Value::Object(object))
}

// Rebuilds every object with its keys inserted in sorted order, which holds
// whether or not serde_json preserves insertion order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn json_error(err: serde_json::Error) -> FormatError {
    if err.is_io() {
        FormatError::from(std::io::Error::from(err))
    } else {
        FormatError::Encode {
            message: err.to_string(),
            context: Some("GeoJSON".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Point, Polygon};
    use stationgeo_core_common::feature::Properties;

    fn radar_point() -> Feature {
        let properties: Properties = vec![
            ("Status".to_string(), CellValue::from("Operational")),
            ("MHz".to_string(), CellValue::Float(5.0)),
            ("StartAngle".to_string(), CellValue::Null),
        ]
        .into_iter()
        .collect();
        Feature::new(Point::new(-80.0, 27.0), properties)
    }

    fn to_string(features: &[Feature], options: &GeoJsonWriterOptions) -> String {
        String::from_utf8(write_feature_collection_to_bytes(features, options).unwrap()).unwrap()
    }

    #[test]
    fn test_golden_point_collection() {
        let expected = r#"{
  "features": [
    {
      "geometry": {
        "coordinates": [
          -80.0,
          27.0
        ],
        "type": "Point"
      },
      "properties": {
        "MHz": 5.0,
        "StartAngle": null,
        "Status": "Operational"
      },
      "type": "Feature"
    }
  ],
  "type": "FeatureCollection"
}
"#;
        assert_eq!(to_string(&[radar_point()], &GeoJsonWriterOptions::default()), expected);
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(
            to_string(&[], &GeoJsonWriterOptions::default()),
            "{\n  \"features\": [],\n  \"type\": \"FeatureCollection\"\n}\n"
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let features = vec![radar_point(), radar_point()];
        let options = GeoJsonWriterOptions::default();
        assert_eq!(to_string(&features, &options), to_string(&features, &options));
    }

    #[test]
    fn test_lowercase_property_names() {
        let options = GeoJsonWriterOptions::new()
            .with_lowercase_property_names(true)
            .with_pretty(false);
        let text = to_string(&[radar_point()], &options);
        assert!(text.contains(r#""properties":{"mhz":5.0,"startangle":null,"status":"Operational"}"#));
    }

    #[test]
    fn test_polygon_and_line_geometries() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let features = vec![
            Feature::new(Polygon::new(ring.clone(), vec![]), Properties::new()),
            Feature::new(ring, Properties::new()),
        ];
        let value: Value = serde_json::from_slice(
            &write_feature_collection_to_bytes(&features, &GeoJsonWriterOptions::default())
                .unwrap(),
        )
        .unwrap();
        assert_eq!(value["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(value["features"][0]["geometry"]["coordinates"][0][2][1], 1.0);
        assert_eq!(value["features"][1]["geometry"]["type"], "LineString");
        assert_eq!(value["features"][1]["properties"], Value::Object(Map::new()));
    }

    #[test]
    fn test_cell_to_json() {
        assert_eq!(cell_to_json(&CellValue::Float(f64::NAN)), Value::Null);
        assert_eq!(cell_to_json(&CellValue::Int(3)), Value::from(3));
        assert_eq!(cell_to_json(&CellValue::Bool(true)), Value::Bool(true));
    }
}
