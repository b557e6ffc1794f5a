//! `GeoJSON` parsing helpers for feature inputs such as glider tracks.

use std::convert::TryInto;
use std::fmt;
use std::path::Path;

use geo_types::Geometry;
use geojson::{
    Feature, FeatureCollection, GeoJson, Geometry as GeoJsonGeometry, JsonObject, JsonValue,
};
use stationgeo_core_common::error::{FormatError, FormatResult, SourcePosition};
use stationgeo_core_common::table::CellValue;

/// Parsed `GeoJSON` feature with materialized properties and geometry.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    /// Raw feature properties
    pub properties: JsonObject,
    /// Feature geometry, if present
    pub geometry: Option<Geometry<f64>>,
}

/// Parse raw bytes into a vector of `FeatureRecord`s.
///
/// Accepts a `FeatureCollection`, a single `Feature`, a bare geometry, or one
/// of those per line.
///
/// # Errors
///
/// Returns [`FormatError::Parse`] when the bytes match none of the accepted shapes.
pub fn parse_geojson_bytes(
    bytes: &[u8],
    limit: Option<usize>,
    context: impl Into<String>,
) -> FormatResult<Vec<FeatureRecord>> {
    let context = context.into();
    let reader = std::io::Cursor::new(bytes);

    match GeoJson::from_reader(reader) {
        Ok(geojson) => geojson_to_records(geojson, limit, &context),
        Err(primary_err) => {
            let primary_err_message = primary_err.to_string();
            match parse_geojson_sequence(bytes, limit, &context) {
                Ok(records) => Ok(records),
                Err(sequence_err) => {
                    Err(combine_errors(&primary_err_message, &sequence_err, context))
                },
            }
        },
    }
}

/// Read every feature of a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`FormatError::Io`] if the file cannot be read, otherwise as
/// [`parse_geojson_bytes`].
pub fn read_features_file(path: impl AsRef<Path>) -> FormatResult<Vec<FeatureRecord>> {
    let path = path.as_ref();
    let context = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| FormatError::from(e).with_additional_context(&context))?;
    parse_geojson_bytes(&bytes, None, context)
}

/// Converts a JSON property value into a cell.
///
/// Arrays and objects are kept as their JSON text.
#[must_use]
pub fn json_to_cell(value: &JsonValue) -> CellValue {
    match value {
        JsonValue::Null => CellValue::Null,
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(CellValue::Int)
            .or_else(|| n.as_f64().map(CellValue::Float))
            .unwrap_or(CellValue::Null),
        JsonValue::String(s) => CellValue::Str(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => CellValue::Str(value.to_string()),
    }
}

fn geojson_to_records(
    geojson: GeoJson,
    limit: Option<usize>,
    context: &str,
) -> FormatResult<Vec<FeatureRecord>> {
    let mut records = match geojson {
        GeoJson::FeatureCollection(collection) => feature_collection_to_records(collection)?,
        GeoJson::Feature(feature) => vec![feature_to_record(feature)?],
        GeoJson::Geometry(geometry) => {
            let geometry = convert_geometry(geometry, context)?;
            vec![FeatureRecord {
                properties: JsonObject::new(),
                geometry: Some(geometry),
            }]
        },
    };

    if let Some(max) = limit
        && records.len() > max
    {
        records.truncate(max);
    }
    Ok(records)
}

fn feature_collection_to_records(collection: FeatureCollection) -> FormatResult<Vec<FeatureRecord>> {
    collection
        .features
        .into_iter()
        .map(feature_to_record)
        .collect()
}

fn feature_to_record(feature: Feature) -> FormatResult<FeatureRecord> {
    let geometry = match feature.geometry {
        Some(geometry) => Some(convert_geometry(geometry, "feature")?),
        None => None,
    };

    Ok(FeatureRecord {
        properties: feature.properties.unwrap_or_default(),
        geometry,
    })
}

fn convert_geometry(geometry: GeoJsonGeometry, context: &str) -> FormatResult<Geometry<f64>> {
    geometry.try_into().map_err(|err| FormatError::Parse {
        message: format!("Failed to convert GeoJSON geometry: {err}"),
        position: None,
        context: Some(context.to_string()),
    })
}

fn parse_geojson_sequence(
    bytes: &[u8],
    limit: Option<usize>,
    context: &str,
) -> FormatResult<Vec<FeatureRecord>> {
    let mut records = Vec::new();
    for (line_idx, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_number = (line_idx + 1) as u64;
        let position = SourcePosition {
            line: Some(line_number),
            ..SourcePosition::default()
        };
        let line = match std::str::from_utf8(raw_line) {
            Ok(line) => line.trim(),
            Err(err) => {
                return Err(FormatError::Parse {
                    message: format!("GeoJSON line is not valid UTF-8: {err}"),
                    position: Some(position),
                    context: Some(context.to_string()),
                });
            },
        };

        if line.is_empty() {
            continue;
        }

        let geojson = line.parse::<GeoJson>().map_err(|err| FormatError::Parse {
            message: format!("Failed to parse GeoJSON feature: {err}"),
            position: Some(position),
            context: Some(context.to_string()),
        })?;

        let mut parsed = geojson_to_records(geojson, None, context)?;
        records.append(&mut parsed);

        if let Some(max) = limit
            && records.len() >= max
        {
            records.truncate(max);
            break;
        }
    }

    if records.is_empty() {
        Err(FormatError::Parse {
            message: "No GeoJSON features found".to_string(),
            position: None,
            context: Some(context.to_string()),
        })
    } else {
        Ok(records)
    }
}

fn combine_errors(collection_err: &str, sequence_err: &FormatError, context: String) -> FormatError {
    let message = format!(
        "Failed to parse GeoJSON as FeatureCollection ({collection_err}); \
         also failed to parse as GeoJSON sequence: {sequence_err}"
    );
    FormatError::Parse {
        message,
        position: None,
        context: Some(context),
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geom = if self.geometry.is_some() {
            "Some(Geometry)"
        } else {
            "None"
        };
        write!(
            f,
            "FeatureRecord {{ geometry: {geom}, properties: {} }}",
            self.properties.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACKS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {"type": "LineString", "coordinates": [[-80.1, 30.2], [-80.3, 30.4]]},
      "properties": {"title": "ramses-20160909T2028", "id": 12, "institution": "UNCW"}
    },
    {
      "type": "Feature",
      "geometry": null,
      "properties": null
    }
  ]
}"#;

    #[test]
    fn test_parse_feature_collection() {
        let records = parse_geojson_bytes(TRACKS.as_bytes(), None, "tracks").unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].geometry, Some(Geometry::LineString(_))));
        assert_eq!(records[0].properties["title"], "ramses-20160909T2028");
        assert!(records[1].geometry.is_none());
        assert!(records[1].properties.is_empty());
    }

    #[test]
    fn test_limit() {
        let records = parse_geojson_bytes(TRACKS.as_bytes(), Some(1), "tracks").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_sequence() {
        let text = "{\"type\":\"Feature\",\"geometry\":{\"type\":\"Point\",\"coordinates\":[1,2]},\"properties\":{}}\n\n\
                    {\"type\":\"Point\",\"coordinates\":[3,4]}\n";
        let records = parse_geojson_bytes(text.as_bytes(), None, "seq").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_invalid_input_reports_both_attempts() {
        let err = parse_geojson_bytes(b"{\"type\": \"Nope\"}", None, "bad.geojson").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.geojson"));
        assert!(message.contains("also failed to parse as GeoJSON sequence"));
    }

    #[test]
    fn test_json_to_cell() {
        assert_eq!(json_to_cell(&JsonValue::from(12)), CellValue::Int(12));
        assert_eq!(json_to_cell(&JsonValue::from(1.5)), CellValue::Float(1.5));
        assert_eq!(json_to_cell(&JsonValue::Null), CellValue::Null);
        assert_eq!(
            json_to_cell(&serde_json::json!(["a", 1])),
            CellValue::from(r#"["a",1]"#)
        );
    }
}
