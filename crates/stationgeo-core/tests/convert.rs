use std::fs;
use std::path::Path;

use serde_json::Value;
use stationgeo_core::error::{DatasetError, IoError};
use stationgeo_core::{ConvertOptions, StationGeoError, convert, find_dataset, inspect_dataset};
use stationgeo_core_common::schema::FieldType;

const HFRADAR_CSV: &str = "\
DisplayTitle,Latitude,Longitude,MHz,StartAngle,SpreadAngle,Status
Venice,27.07,-82.45,5,10,120,Operational
Naples,26.14,-81.80,12,,,Planned
";

const TRACKS_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {"type": "LineString", "coordinates": [[-80.1, 30.2], [-80.3, 30.4], [-80.5, 30.1]]},
      "properties": {"title": "ramses-20160909T2028", "institution": "UNCW", "comment": "x"}
    }
  ]
}"#;

fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_convert_hfradar() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "hfradar.csv", HFRADAR_CSV);
    let output_dir = dir.path().join("out");
    let dataset = find_dataset("hfradar").unwrap();

    let summary = convert(&input, &output_dir, &dataset, &ConvertOptions::default()).unwrap();
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.features_written, 3);
    assert_eq!(summary.layer_records, 2);
    assert_eq!(summary.skipped_rows, 0);
    assert_eq!(summary.geojson, output_dir.join("hfradar.geojson"));

    let document = read_json(&summary.geojson);
    assert_eq!(document["type"], "FeatureCollection");
    let features = document["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[0]["geometry"]["type"], "Point");
    assert_eq!(features[1]["geometry"]["type"], "Polygon");
    assert_eq!(features[1]["properties"]["popupContent"], "Venice (5 MHz)");
    assert_eq!(features[1]["properties"]["range"], 190_000.0);
    assert_eq!(features[2]["properties"]["StartAngle"], Value::Null);

    let files = summary.layer.unwrap();
    let data = fs::read_to_string(&files.data).unwrap();
    let mut lines = data.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("geometry,"));
    assert!(header.contains("displaytit"));
    assert!(header.contains("popupconte"));
    assert_eq!(lines.count(), 2);

    let schema = read_json(files.schema.as_ref().unwrap());
    assert_eq!(schema["geometry"], "Polygon");
    assert!(
        schema["properties"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!(["mhz", "int"]))
    );
}

#[test]
fn test_convert_without_layer_and_lowercase_keys() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "hfradar.csv", HFRADAR_CSV);
    let dataset = find_dataset("hfradar").unwrap();
    let options = ConvertOptions::new()
        .with_layer(false)
        .with_lowercase_property_names(true);

    let summary = convert(&input, dir.path(), &dataset, &options).unwrap();
    assert!(summary.layer.is_none());
    assert!(!dir.path().join("hfradar.schema.json").exists());

    let document = read_json(&summary.geojson);
    let properties = &document["features"][0]["properties"];
    assert_eq!(properties["displaytitle"], "Venice");
    assert!(properties.get("DisplayTitle").is_none());
}

#[test]
fn test_convert_glider_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "tracks.geojson", TRACKS_GEOJSON);
    let dataset = find_dataset("glider-tracks").unwrap();

    let summary = convert(&input, dir.path(), &dataset, &ConvertOptions::default()).unwrap();
    assert_eq!(summary.features_written, 1);
    assert_eq!(summary.schema_fields, 2);

    let document = read_json(&summary.geojson);
    let properties = document["features"][0]["properties"].as_object().unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties["institution"], "UNCW");

    let schema = read_json(summary.layer.unwrap().schema.as_ref().unwrap());
    assert_eq!(schema["geometry"], "LineString");
    assert_eq!(
        schema["properties"],
        serde_json::json!([["instituti", "str"], ["title", "str"]])
    );
}

#[test]
fn test_inspect_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "hfradar.csv", HFRADAR_CSV);
    let dataset = find_dataset("hfradar").unwrap();

    let report = inspect_dataset(&input, &dataset, &ConvertOptions::default()).unwrap();
    assert_eq!(report.schema.get("status_col"), Some(FieldType::Str));
    assert_eq!(report.schema.get("startangle"), Some(FieldType::Float));
    assert!(report.collisions.is_empty());
    // inspecting writes nothing
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = find_dataset("stations").unwrap();
    let err = convert(
        &dir.path().join("nope.csv"),
        dir.path(),
        &dataset,
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StationGeoError::Io(IoError::FileNotFound { .. })));
}

#[test]
fn test_input_format_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "tracks.geojson", TRACKS_GEOJSON);
    let dataset = find_dataset("gliders").unwrap();
    let err = convert(&input, dir.path(), &dataset, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        StationGeoError::Dataset(DatasetError::InputMismatch { .. })
    ));
    assert!(err.is_recoverable());
}
