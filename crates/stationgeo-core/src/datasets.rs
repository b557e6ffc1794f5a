//! Registry of the station metadata datasets `stationgeo` knows how to convert.
//!
//! Each dataset fixes its input format, the geometry kind of its constrained
//! layer, where positions are read from and how field names are cut down.
//!
//! # Examples
//!
//! ```
//! use stationgeo_core::datasets::{find_dataset, InputFormat};
//! use stationgeo_core_common::GeometryKind;
//!
//! let radar = find_dataset("HFRadar").expect("hfradar should exist");
//! assert_eq!(radar.input, InputFormat::Csv);
//! assert_eq!(radar.geometry, GeometryKind::Polygon);
//! ```

use std::fmt;

use stationgeo_core_common::GeometryKind;
use stationgeo_core_common::schema::{DEFAULT_MAX_NAME_LENGTH, NameRule};

/// Conversion pipeline selected by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// HF radar sites with coverage sectors
    HfRadar,
    /// Planned and operational observing stations
    Stations,
    /// Glider operator summary
    Gliders,
    /// Regional association station/sensor inventory
    RegionalStations,
    /// Glider deployment tracks
    GliderTracks,
}

/// Input format a dataset is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma separated table with a header row
    Csv,
    /// `GeoJSON` features
    GeoJson,
}

impl InputFormat {
    /// Returns the string representation of this input format.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "CSV",
            InputFormat::GeoJson => "GeoJSON",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latitude/longitude column names of a tabular dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionColumns {
    /// Latitude column
    pub latitude: &'static str,
    /// Longitude column
    pub longitude: &'static str,
}

const LAT_LON: PositionColumns = PositionColumns {
    latitude: "Latitude",
    longitude: "Longitude",
};

const LAT_LON_DEGREES: PositionColumns = PositionColumns {
    latitude: "latitude (degree)",
    longitude: "longitude (degree)",
};

/// Dataset definition.
#[derive(Debug, Clone, Copy)]
pub struct Dataset {
    /// Short name used in the CLI and as the output file stem
    pub short_name: &'static str,
    /// Descriptive name for display purposes
    pub long_name: &'static str,
    /// Pipeline to run
    pub kind: DatasetKind,
    /// Expected input format
    pub input: InputFormat,
    /// Geometry kind of the constrained layer
    pub geometry: GeometryKind,
    /// Position columns; `None` when geometries come from the input itself
    pub position: Option<PositionColumns>,
    /// Field naming rule of the constrained layer
    pub name_rule: NameRule,
}

impl Dataset {
    /// Creates a new dataset definition.
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        kind: DatasetKind,
        input: InputFormat,
        geometry: GeometryKind,
        position: Option<PositionColumns>,
        name_rule: NameRule,
    ) -> Self {
        Self {
            short_name,
            long_name,
            kind,
            input,
            geometry,
            position,
            name_rule,
        }
    }
}

/// Returns every registered dataset.
#[must_use]
pub fn get_datasets() -> Vec<Dataset> {
    let shapefile_names = NameRule::new(DEFAULT_MAX_NAME_LENGTH);

    vec![
        Dataset::new(
            "hfradar",
            "HF radar sites with coverage sectors",
            DatasetKind::HfRadar,
            InputFormat::Csv,
            GeometryKind::Polygon,
            Some(LAT_LON),
            shapefile_names,
        ),
        Dataset::new(
            "stations",
            "Observing stations by status and platform",
            DatasetKind::Stations,
            InputFormat::Csv,
            GeometryKind::Point,
            Some(LAT_LON),
            shapefile_names,
        ),
        Dataset::new(
            "gliders",
            "Glider operators",
            DatasetKind::Gliders,
            InputFormat::Csv,
            GeometryKind::Point,
            Some(LAT_LON),
            shapefile_names,
        ),
        Dataset::new(
            "regional-stations",
            "Regional station and sensor inventory",
            DatasetKind::RegionalStations,
            InputFormat::Csv,
            GeometryKind::Point,
            Some(LAT_LON_DEGREES),
            shapefile_names,
        ),
        Dataset::new(
            "glider-tracks",
            "Glider deployment tracks",
            DatasetKind::GliderTracks,
            InputFormat::GeoJson,
            GeometryKind::LineString,
            None,
            NameRule::preserving_case(9),
        ),
    ]
}

/// Finds a dataset by its short name (case-insensitive).
#[must_use]
pub fn find_dataset(name: &str) -> Option<Dataset> {
    get_datasets()
        .into_iter()
        .find(|d| d.short_name.eq_ignore_ascii_case(name))
}

/// Returns all dataset short names in alphabetically sorted order.
#[must_use]
pub fn get_dataset_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_datasets().iter().map(|d| d.short_name).collect();
    names.sort_unstable();
    names
}
