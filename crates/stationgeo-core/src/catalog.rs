//! Lookup tables used to decorate station features.
//!
//! The tables are plain immutable configuration: the defaults reproduce the
//! SECOORA station metadata conventions and a JSON file can override any of
//! them. A [`Catalog`] is passed by reference into the pipelines.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

const ICON_BASE_URL: &str = "https://raw.githubusercontent.com/secoora/static_assets/master/icons/";

/// Station decoration and filtering tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Station status to marker colour
    pub status_colors: BTreeMap<String, String>,
    /// Platform type to icon stem
    pub platform_icons: BTreeMap<String, String>,
    /// HF radar transmit frequency (whole MHz) to nominal range in kilometres
    pub radar_ranges_km: BTreeMap<i64, f64>,
    /// Prefix joined to every icon file name
    pub icon_base_url: String,
    /// HF radar icon file name; `{status}` is replaced by the colour
    pub radar_icon_template: String,
    /// Station icon file name; `{platform}` and `{status}` are replaced
    pub station_icon_template: String,
    /// Icon used for every glider deployment
    pub glider_icon: String,
    /// Sensor identifiers whose rows are dropped from regional station tables
    pub ignored_sensors: Vec<String>,
    /// Track properties kept in glider track outputs
    pub track_properties: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let strings = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            status_colors: strings(&[
                ("Planned", "orange"),
                ("Operational", "green"),
                ("Permitting", "yellow"),
                ("Construction", "yellow"),
                ("Decommissioned", "red"),
            ]),
            platform_icons: strings(&[
                ("Fixed Surface Buoy", "buoy"),
                ("Fixed Bottom Station", "circ"),
                ("Fixed Bottom Mount Mooring", "tri"),
                ("Fixed Coastal Station", "shore_station"),
            ]),
            radar_ranges_km: BTreeMap::from([(5, 190.0), (8, 160.0), (12, 130.0), (16, 100.0)]),
            icon_base_url: ICON_BASE_URL.to_string(),
            radar_icon_template: "hfradar-{status}.png".to_string(),
            station_icon_template: "{platform}-{status}.png".to_string(),
            glider_icon: format!("{ICON_BASE_URL}slocum-default.png"),
            ignored_sensors: [
                "tide_predictions",
                "stream_flow",
                "stream_height",
                "gov.usgs.waterdata",
            ]
            .map(String::from)
            .to_vec(),
            track_properties: [
                "contributor_name",
                "platform_type",
                "vessel_name",
                "institution",
                "naming_authority",
                "id",
                "title",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl Catalog {
    /// Loads a catalog from a JSON file. Absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            crate::error::StationGeoError::Config(ConfigError::Load { message, .. }) => {
                ConfigError::Load {
                    path: path.to_path_buf(),
                    message,
                }
                .into()
            },
            other => other,
        })
    }

    /// Parses a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when the text is not a valid catalog.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            ConfigError::Load {
                path: "<inline>".into(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Marker colour for a station status.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLookup`] for unknown statuses.
    pub fn status_color(&self, status: &str) -> Result<&str> {
        lookup(&self.status_colors, "status_colors", status)
    }

    /// Icon stem for a platform type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLookup`] for unknown platform types.
    pub fn platform_icon(&self, platform: &str) -> Result<&str> {
        lookup(&self.platform_icons, "platform_icons", platform)
    }

    /// Nominal radar range in metres for a transmit frequency.
    ///
    /// The frequency is truncated to whole MHz; unknown or missing
    /// frequencies have zero range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn radar_range_meters(&self, mhz: Option<f64>) -> f64 {
        mhz.filter(|f| f.is_finite())
            .and_then(|f| self.radar_ranges_km.get(&(f.trunc() as i64)))
            .map_or(0.0, |km| km * 1000.0)
    }

    /// Full URL of an HF radar icon.
    #[must_use]
    pub fn radar_icon(&self, status_color: &str) -> String {
        format!(
            "{}{}",
            self.icon_base_url,
            self.radar_icon_template.replace("{status}", status_color)
        )
    }

    /// Full URL of a station icon.
    #[must_use]
    pub fn station_icon(&self, platform_icon: &str, status_color: &str) -> String {
        format!(
            "{}{}",
            self.icon_base_url,
            self.station_icon_template
                .replace("{platform}", platform_icon)
                .replace("{status}", status_color)
        )
    }

    /// Returns `true` when a sensor identifier matches an ignored sensor.
    #[must_use]
    pub fn is_ignored_sensor(&self, sensor: &str) -> bool {
        self.ignored_sensors
            .iter()
            .any(|v| sensor.contains(&format!(":{v}")))
    }
}

fn lookup<'a>(table: &'a BTreeMap<String, String>, name: &str, key: &str) -> Result<&'a str> {
    table.get(key).map(String::as_str).ok_or_else(|| {
        ConfigError::MissingLookup {
            table: name.to_string(),
            key: key.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StationGeoError;

    #[test]
    fn test_default_lookups() {
        let catalog = Catalog::default();
        assert_eq!(catalog.status_color("Operational").unwrap(), "green");
        assert_eq!(catalog.platform_icon("Fixed Surface Buoy").unwrap(), "buoy");
        assert_eq!(
            catalog.radar_icon("green"),
            "https://raw.githubusercontent.com/secoora/static_assets/master/icons/hfradar-green.png"
        );
        assert_eq!(
            catalog.station_icon("buoy", "red"),
            "https://raw.githubusercontent.com/secoora/static_assets/master/icons/buoy-red.png"
        );
    }

    #[test]
    fn test_unknown_status_is_config_error() {
        let err = Catalog::default().status_color("Retired").unwrap_err();
        assert!(matches!(
            err,
            StationGeoError::Config(ConfigError::MissingLookup { ref key, .. }) if key == "Retired"
        ));
    }

    #[test]
    fn test_radar_range() {
        let catalog = Catalog::default();
        assert_eq!(catalog.radar_range_meters(Some(5.0)), 190_000.0);
        assert_eq!(catalog.radar_range_meters(Some(12.6)), 130_000.0);
        assert_eq!(catalog.radar_range_meters(Some(25.0)), 0.0);
        assert_eq!(catalog.radar_range_meters(None), 0.0);
        assert_eq!(catalog.radar_range_meters(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_ignored_sensors() {
        let catalog = Catalog::default();
        assert!(catalog.is_ignored_sensor("urn:ioos:sensor:wmo:41009:tide_predictions"));
        assert!(!catalog.is_ignored_sensor("urn:ioos:sensor:wmo:41009:sea_water_temperature"));
        // the identifier must follow a separator
        assert!(!catalog.is_ignored_sensor("stream_flow"));
    }

    #[test]
    fn test_partial_json_override() {
        let catalog = Catalog::from_json(
            r#"{"status_colors": {"Operational": "blue"}, "radar_ranges_km": {"25": 35.0}}"#,
        )
        .unwrap();
        assert_eq!(catalog.status_color("Operational").unwrap(), "blue");
        assert!(catalog.status_color("Planned").is_err());
        assert_eq!(catalog.radar_range_meters(Some(25.0)), 35_000.0);
        // untouched keys keep their defaults
        assert_eq!(catalog.platform_icon("Fixed Surface Buoy").unwrap(), "buoy");
    }

    #[test]
    fn test_invalid_json() {
        assert!(Catalog::from_json("{not json").is_err());
    }

    #[test]
    fn test_from_path_reports_path() {
        let err = Catalog::from_path("/nonexistent/catalog.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }
}
