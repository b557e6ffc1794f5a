//! Features: a geometry plus an ordered property map.

use std::fmt;

use geo_types::{Geometry, Point};

use crate::error::GeometryError;
use crate::table::CellValue;

/// Insertion-ordered property map with last-write-wins inserts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, CellValue)>);

impl Properties {
    /// Creates an empty property map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, CellValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

impl IntoIterator for Properties {
    type Item = (String, CellValue);
    type IntoIter = std::vec::IntoIter<(String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Replaces every missing value with integer zero.
///
/// Applied only on the way into the constrained artifact; the unconstrained
/// document keeps true nulls.
#[must_use]
pub fn fill_missing_with_zero(properties: &Properties) -> Properties {
    properties
        .iter()
        .map(|(k, v)| {
            let value = if v.is_missing() {
                CellValue::Int(0)
            } else {
                v.clone()
            };
            (k.to_string(), value)
        })
        .collect()
}

/// A validated geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] naming the bad coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeometryError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeometryError::invalid(
                "latitude",
                format!("{latitude} is not within [-90, 90]"),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeometryError::invalid(
                "longitude",
                format!("{longitude} is not within [-180, 180]"),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a point from two table cells.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] when a cell is missing or not numeric.
    pub fn from_cells(latitude: &CellValue, longitude: &CellValue) -> Result<Self, GeometryError> {
        let lat = latitude
            .as_f64()
            .ok_or_else(|| GeometryError::invalid("latitude", format!("'{latitude}' is not a number")))?;
        let lon = longitude.as_f64().ok_or_else(|| {
            GeometryError::invalid("longitude", format!("'{longitude}' is not a number"))
        })?;
        Self::new(lat, lon)
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

/// Geometry types a constrained layer can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Single positions
    Point,
    /// Polylines
    LineString,
    /// Single-ring polygons
    Polygon,
}

impl GeometryKind {
    /// Returns the string representation of this geometry kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
        }
    }

    /// Kind of a concrete geometry, if it is one of the supported kinds.
    #[must_use]
    pub fn of(geometry: &Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Point(_) => Some(GeometryKind::Point),
            Geometry::LineString(_) => Some(GeometryKind::LineString),
            Geometry::Polygon(_) => Some(GeometryKind::Polygon),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geometry with its raw (full-name) properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Geometry<f64>,
    /// Raw properties, names verbatim
    pub properties: Properties,
}

impl Feature {
    /// Creates a feature.
    pub fn new(geometry: impl Into<Geometry<f64>>, properties: Properties) -> Self {
        Self {
            geometry: geometry.into(),
            properties,
        }
    }
}
