//! Radar coverage sectors built from great-circle projections.
//!
//! Station tables describe coverage with a *mathematical* start angle
//! (counter-clockwise from east), a spread angle and a range. The ring is
//! built by projecting points along WGS84 geodesics from the station:
//!
//! ```text
//! origin, start point, arc samples..., end point, origin
//! ```
//!
//! `arc_points` samples span `[start, start + spread)` at a step of
//! `spread / arc_points`; the end point closes the arc exactly at
//! `start + spread`.
//!
//! # Examples
//!
//! ```
//! use stationgeo_core::sector::Sector;
//! use stationgeo_core_common::GeoPoint;
//!
//! let origin = GeoPoint::new(27.0, -80.0).unwrap();
//! let polygon = Sector::new(origin, 190_000.0, 0.0, 90.0)
//!     .with_arc_points(Some(4.0))
//!     .polygon()
//!     .unwrap();
//! assert_eq!(polygon.exterior().0.len(), 8);
//! ```

use geo::GeodesicDestination;
use geo_types::{Coord, LineString, Point, Polygon};
use stationgeo_core_common::{CellValue, GeoPoint, GeometryError};

/// Arc samples used when none (or a non-numeric value) is given.
pub const DEFAULT_ARC_POINTS: f64 = 50.0;

/// Largest accepted arc resolution.
pub const MAX_ARC_POINTS: f64 = 10_000.0;

/// Wraps an angle into `[0, 360)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Converts a mathematical angle (counter-clockwise from east) into a compass azimuth.
#[must_use]
pub fn math_angle_to_azimuth(angle: f64) -> f64 {
    normalize_angle((360.0 - angle) + 90.0)
}

/// Converts a compass azimuth back into a mathematical angle.
#[must_use]
pub fn azimuth_to_math_angle(azimuth: f64) -> f64 {
    normalize_angle(450.0 - azimuth)
}

/// Reads an arc resolution from a table cell, falling back to [`DEFAULT_ARC_POINTS`].
#[must_use]
pub fn arc_points_from_cell(value: Option<&CellValue>) -> f64 {
    value
        .and_then(CellValue::as_f64)
        .unwrap_or(DEFAULT_ARC_POINTS)
}

/// Destination reached from `origin` along mathematical angle `angle` after `distance` metres.
#[must_use]
pub fn project(origin: GeoPoint, angle: f64, distance: f64) -> Coord<f64> {
    let start: Point<f64> = origin.into();
    start
        .geodesic_destination(math_angle_to_azimuth(angle), distance)
        .into()
}

/// Directional coverage parameters of one station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    /// Station position
    pub origin: GeoPoint,
    /// Start of the sector, mathematical angle in degrees
    pub start_angle: f64,
    /// Angular width in degrees; zero yields a degenerate ring
    pub spread_angle: f64,
    /// Radius in metres
    pub range_meters: f64,
    /// Tessellation resolution, used as a float step divisor
    pub arc_points: f64,
}

impl Sector {
    /// Creates a sector with the default arc resolution.
    #[must_use]
    pub fn new(origin: GeoPoint, range_meters: f64, start_angle: f64, spread_angle: f64) -> Self {
        Self {
            origin,
            start_angle,
            spread_angle,
            range_meters,
            arc_points: DEFAULT_ARC_POINTS,
        }
    }

    /// Set the arc resolution. `None` and NaN select [`DEFAULT_ARC_POINTS`].
    #[must_use]
    pub fn with_arc_points(mut self, arc_points: Option<f64>) -> Self {
        self.arc_points = arc_points
            .filter(|n| !n.is_nan())
            .unwrap_or(DEFAULT_ARC_POINTS);
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] for a negative or non-finite
    /// range, non-finite angles, or an arc resolution outside
    /// `1..=MAX_ARC_POINTS`.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.range_meters.is_finite() || self.range_meters < 0.0 {
            return Err(GeometryError::invalid(
                "distance",
                format!("{} m is not a finite, non-negative range", self.range_meters),
            ));
        }
        if !self.start_angle.is_finite() {
            return Err(GeometryError::invalid(
                "start angle",
                format!("{} is not finite", self.start_angle),
            ));
        }
        if !self.spread_angle.is_finite() {
            return Err(GeometryError::invalid(
                "spread angle",
                format!("{} is not finite", self.spread_angle),
            ));
        }
        if !self.arc_points.is_finite() || self.arc_points < 1.0 {
            return Err(GeometryError::invalid(
                "arc points",
                format!("{} is not a resolution of at least 1", self.arc_points),
            ));
        }
        if self.arc_points > MAX_ARC_POINTS {
            return Err(GeometryError::invalid(
                "arc points",
                format!("{} exceeds the maximum resolution of {MAX_ARC_POINTS}", self.arc_points),
            ));
        }
        Ok(())
    }

    /// Number of interior arc samples.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn arc_steps(&self) -> usize {
        self.arc_points.trunc() as usize
    }

    /// Returns `true` when the ring collapses onto the origin.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.spread_angle == 0.0 || self.range_meters == 0.0
    }

    /// Builds the closed ring.
    ///
    /// # Errors
    ///
    /// See [`Sector::validate`].
    #[allow(clippy::cast_precision_loss)]
    pub fn ring(&self) -> Result<LineString<f64>, GeometryError> {
        self.validate()?;

        let origin: Coord<f64> = Point::from(self.origin).into();
        let steps = self.arc_steps();
        let vertices = steps.checked_add(4).ok_or_else(|| {
            GeometryError::invalid("arc points", format!("{} is too large", self.arc_points))
        })?;

        if self.is_degenerate() {
            return Ok(LineString::new(vec![origin; vertices]));
        }

        let mut coords = Vec::with_capacity(vertices);
        coords.push(origin);
        coords.push(self.point_at(self.start_angle));

        let alpha = self.spread_angle / self.arc_points;
        coords.extend((0..steps).map(|j| self.point_at(self.start_angle + alpha * j as f64)));

        coords.push(self.point_at(self.start_angle + self.spread_angle));
        coords.push(origin);

        Ok(LineString::new(coords))
    }

    /// Builds the sector polygon (single outer ring, no holes).
    ///
    /// # Errors
    ///
    /// See [`Sector::validate`].
    pub fn polygon(&self) -> Result<Polygon<f64>, GeometryError> {
        Ok(Polygon::new(self.ring()?, vec![]))
    }

    fn point_at(&self, angle: f64) -> Coord<f64> {
        project(self.origin, angle, self.range_meters)
    }
}

/// Builds a sector polygon from raw station values.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidParameter`] for invalid coordinates or sector parameters.
pub fn wedge(
    distance: f64,
    angle: f64,
    theta: f64,
    latitude: f64,
    longitude: f64,
    arc_points: Option<f64>,
) -> Result<Polygon<f64>, GeometryError> {
    let origin = GeoPoint::new(latitude, longitude)?;
    Sector::new(origin, distance, angle, theta)
        .with_arc_points(arc_points)
        .polygon()
}

/// A ring of `vertices` copies of `origin`, used where a station has no sector.
#[must_use]
pub fn collapsed_polygon(origin: GeoPoint, vertices: usize) -> Polygon<f64> {
    let coord: Coord<f64> = Point::from(origin).into();
    Polygon::new(LineString::new(vec![coord; vertices.max(4)]), vec![])
}
