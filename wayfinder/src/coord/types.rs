//! Coordinate value types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors produced when building or parsing coordinates and regions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid span: {latitude_delta}x{longitude_delta} (both deltas must be positive)")]
    InvalidSpan {
        latitude_delta: f64,
        longitude_delta: f64,
    },

    #[error("Cannot parse coordinate '{0}' (expected 'lat,lon')")]
    Parse(String),
}

/// A geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without range checks.
    ///
    /// Out-of-range values are a caller error; use [`Coordinate::try_new`]
    /// for input that has not been validated yet.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        let coord = Self::new(latitude, longitude);
        coord.validate()?;
        Ok(coord)
    }

    /// Check that both components are finite and within range.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !self.latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(CoordError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(CoordError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * super::EARTH_RADIUS_M * a.sqrt().asin()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = CoordError;

    /// Parses `"lat,lon"` (whitespace around either number is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordError::Parse(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordError::Parse(s.to_string()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| CoordError::Parse(s.to_string()))?;
        Coordinate::try_new(lat, lon)
    }
}

/// Angular extent of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// North-south extent in degrees.
    pub latitude_delta: f64,
    /// East-west extent in degrees.
    pub longitude_delta: f64,
}

impl Span {
    /// Create a span from degree deltas.
    pub const fn new(latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            latitude_delta,
            longitude_delta,
        }
    }
}

/// A map viewport or highlight extent: a center plus a positive span.
///
/// Regions are replaced wholesale; there are no field setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    center: Coordinate,
    span: Span,
}

impl Region {
    /// Create a region, rejecting non-positive spans.
    pub fn new(center: Coordinate, span: Span) -> Result<Self, CoordError> {
        let positive = |d: f64| d.is_finite() && d > 0.0;
        if !positive(span.latitude_delta) || !positive(span.longitude_delta) {
            return Err(CoordError::InvalidSpan {
                latitude_delta: span.latitude_delta,
                longitude_delta: span.longitude_delta,
            });
        }
        Ok(Self { center, span })
    }

    /// Create a region covering the given distances (in meters) around `center`.
    ///
    /// Longitude degrees shrink with latitude, so the east-west delta is
    /// scaled by `1 / cos(lat)`. Near the poles the delta is capped at 360°.
    pub fn from_meters(
        center: Coordinate,
        latitudinal_meters: f64,
        longitudinal_meters: f64,
    ) -> Result<Self, CoordError> {
        let latitude_delta = latitudinal_meters / super::METERS_PER_DEGREE;
        let cos_lat = center.latitude.to_radians().cos().abs();
        let longitude_delta = if cos_lat < f64::EPSILON {
            360.0
        } else {
            (longitudinal_meters / (super::METERS_PER_DEGREE * cos_lat)).min(360.0)
        };
        Self::new(center, Span::new(latitude_delta, longitude_delta))
    }

    /// Center of the region.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Angular extent of the region.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether `coord` falls inside the region's bounding box.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        let half_lat = self.span.latitude_delta / 2.0;
        let half_lon = self.span.longitude_delta / 2.0;
        (coord.latitude - self.center.latitude).abs() <= half_lat
            && (coord.longitude - self.center.longitude).abs() <= half_lon
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ±{:.4}°/{:.4}°",
            self.center,
            self.span.latitude_delta / 2.0,
            self.span.longitude_delta / 2.0
        )
    }
}
