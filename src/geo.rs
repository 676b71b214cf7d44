//! Distances between coordinates and map regions.

use crate::models::Coordinate;
use ::geo::{Distance, Geodesic, Point};

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

impl Coordinate {
    /// Geodesic distance to `other` on the WGS84 ellipsoid, in metres.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        Geodesic.distance(self.to_point(), other.to_point())
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Visible area of the map: a center plus north-south and east-west extents in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Coordinate,
    pub latitudinal_meters: f64,
    pub longitudinal_meters: f64,
}

impl Region {
    pub fn new(center: Coordinate, latitudinal_meters: f64, longitudinal_meters: f64) -> Self {
        Self {
            center,
            latitudinal_meters,
            longitudinal_meters,
        }
    }

    /// Square region with the same extent in both directions.
    pub fn square(center: Coordinate, meters: f64) -> Self {
        Self::new(center, meters, meters)
    }

    /// North-south extent in degrees.
    pub fn latitude_delta(&self) -> f64 {
        self.latitudinal_meters / METERS_PER_DEGREE_LAT
    }

    /// East-west extent in degrees, widened away from the equator.
    pub fn longitude_delta(&self) -> f64 {
        // Clamp so the poles do not divide by zero.
        let cos_lat = self.center.latitude.to_radians().cos().abs().max(0.01);
        self.longitudinal_meters / (METERS_PER_DEGREE_LAT * cos_lat)
    }
}
