//! Geofence geometry and execution windows
//!
//! Distances use the haversine formula on a spherical Earth. A cause may
//! declare a circular geofence and a time window; a proof submission is
//! checked against both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters used by the haversine formula
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Radius applied when a geofence is configured with a zero or negative radius
pub const DEFAULT_GEOFENCE_RADIUS_METERS: f64 = 200.0;

/// A coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_meters(*self, *other)
    }
}

/// Great-circle distance in meters between two points
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Circular area a submission must fall inside to be location-valid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// Configured radius, or [`DEFAULT_GEOFENCE_RADIUS_METERS`] when it is not positive
    pub fn effective_radius(&self) -> f64 {
        if self.radius_meters <= 0.0 {
            DEFAULT_GEOFENCE_RADIUS_METERS
        } else {
            self.radius_meters
        }
    }

    /// True when `point` lies on or inside the fence
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.center.distance_to(&point) <= self.effective_radius()
    }
}

/// Closed time interval during which a cause is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExecutionWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Both bounds are inclusive
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}
