//! Utility functions for geodesic distances and timestamp conversion

use chrono::{DateTime, Utc};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Great-circle distance between two points given in radians, in meters
///
/// Uses the Haversine formula on a spherical Earth.
#[inline(always)]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_lat = lat2 - lat1;
    let delta_lon = lon2 - lon1;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Convert a GPX waypoint to `(lat, lon)` in radians
#[inline(always)]
pub fn waypoint_to_radians(waypoint: &gpx::Waypoint) -> (f64, f64) {
    let point = waypoint.point();
    (point.y().to_radians(), point.x().to_radians())
}

/// Convert a GPX timestamp to a UTC chrono timestamp
///
/// Returns `None` when the timestamp cannot be represented as RFC 3339.
pub fn gpx_time_to_utc(time: &gpx::Time) -> Option<DateTime<Utc>> {
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
