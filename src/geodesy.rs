//! Great-circle helpers over waypoints.
//!
//! All functions are total over finite input; NaN/Inf propagate rather than
//! being rejected.

use crate::waypoint::Waypoint;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Speed floor applied to a leg's destination speed when estimating duration.
pub const MIN_LEG_SPEED_MPS: f64 = 0.1;

/// Haversine distance in meters.
pub fn distance(a: &Waypoint, b: &Waypoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Sum of consecutive leg distances; 0 for fewer than two waypoints.
pub fn total_distance(waypoints: &[Waypoint]) -> f64 {
    waypoints.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Estimated flight time in seconds. Each leg is flown at the destination
/// waypoint's speed, floored to [`MIN_LEG_SPEED_MPS`].
pub fn total_duration(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|w| distance(&w[0], &w[1]) / leg_speed(&w[1]))
        .sum()
}

fn leg_speed(to: &Waypoint) -> f64 {
    // f64::max would swallow NaN, so compare explicitly
    if to.speed < MIN_LEG_SPEED_MPS {
        MIN_LEG_SPEED_MPS
    } else {
        to.speed
    }
}

/// Initial forward azimuth from `from` to `to`, in degrees within `[0, 360)`.
pub fn bearing(from: &Waypoint, to: &Waypoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if deg >= 360.0 { 0.0 } else { deg }
}
