// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Coordinate;

/// Mean radius of Earth, in meters, as used by routing APIs
/// for their own distance annotations.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in meters.
pub fn earth_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let sin_dlat_half = ((b.lat - a.lat).to_radians() * 0.5).sin();
    let sin_dlon_half = ((b.lon - a.lon).to_radians() * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    2.0 * EARTH_RADIUS * h.sqrt().atan2((1.0 - h).max(0.0).sqrt())
}

/// Calculates the initial compass bearing (clockwise from north) of
/// the great-circle path from `from` to `to`. Returns degrees in `[0, 360)`.
///
/// Coincident positions have a bearing of zero.
pub fn bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_bearing(degrees: f64) -> f64 {
    let n = degrees.rem_euclid(360.0);
    // rem_euclid may round tiny negative inputs up to exactly 360
    if n >= 360.0 {
        0.0
    } else {
        n
    }
}

/// Returns the signed minimal rotation, in degrees, from `from` to `to`.
/// Positive values are clockwise. The result lies in `(-180, 180]`.
pub fn shortest_angular_delta(from: f64, to: f64) -> f64 {
    let d = normalize_bearing(to) - normalize_bearing(from);
    if d > 180.0 {
        d - 360.0
    } else if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

/// Rotates `current` towards `target` by at most `max_step` degrees,
/// taking the shorter way around. If `target` is within reach, it is returned
/// exactly (normalized to `[0, 360)`).
pub fn step_bearing_towards(current: f64, target: f64, max_step: f64) -> f64 {
    let max_step = max_step.max(0.0);
    let delta = shortest_angular_delta(current, target);
    if delta.abs() <= max_step {
        normalize_bearing(target)
    } else {
        normalize_bearing(current + max_step.copysign(delta))
    }
}
