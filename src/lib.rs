// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Playback simulation of routes returned by
//! [OSRM](https://project-osrm.org/)/[Mapbox Directions](https://docs.mapbox.com/api/navigation/directions/)
//! style routing APIs.
//!
//! A routing API response is read into a [route::Route], indexed by distance
//! into a [RouteIndex], and then driven frame-by-frame by a [PlaybackController],
//! which moves a vehicle marker along the route, smooths the camera bearing,
//! colors the marker by traffic congestion and keeps live navigation metrics
//! (remaining distance, ETA, distance to the next maneuver).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! let route = routeplay::route::read_route_from_file(
//!     "path/to/directions.json",
//!     &routeplay::route::ReadOptions::default(),
//! ).expect("failed to load the route");
//! let index = Arc::new(routeplay::RouteIndex::build(&route));
//!
//! let mut controller = routeplay::PlaybackController::new((), routeplay::DEFAULT_OPTIONS);
//! controller.load_route(index);
//! controller.play();
//!
//! let mut now_ms = 0.0;
//! while controller.tick(now_ms) {
//!     now_ms += 1000.0 / 60.0;
//! }
//!
//! println!("{:?}", controller.snapshot());
//! ```

pub mod c;
mod congestion;
pub mod format;
mod geo;
mod playback;
pub mod route;

pub use congestion::{classify, CongestionCategory, SegmentContext};
pub use geo::{
    bearing, earth_distance, normalize_bearing, shortest_angular_delta, step_bearing_towards,
};
pub use playback::{
    CameraFrame, DerivedMetrics, Frame, PlaybackController, PlaybackEngine, PlaybackOptions,
    PlaybackSnapshot, PlaybackState, PositionSink, UpcomingManeuver, Viewport, DEFAULT_OPTIONS,
};
pub use route::{RouteIndex, Sample, StepIndex};

/// A position on Earth, in decimal degrees.
///
/// Routing APIs encode coordinates as `[longitude, latitude]` arrays,
/// and so does the (de)serialized form of this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
#[repr(C)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const ZERO: Self = Self { lon: 0.0, lat: 0.0 };

    #[inline]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Linearly interpolates between `self` (`t == 0`) and `other` (`t == 1`).
    ///
    /// This treats degrees as planar, which is accurate enough
    /// over the length of a single route segment.
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Checks if two coordinates denote the same position,
    /// ignoring differences below ~1 cm caused by float round-trips.
    #[inline]
    pub fn same_position(self, other: Self) -> bool {
        (self.lon - other.lon).abs() < 1e-7 && (self.lat - other.lat).abs() < 1e-7
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}
