// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::Coordinate;

/// Top-level [Directions API](https://docs.mapbox.com/api/navigation/directions/#directions-response-object)
/// response, listing one or more route alternatives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub routes: Vec<Route>,
}

/// A single route alternative, as returned by the routing API.
///
/// Every field is optional, as routing API responses are third-party data
/// which may be partially incomplete. Use the accessor methods instead of
/// inspecting the fields directly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub legs: Option<Vec<Leg>>,

    /// Length of the route, in meters.
    #[serde(default)]
    pub distance: Option<f64>,

    /// Travel time over the route, in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Route {
    /// Returns the full route geometry.
    pub fn coordinates(&self) -> &[Coordinate] {
        self.geometry
            .as_ref()
            .map(|g| g.coordinates())
            .unwrap_or_default()
    }

    pub fn legs(&self) -> &[Leg] {
        self.legs.as_deref().unwrap_or_default()
    }

    /// Iterates over the steps of all legs, in order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.legs().iter().flat_map(|leg| leg.steps())
    }
}

/// [GeoJSON LineString](https://datatracker.ietf.org/doc/html/rfc7946#section-3.1.4) geometry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Option<Vec<Coordinate>>,
}

impl Geometry {
    pub fn coordinates(&self) -> &[Coordinate] {
        self.coordinates.as_deref().unwrap_or_default()
    }
}

/// Part of a [Route] between two consecutive waypoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub steps: Option<Vec<Step>>,

    #[serde(default)]
    pub annotation: Option<Annotation>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub distance: Option<f64>,

    #[serde(default)]
    pub duration: Option<f64>,
}

impl Leg {
    pub fn steps(&self) -> &[Step] {
        self.steps.as_deref().unwrap_or_default()
    }
}

/// Per-segment annotations of a [Leg]. Element `k` of every array describes
/// the segment between the `k`-th and `k+1`-th coordinate of the leg.
/// Arrays which were not requested from the API are empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub duration: Vec<Option<f64>>,

    #[serde(default)]
    pub distance: Vec<Option<f64>>,

    /// Observed speed, in meters per second.
    #[serde(default)]
    pub speed: Vec<Option<f64>>,

    #[serde(default)]
    pub maxspeed: Vec<MaxSpeed>,

    #[serde(default)]
    pub congestion: Vec<Option<String>>,

    #[serde(default)]
    pub congestion_numeric: Vec<Option<i64>>,
}

impl Annotation {
    /// Number of segments covered by this annotation,
    /// which is the length of the longest annotation array.
    pub fn len(&self) -> usize {
        [
            self.duration.len(),
            self.distance.len(),
            self.speed.len(),
            self.maxspeed.len(),
            self.congestion.len(),
            self.congestion_numeric.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Speed limit of a segment. The API either provides a bare number (km/h),
/// or an object like `{"speed": 50, "unit": "km/h"}`, `{"unknown": true}` or `{"none": true}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MaxSpeed {
    Value(f64),
    Object {
        #[serde(default)]
        speed: Option<f64>,

        #[serde(default)]
        unit: Option<String>,

        #[serde(default)]
        unknown: Option<bool>,

        #[serde(default)]
        none: Option<bool>,
    },
    Null,
}

impl MaxSpeed {
    /// Converts the speed limit into meters per second.
    /// Returns `None` for unknown or absent limits.
    pub fn to_mps(&self) -> Option<f64> {
        let mps = match self {
            Self::Value(kmh) => Some(kmh / 3.6),
            Self::Object {
                speed: Some(speed),
                unit,
                ..
            } => match unit.as_deref().map(|u| u.trim().to_lowercase()).as_deref() {
                Some("mph") => Some(speed * 0.44704),
                Some("m/s") | Some("ms") => Some(*speed),
                _ => Some(speed / 3.6),
            },
            _ => None,
        };
        mps.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// One maneuver unit (turn, continue, arrive, ...) within a [Leg].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub geometry: Option<Geometry>,

    /// Travel time over the step, in seconds.
    #[serde(default)]
    pub duration: Option<f64>,

    /// Length of the step, in meters.
    #[serde(default)]
    pub distance: Option<f64>,

    /// Name of the road traveled on by this step.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub maneuver: Option<Maneuver>,
}

impl Step {
    pub fn coordinates(&self) -> &[Coordinate] {
        self.geometry
            .as_ref()
            .map(|g| g.coordinates())
            .unwrap_or_default()
    }
}

/// Describes the action performed at the start of a [Step].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Maneuver {
    /// E.g. "depart", "turn", "roundabout" or "arrive".
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// E.g. "left", "slight right" or "uturn".
    #[serde(default)]
    pub modifier: Option<String>,

    #[serde(default)]
    pub location: Option<Coordinate>,

    /// Exit number of a roundabout/rotary maneuver.
    #[serde(default)]
    pub exit: Option<u32>,

    /// Human-readable instruction pre-rendered by the API.
    #[serde(default)]
    pub instruction: Option<String>,
}
