// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::Serialize;

use crate::{format, CongestionCategory, Coordinate, RouteIndex, StepIndex};

/// Tunables of the [PlaybackEngine](super::PlaybackEngine).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Speed of the simulated vehicle at a 1× speed multiplier, in meters per second.
    pub base_speed_mps: f64,

    /// Maximum rotation speed of the smoothed camera bearing, in degrees per second.
    pub turn_rate_deg_per_sec: f64,

    /// Upper bound on the simulated time of a single tick, in seconds.
    /// Protects against huge jumps after a stalled or backgrounded host.
    pub max_tick_seconds: f64,

    /// Rotate the camera bearing gradually (at [PlaybackOptions::turn_rate_deg_per_sec]),
    /// instead of snapping it to the bearing of the current segment.
    pub smooth_turns: bool,

    /// Smallest accepted speed multiplier. Anything below (including zero,
    /// negative and non-finite values) is clamped to this value.
    pub min_speed_multiplier: f64,

    /// Tolerance (meters) for considering the end of a step as reached.
    pub step_epsilon_m: f64,
}

/// Recommended [PlaybackOptions]: 10 m/s at 1×, 60°/s camera turn rate, ticks of at most 1 second.
pub const DEFAULT_OPTIONS: PlaybackOptions = PlaybackOptions {
    base_speed_mps: 10.0,
    turn_rate_deg_per_sec: 60.0,
    max_tick_seconds: 1.0,
    smooth_turns: true,
    min_speed_multiplier: 0.1,
    step_epsilon_m: 0.5,
};

impl Default for PlaybackOptions {
    fn default() -> Self {
        DEFAULT_OPTIONS
    }
}

impl PlaybackOptions {
    /// Clamps a requested speed multiplier into the accepted range.
    pub fn clamp_speed(&self, multiplier: f64) -> f64 {
        if multiplier.is_finite() {
            multiplier.max(self.min_speed_multiplier)
        } else {
            self.min_speed_multiplier
        }
    }
}

/// Mutable state of a playback. Only ever written by the
/// [PlaybackEngine](super::PlaybackEngine) which owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    /// Simulated distance along the route, in meters, within `0..=total_distance`.
    pub distance_traveled: f64,

    pub is_playing: bool,

    /// Always positive.
    pub speed_multiplier: f64,

    /// Host timestamp (milliseconds) of the previous tick, `None` before the first
    /// tick after starting playback.
    pub last_tick_ms: Option<f64>,

    /// Index of the current [StepIndex]. Never decreases, except on reset.
    pub step_cursor: usize,

    /// Smoothed camera bearing, in degrees within `[0, 360)`.
    pub camera_bearing: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            distance_traveled: 0.0,
            is_playing: false,
            speed_multiplier: 1.0,
            last_tick_ms: None,
            step_cursor: 0,
            camera_bearing: 0.0,
        }
    }
}

/// Live navigation metrics, derived from a [PlaybackState] and a [RouteIndex].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    /// Distance left to the end of the route, in meters.
    pub remaining_distance: f64,

    /// Estimated time to the end of the route, in seconds.
    pub eta_seconds: f64,

    /// Distance left to the end of the current step, in meters.
    pub distance_to_next_maneuver: f64,
}

impl DerivedMetrics {
    /// Computes the metrics of a playback.
    ///
    /// ETA is the routing API's duration, scaled by the fraction of the route left.
    /// If the route has no known duration, it's the remaining distance over the
    /// simulated vehicle speed instead.
    pub fn compute(state: &PlaybackState, index: &RouteIndex, options: &PlaybackOptions) -> Self {
        let total_distance = index.total_distance();
        let remaining_distance = (total_distance - state.distance_traveled).max(0.0);

        let eta_seconds = if total_distance <= 0.0 {
            0.0
        } else if index.total_duration() > 0.0 {
            remaining_distance / total_distance * index.total_duration()
        } else {
            remaining_distance
                / (options.base_speed_mps * state.speed_multiplier.max(options.min_speed_multiplier))
        };

        let distance_to_next_maneuver = match index.steps().get(state.step_cursor) {
            Some(step) => (step.end_distance - state.distance_traveled).max(0.0),
            None => remaining_distance,
        };

        Self {
            remaining_distance,
            eta_seconds,
            distance_to_next_maneuver,
        }
    }
}

/// The maneuver performed at the end of the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingManeuver {
    /// Index of the step starting with this maneuver.
    pub step_index: usize,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub modifier: Option<String>,

    pub location: Option<Coordinate>,

    /// Human-readable instruction, e.g. "Turn left onto Main Street".
    pub instruction: String,
}

impl UpcomingManeuver {
    pub(super) fn after(index: &RouteIndex, step_cursor: usize) -> Option<Self> {
        let step_index = step_cursor + 1;
        index.steps().get(step_index).map(|step| Self::of(step_index, step))
    }

    fn of(step_index: usize, step: &StepIndex) -> Self {
        Self {
            step_index,
            kind: step.maneuver.kind.clone(),
            modifier: step.maneuver.modifier.clone(),
            location: step.maneuver.location,
            instruction: format::describe_maneuver(
                &step.maneuver,
                step.name.as_deref(),
                Some(step.length()),
            ),
        }
    }
}

/// Read-only view of a playback, refreshed once per tick, for presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub position: Coordinate,

    /// Bearing of the route segment under the marker, in degrees.
    pub bearing: f64,

    /// Smoothed bearing for the camera, in degrees.
    pub camera_bearing: f64,

    pub marker_color: CongestionCategory,

    pub distance_traveled_meters: f64,
    pub remaining_distance_meters: f64,
    pub eta_seconds: f64,
    pub distance_to_next_maneuver_meters: f64,

    pub step_index: usize,
    pub next_maneuver: Option<UpcomingManeuver>,

    pub speed_multiplier: f64,
    pub is_playing: bool,
}
