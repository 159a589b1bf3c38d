// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::state::{DerivedMetrics, PlaybackOptions, PlaybackState};
use crate::{step_bearing_towards, CongestionCategory, Coordinate, RouteIndex, Sample};

/// Outcome of a single [PlaybackEngine::tick].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Marker position.
    pub position: Coordinate,

    /// Marker bearing: the bearing of the route segment under the marker.
    pub bearing: f64,

    /// Smoothed bearing for the camera.
    pub camera_bearing: f64,

    /// Congestion category of the route segment under the marker.
    pub color: CongestionCategory,

    /// Whether `color` differs from the previously emitted color,
    /// meaning that the marker needs to be repainted.
    pub repaint: bool,

    /// Whether this frame reached the end of the route,
    /// and playback was automatically paused.
    pub finished: bool,
}

/// Simulates a vehicle moving along a [RouteIndex].
///
/// The engine is a two-state machine: idle or playing. While playing, the host
/// is expected to call [PlaybackEngine::tick] once per animation frame.
/// Reaching the end of the route automatically pauses the playback.
///
/// An engine is bound to a single route; selecting a different route
/// requires building a new engine with [PlaybackEngine::reset_for_route].
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    index: Arc<RouteIndex>,
    options: PlaybackOptions,
    state: PlaybackState,
    metrics: DerivedMetrics,
    sample: Sample,
    marker_color: Option<CongestionCategory>,
}

impl PlaybackEngine {
    /// Creates an idle engine at the start of the provided route.
    pub fn reset_for_route(index: Arc<RouteIndex>, options: PlaybackOptions) -> Self {
        let mut engine = Self {
            index,
            options,
            state: PlaybackState::default(),
            metrics: DerivedMetrics::default(),
            sample: Sample::default(),
            marker_color: None,
        };
        engine.reset();
        engine
    }

    pub fn index(&self) -> &Arc<RouteIndex> {
        &self.index
    }

    pub fn options(&self) -> &PlaybackOptions {
        &self.options
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    /// Position and bearing after the most recent tick (or reset).
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Checks if the route can be played back at all. Routes with
    /// less than 2 coordinates, or with zero length, can't.
    pub fn can_simulate(&self) -> bool {
        self.index.can_simulate()
    }

    /// Starts (or resumes) the playback. Returns `false`, leaving the engine idle,
    /// if the route [can't be simulated](PlaybackEngine::can_simulate).
    ///
    /// The first tick after starting only establishes the reference timestamp,
    /// and does not advance the vehicle.
    pub fn play(&mut self) -> bool {
        if !self.can_simulate() {
            log::debug!("refusing to play a route which can't be simulated");
            return false;
        }

        if !self.state.is_playing {
            self.state.is_playing = true;
            self.state.last_tick_ms = None;
            log::debug!("playback started at {:.1} m", self.state.distance_traveled);
        }
        true
    }

    /// Stops the playback. Pausing an idle engine is a no-op.
    pub fn pause(&mut self) {
        if self.state.is_playing {
            log::debug!("playback paused at {:.1} m", self.state.distance_traveled);
        }
        self.state.is_playing = false;
        self.state.last_tick_ms = None;
    }

    /// Stops the playback and rewinds it to the start of the route,
    /// snapping the camera bearing to the bearing of the first segment.
    ///
    /// Returns the [Frame] at the start of the route.
    pub fn reset(&mut self) -> Frame {
        let speed_multiplier = self.state.speed_multiplier;
        self.state = PlaybackState {
            speed_multiplier,
            ..PlaybackState::default()
        };
        self.marker_color = None;

        self.sample = self.index.sample(0.0).unwrap_or_default();
        self.state.camera_bearing = self.sample.bearing;
        self.metrics = DerivedMetrics::compute(&self.state, &self.index, &self.options);

        self.emit_frame(false)
    }

    /// Sets the speed multiplier. Zero, negative and non-finite multipliers
    /// are clamped to [PlaybackOptions::min_speed_multiplier].
    pub fn set_speed(&mut self, multiplier: f64) {
        self.state.speed_multiplier = self.options.clamp_speed(multiplier);
    }

    pub fn set_smooth_turns(&mut self, smooth_turns: bool) {
        self.options.smooth_turns = smooth_turns;
    }

    /// Advances the simulation to the host timestamp `now_ms` (milliseconds).
    ///
    /// Returns `None` if the engine is idle. Otherwise, returns the resulting [Frame];
    /// if [Frame::finished] is set, the engine has become idle and no more ticks are needed.
    pub fn tick(&mut self, now_ms: f64) -> Option<Frame> {
        if !self.state.is_playing {
            return None;
        }

        // Non-finite timestamps advance by nothing and keep the previous reference
        let dt = if !now_ms.is_finite() {
            log::debug!("ignoring non-finite tick timestamp {}", now_ms);
            0.0
        } else {
            let dt = match self.state.last_tick_ms {
                Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, self.options.max_tick_seconds),
                None => 0.0,
            };
            self.state.last_tick_ms = Some(now_ms);
            dt
        };

        self.advance_by(self.options.base_speed_mps * self.state.speed_multiplier * dt, dt)
    }

    /// Moves the vehicle forward by `meters`, treating the move as taking `dt` seconds
    /// (for camera smoothing). Works like [PlaybackEngine::tick], including automatic pausing
    /// at the end of the route.
    pub fn advance_by(&mut self, meters: f64, dt: f64) -> Option<Frame> {
        if !self.state.is_playing {
            return None;
        }

        let total_distance = self.index.total_distance();
        let advance = if meters.is_finite() { meters } else { 0.0 };
        self.state.distance_traveled =
            (self.state.distance_traveled + advance).clamp(0.0, total_distance);

        if let Some(sample) = self.index.sample(self.state.distance_traveled) {
            self.sample = sample;
        }

        self.state.camera_bearing = if self.options.smooth_turns {
            step_bearing_towards(
                self.state.camera_bearing,
                self.sample.bearing,
                self.options.turn_rate_deg_per_sec * dt,
            )
        } else {
            self.sample.bearing
        };

        self.advance_step_cursor();
        self.metrics = DerivedMetrics::compute(&self.state, &self.index, &self.options);

        let finished = self.state.distance_traveled >= total_distance;
        if finished {
            self.state.is_playing = false;
            self.state.last_tick_ms = None;
            log::debug!("playback reached the end of the route ({:.1} m)", total_distance);
        }

        Some(self.emit_frame(finished))
    }

    fn advance_step_cursor(&mut self) {
        let steps = self.index.steps();
        while self.state.step_cursor + 1 < steps.len()
            && self.state.distance_traveled
                >= steps[self.state.step_cursor].end_distance - self.options.step_epsilon_m
        {
            self.state.step_cursor += 1;
        }
    }

    fn emit_frame(&mut self, finished: bool) -> Frame {
        let color = self.index.congestion_at_segment(self.sample.segment);
        let repaint = self.marker_color != Some(color);
        self.marker_color = Some(color);

        Frame {
            position: self.sample.position,
            bearing: self.sample.bearing,
            camera_bearing: self.state.camera_bearing,
            color,
            repaint,
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Annotation, Geometry, Leg, Route, Step};
    use crate::DEFAULT_OPTIONS;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-6),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn geometry(coords: &[[f64; 2]]) -> Option<Geometry> {
        Some(Geometry {
            coordinates: Some(coords.iter().map(|&c| Coordinate::from(c)).collect()),
        })
    }

    fn step(coords: &[[f64; 2]], duration: f64) -> Step {
        Step {
            geometry: geometry(coords),
            duration: Some(duration),
            ..Default::default()
        }
    }

    /// Two ~1112 m segments going north, one step each, 60 seconds each.
    fn straight_index() -> Arc<RouteIndex> {
        let route = Route {
            geometry: geometry(&[[0.0, 0.0], [0.0, 0.01], [0.0, 0.02]]),
            legs: Some(vec![Leg {
                steps: Some(vec![
                    step(&[[0.0, 0.0], [0.0, 0.01]], 60.0),
                    step(&[[0.0, 0.01], [0.0, 0.02]], 60.0),
                ]),
                annotation: Some(Annotation {
                    congestion: vec![Some("low".to_string()), Some("severe".to_string())],
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        };
        Arc::new(RouteIndex::build(&route))
    }

    /// North for ~1112 m, then east for ~1112 m.
    fn corner_index() -> Arc<RouteIndex> {
        let route = Route {
            geometry: geometry(&[[0.0, 0.0], [0.0, 0.01], [0.01, 0.01]]),
            ..Default::default()
        };
        Arc::new(RouteIndex::build(&route))
    }

    fn playing(index: Arc<RouteIndex>) -> PlaybackEngine {
        let mut engine = PlaybackEngine::reset_for_route(index, DEFAULT_OPTIONS);
        assert!(engine.play());
        assert!(engine.tick(0.0).is_some());
        engine
    }

    #[test]
    fn first_tick_does_not_advance() {
        let mut engine = PlaybackEngine::reset_for_route(straight_index(), DEFAULT_OPTIONS);
        engine.play();
        engine.tick(5000.0).unwrap();
        assert_eq!(engine.state().distance_traveled, 0.0);
        assert_eq!(engine.state().last_tick_ms, Some(5000.0));
    }

    #[test]
    fn tick_advances_by_speed() {
        let mut engine = playing(straight_index());
        engine.set_speed(2.0);

        engine.tick(500.0).unwrap();
        assert_almost_eq!(engine.state().distance_traveled, 10.0);

        engine.tick(1000.0).unwrap();
        assert_almost_eq!(engine.state().distance_traveled, 20.0);
        assert!(engine.state().is_playing);
    }

    #[test]
    fn tick_clamps_dt() {
        let mut engine = playing(straight_index());

        // A 60-second stall only advances by max_tick_seconds
        engine.tick(60_000.0).unwrap();
        assert_almost_eq!(engine.state().distance_traveled, 10.0);

        // Time going backwards doesn't move the vehicle backwards
        engine.tick(30_000.0).unwrap();
        assert_almost_eq!(engine.state().distance_traveled, 10.0);
    }

    #[test]
    fn non_finite_timestamps_are_ignored() {
        let mut engine = playing(straight_index());

        let frame = engine.tick(f64::NAN).unwrap();
        assert!(!frame.finished);
        assert_eq!(engine.state().distance_traveled, 0.0);
        assert_eq!(engine.state().last_tick_ms, Some(0.0));

        engine.tick(f64::INFINITY).unwrap();
        assert_eq!(engine.state().last_tick_ms, Some(0.0));

        engine.tick(500.0).unwrap();
        assert_almost_eq!(engine.state().distance_traveled, 5.0);
        assert!(engine.state().is_playing);
    }

    #[test]
    fn end_of_route_clamps_and_pauses() {
        let index = straight_index();
        let total = index.total_distance();
        let mut engine = playing(index);

        let frame = engine.advance_by(total * 100.0, 1.0).unwrap();
        assert!(frame.finished);
        assert_eq!(engine.state().distance_traveled, total);
        assert!(!engine.state().is_playing);
        assert_eq!(engine.state().last_tick_ms, None);
        assert_eq!(frame.position, Coordinate::new(0.0, 0.02));

        assert_eq!(engine.tick(10_000.0), None);
    }

    #[test]
    fn full_scenario() {
        let index = straight_index();
        let total = index.total_distance();
        let mut engine = playing(index);

        let mut now = 0.0;
        let mut frames = 0;
        while engine.state().is_playing {
            now += 1000.0 / 60.0;
            engine.tick(now).unwrap();
            frames += 1;
            assert!(frames < 100_000, "playback never finished");
        }

        assert_eq!(engine.state().distance_traveled, total);
        assert_eq!(engine.metrics().remaining_distance, 0.0);
        assert_eq!(engine.metrics().eta_seconds, 0.0);
        assert_eq!(engine.metrics().distance_to_next_maneuver, 0.0);
        assert_eq!(engine.state().step_cursor, 1);
    }

    #[test]
    fn step_cursor_and_metrics_mid_route() {
        let index = straight_index();
        let first_step_end = index.steps()[0].end_distance;
        let total = index.total_distance();
        let mut engine = playing(index);

        engine.advance_by(first_step_end - 100.0, 0.0).unwrap();
        assert_eq!(engine.state().step_cursor, 0);
        assert_almost_eq!(engine.metrics().distance_to_next_maneuver, 100.0);

        engine.advance_by(100.0, 0.0).unwrap();
        assert_eq!(engine.state().step_cursor, 1);
        assert_almost_eq!(engine.metrics().distance_to_next_maneuver, total - first_step_end);
        assert_almost_eq!(engine.metrics().remaining_distance, total - first_step_end);
        // Exactly half of the route, whose duration is 120 s
        assert_almost_eq!(engine.metrics().eta_seconds, 60.0);
    }

    #[test]
    fn eta_is_proportional_to_remaining_distance() {
        let route = Route {
            geometry: geometry(&[[0.0, 0.0], [0.0, 0.01]]),
            duration: Some(100.0),
            ..Default::default()
        };
        let index = Arc::new(RouteIndex::build(&route));
        let total = index.total_distance();
        let mut engine = playing(index);

        engine.advance_by(total * 0.4, 0.0).unwrap();
        assert_almost_eq!(engine.metrics().eta_seconds, 60.0);
    }

    #[test]
    fn eta_without_duration_uses_simulated_speed() {
        let index = corner_index();
        let total = index.total_distance();
        let mut engine = playing(index);
        engine.set_speed(2.0);

        engine.advance_by(total / 2.0, 0.0).unwrap();
        assert_almost_eq!(engine.metrics().eta_seconds, total / 2.0 / 20.0);
        // No steps - the next maneuver is the arrival
        assert_almost_eq!(engine.metrics().distance_to_next_maneuver, total / 2.0);
    }

    #[test]
    fn camera_turn_rate_is_limited() {
        let index = corner_index();
        let corner = index.cumulative_distance()[1];
        let mut engine = playing(index);
        assert_almost_eq!(engine.state().camera_bearing, 0.0);

        // Jump past the corner in a 0.5 second frame: at most 30° of rotation
        engine.advance_by(corner + 10.0, 0.5).unwrap();
        assert!((engine.sample().bearing - 90.0).abs() < 0.01);
        assert_almost_eq!(engine.state().camera_bearing, 30.0);

        engine.advance_by(1.0, 0.5).unwrap();
        assert_almost_eq!(engine.state().camera_bearing, 60.0);

        // Within budget - lands exactly on the segment bearing
        engine.advance_by(1.0, 1.0).unwrap();
        assert_eq!(engine.state().camera_bearing, engine.sample().bearing);
    }

    #[test]
    fn camera_snaps_without_smoothing() {
        let index = corner_index();
        let corner = index.cumulative_distance()[1];
        let mut engine = playing(index);
        engine.set_smooth_turns(false);

        engine.advance_by(corner + 10.0, 0.01).unwrap();
        assert_eq!(engine.state().camera_bearing, engine.sample().bearing);
    }

    #[test]
    fn speed_is_clamped() {
        let mut engine = PlaybackEngine::reset_for_route(straight_index(), DEFAULT_OPTIONS);
        engine.set_speed(0.0);
        assert_eq!(engine.state().speed_multiplier, 0.1);
        engine.set_speed(-3.0);
        assert_eq!(engine.state().speed_multiplier, 0.1);
        engine.set_speed(f64::NAN);
        assert_eq!(engine.state().speed_multiplier, 0.1);
        engine.set_speed(4.0);
        assert_eq!(engine.state().speed_multiplier, 4.0);
    }

    #[test]
    fn zero_length_route_cannot_play() {
        let route = Route {
            geometry: geometry(&[[1.0, 1.0], [1.0, 1.0]]),
            ..Default::default()
        };
        let mut engine =
            PlaybackEngine::reset_for_route(Arc::new(RouteIndex::build(&route)), DEFAULT_OPTIONS);
        assert!(!engine.can_simulate());
        assert!(!engine.play());
        assert!(!engine.state().is_playing);
        assert_eq!(engine.tick(1000.0), None);

        let mut empty =
            PlaybackEngine::reset_for_route(Arc::new(RouteIndex::default()), DEFAULT_OPTIONS);
        assert!(!empty.play());
        assert_eq!(empty.sample().position, Coordinate::ZERO);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut engine = playing(straight_index());
        engine.tick(500.0).unwrap();
        engine.pause();
        engine.pause();
        assert!(!engine.state().is_playing);
        assert_eq!(engine.tick(1000.0), None);
        assert_almost_eq!(engine.state().distance_traveled, 5.0);

        // Resuming starts a fresh dt measurement
        assert!(engine.play());
        engine.tick(90_000.0).unwrap();
        assert_almost_eq!(engine.state().distance_traveled, 5.0);
    }

    #[test]
    fn reset_rewinds() {
        let index = corner_index();
        let total = index.total_distance();
        let mut engine = playing(index);
        engine.set_speed(3.0);
        engine.advance_by(total - 1.0, 10.0).unwrap();
        assert!(engine.state().step_cursor == 0);

        let frame = engine.reset();
        assert!(!engine.state().is_playing);
        assert_eq!(engine.state().distance_traveled, 0.0);
        assert_eq!(engine.state().step_cursor, 0);
        assert_almost_eq!(engine.state().camera_bearing, 0.0);
        assert_eq!(engine.state().speed_multiplier, 3.0);
        assert_eq!(frame.position, Coordinate::new(0.0, 0.0));
        assert!(frame.repaint);
        assert_almost_eq!(engine.metrics().remaining_distance, total);
    }

    #[test]
    fn marker_repaints_only_on_color_change() {
        let index = straight_index();
        let half = index.cumulative_distance()[1];
        let mut engine = PlaybackEngine::reset_for_route(index, DEFAULT_OPTIONS);
        engine.play();

        let first = engine.tick(0.0).unwrap();
        assert_eq!(first.color, CongestionCategory::Low);
        assert!(!first.repaint, "reset already painted the marker");

        let second = engine.advance_by(half / 2.0, 0.1).unwrap();
        assert_eq!(second.color, CongestionCategory::Low);
        assert!(!second.repaint);

        let third = engine.advance_by(half, 0.1).unwrap();
        assert_eq!(third.color, CongestionCategory::Severe);
        assert!(third.repaint);

        let fourth = engine.advance_by(1.0, 0.1).unwrap();
        assert_eq!(fourth.color, CongestionCategory::Severe);
        assert!(!fourth.repaint);
    }
}
