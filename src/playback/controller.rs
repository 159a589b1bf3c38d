// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::engine::{Frame, PlaybackEngine};
use super::state::{PlaybackOptions, PlaybackSnapshot, UpcomingManeuver};
use crate::{CongestionCategory, Coordinate, RouteIndex};

/// Zoom level the camera is locked to, at least, when following starts.
const FOLLOW_MIN_LOCKED_ZOOM: f64 = 17.0;

/// Zoom level used while following, at least, unless zoom is kept.
const FOLLOW_MIN_ZOOM: f64 = 18.0;

const FOLLOW_MAX_ZOOM: f64 = 22.0;

/// Camera pitch used while following, at least, in degrees.
const FOLLOW_MIN_PITCH: f64 = 60.0;

/// Current zoom and pitch of the host's map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pitch: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 13.0,
            pitch: 0.0,
        }
    }
}

/// Where the host viewport should move to keep the vehicle in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub center: Coordinate,
    pub bearing: f64,
    pub zoom: f64,
    pub pitch: f64,
}

/// Receives the visual updates of a [PlaybackController] - usually a vehicle marker
/// on a map and the map's camera.
///
/// The unit type implements a sink which ignores all updates, for hosts which
/// only poll [PlaybackController::snapshot].
pub trait PositionSink {
    /// Moves the vehicle marker. Called on every frame.
    fn set_marker(&mut self, position: Coordinate, bearing: f64);

    /// Recolors the vehicle marker. Only called when the color changes.
    fn set_marker_color(&mut self, category: CongestionCategory);

    /// Returns the current state of the host viewport.
    fn viewport(&self) -> Viewport {
        Viewport::default()
    }

    /// Recenters the host viewport. Only called when following the vehicle is enabled.
    fn follow(&mut self, _camera: &CameraFrame) {}
}

impl PositionSink for () {
    fn set_marker(&mut self, _position: Coordinate, _bearing: f64) {}
    fn set_marker_color(&mut self, _category: CongestionCategory) {}
}

/// The playback surface exposed to a view layer: play/pause/reset/speed controls,
/// camera following and a per-tick [PlaybackSnapshot].
///
/// A controller plays at most one route at a time. Loading a different route
/// discards the previous [PlaybackEngine] entirely.
#[derive(Debug)]
pub struct PlaybackController<S: PositionSink> {
    sink: S,
    options: PlaybackOptions,
    engine: Option<PlaybackEngine>,
    speed_multiplier: f64,
    follow_camera: bool,
    keep_zoom: bool,
    locked_zoom: Option<f64>,
    snapshot: PlaybackSnapshot,
}

impl<S: PositionSink> PlaybackController<S> {
    pub fn new(sink: S, options: PlaybackOptions) -> Self {
        Self {
            sink,
            options,
            engine: None,
            speed_multiplier: 1.0,
            follow_camera: true,
            keep_zoom: false,
            locked_zoom: None,
            snapshot: PlaybackSnapshot {
                speed_multiplier: 1.0,
                ..Default::default()
            },
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn engine(&self) -> Option<&PlaybackEngine> {
        self.engine.as_ref()
    }

    /// Returns the view of the playback after the most recent tick.
    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    /// Starts playing back a new route, stopping and discarding the current one.
    /// The marker is placed at the start of the new route; playback remains idle.
    pub fn load_route(&mut self, index: Arc<RouteIndex>) {
        self.unload_route();

        let mut engine = PlaybackEngine::reset_for_route(index, self.options);
        engine.set_speed(self.speed_multiplier);
        let frame = engine.reset();
        self.engine = Some(engine);
        self.present(frame, false);
    }

    /// Stops and discards the current route, if any. Also used on teardown.
    pub fn unload_route(&mut self) {
        self.pause();
        self.engine = None;
        self.snapshot = PlaybackSnapshot {
            speed_multiplier: self.speed_multiplier,
            ..Default::default()
        };
    }

    /// Checks if there's a route which can be played back.
    /// This should be checked before calling [PlaybackController::play].
    pub fn can_simulate(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.can_simulate())
    }

    /// Starts the playback. Returns `false` if there's no route which
    /// [can be simulated](PlaybackController::can_simulate).
    pub fn play(&mut self) -> bool {
        let started = self.engine.as_mut().is_some_and(|e| e.play());
        if started && self.follow_camera {
            self.lock_zoom();
        }
        self.snapshot.is_playing = self.is_playing();
        started
    }

    /// Stops the playback, canceling any further ticks. Pausing when idle is a no-op.
    pub fn pause(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pause();
        }
        self.locked_zoom = None;
        self.snapshot.is_playing = false;
    }

    /// Stops the playback and rewinds to the start of the route.
    pub fn reset(&mut self) {
        self.pause();
        if let Some(engine) = self.engine.as_mut() {
            let frame = engine.reset();
            self.present(frame, false);
        }
    }

    /// Sets the speed multiplier, clamped as per [PlaybackOptions::min_speed_multiplier].
    /// The multiplier persists across route changes.
    pub fn set_speed(&mut self, multiplier: f64) {
        self.speed_multiplier = self.options.clamp_speed(multiplier);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_speed(self.speed_multiplier);
        }
        self.snapshot.speed_multiplier = self.speed_multiplier;
    }

    /// Enables or disables recentering the host viewport on the vehicle.
    /// This has no effect on the simulation itself.
    pub fn set_follow_camera(&mut self, follow: bool) {
        self.follow_camera = follow;
        if follow && self.is_playing() {
            self.lock_zoom();
        } else if !follow {
            self.locked_zoom = None;
        }
    }

    /// Keeps the current zoom level while following, instead of zooming in.
    pub fn set_keep_zoom(&mut self, keep_zoom: bool) {
        self.keep_zoom = keep_zoom;
        self.locked_zoom = None;
        if self.follow_camera && self.is_playing() {
            self.lock_zoom();
        }
    }

    pub fn set_smooth_turns(&mut self, smooth_turns: bool) {
        self.options.smooth_turns = smooth_turns;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_smooth_turns(smooth_turns);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.state().is_playing)
    }

    pub fn is_following(&self) -> bool {
        self.follow_camera
    }

    /// Advances the playback to the host timestamp `now_ms` (milliseconds),
    /// pushing the resulting frame to the [PositionSink] and refreshing the snapshot.
    ///
    /// Returns `true` if another tick should be scheduled.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let Some(frame) = self.engine.as_mut().and_then(|e| e.tick(now_ms)) else {
            return false;
        };

        self.present(frame, self.follow_camera);

        if frame.finished {
            self.locked_zoom = None;
            false
        } else {
            true
        }
    }

    fn lock_zoom(&mut self) {
        if self.locked_zoom.is_none() {
            let zoom = self.sink.viewport().zoom;
            self.locked_zoom = Some(if self.keep_zoom {
                zoom
            } else {
                zoom.max(FOLLOW_MIN_LOCKED_ZOOM)
            });
        }
    }

    fn camera_frame(&self, frame: &Frame) -> CameraFrame {
        let viewport = self.sink.viewport();
        let zoom = self.locked_zoom.unwrap_or(viewport.zoom).min(FOLLOW_MAX_ZOOM);

        CameraFrame {
            center: frame.position,
            bearing: frame.camera_bearing,
            zoom: if self.keep_zoom {
                zoom
            } else {
                zoom.max(FOLLOW_MIN_ZOOM)
            },
            pitch: viewport.pitch.max(FOLLOW_MIN_PITCH),
        }
    }

    fn present(&mut self, frame: Frame, follow: bool) {
        self.sink.set_marker(frame.position, frame.bearing);
        if frame.repaint {
            self.sink.set_marker_color(frame.color);
        }
        if follow {
            let camera = self.camera_frame(&frame);
            self.sink.follow(&camera);
        }

        if let Some(engine) = self.engine.as_ref() {
            let state = engine.state();
            let metrics = engine.metrics();
            self.snapshot = PlaybackSnapshot {
                position: frame.position,
                bearing: frame.bearing,
                camera_bearing: frame.camera_bearing,
                marker_color: frame.color,
                distance_traveled_meters: state.distance_traveled,
                remaining_distance_meters: metrics.remaining_distance,
                eta_seconds: metrics.eta_seconds,
                distance_to_next_maneuver_meters: metrics.distance_to_next_maneuver,
                step_index: state.step_cursor,
                next_maneuver: UpcomingManeuver::after(engine.index(), state.step_cursor),
                speed_multiplier: state.speed_multiplier,
                is_playing: state.is_playing,
            };
        }
    }
}
