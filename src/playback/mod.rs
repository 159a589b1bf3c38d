// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod controller;
mod engine;
mod state;

pub use controller::{CameraFrame, PlaybackController, PositionSink, Viewport};
pub use engine::{Frame, PlaybackEngine};
pub use state::{
    DerivedMetrics, PlaybackOptions, PlaybackSnapshot, PlaybackState, UpcomingManeuver,
    DEFAULT_OPTIONS,
};
