// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod index;
mod model;
mod reader;

pub use index::{RouteIndex, Sample, StepIndex};
pub use model::{Annotation, Geometry, Leg, Maneuver, MaxSpeed, Response, Route, Step};
pub use reader::{
    read_route_from_buffer, read_route_from_file, read_route_from_io, Error, FileFormat,
    ReadOptions,
};
