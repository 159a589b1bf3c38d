// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::*;

use std::ffi::{c_char, CStr, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::ptr::{null, null_mut};
use std::slice;
use std::sync::Arc;

/// Playback controller handed out to C callers. C hosts poll
/// [routeplay_controller_snapshot] instead of receiving marker callbacks.
pub type CController = PlaybackController<()>;

#[derive(Copy, Clone)]
#[repr(C)]
pub enum CFileFormat {
    Unknown = 0,
    Json = 1,
    JsonGz = 2,
    JsonBz2 = 3,
}

impl From<CFileFormat> for route::FileFormat {
    fn from(value: CFileFormat) -> Self {
        match value {
            CFileFormat::Unknown => route::FileFormat::Unknown,
            CFileFormat::Json => route::FileFormat::Json,
            CFileFormat::JsonGz => route::FileFormat::JsonGz,
            CFileFormat::JsonBz2 => route::FileFormat::JsonBz2,
        }
    }
}

#[repr(C)]
pub struct CReadOptions {
    pub format: CFileFormat,
    pub alternative: usize,
}

impl CReadOptions {
    fn as_rust(&self) -> route::ReadOptions {
        route::ReadOptions {
            file_format: self.format.into(),
            alternative: self.alternative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct CSnapshot {
    pub position: Coordinate,
    pub bearing: f64,
    pub camera_bearing: f64,
    pub marker_color: CongestionCategory,
    pub distance_traveled: f64,
    pub remaining_distance: f64,
    pub eta_seconds: f64,
    pub distance_to_next_maneuver: f64,
    pub step_index: usize,
    pub speed_multiplier: f64,
    pub is_playing: bool,
}

impl CSnapshot {
    pub const ZERO: Self = Self {
        position: Coordinate::ZERO,
        bearing: 0.0,
        camera_bearing: 0.0,
        marker_color: CongestionCategory::Unknown,
        distance_traveled: 0.0,
        remaining_distance: 0.0,
        eta_seconds: 0.0,
        distance_to_next_maneuver: 0.0,
        step_index: 0,
        speed_multiplier: 0.0,
        is_playing: false,
    };
}

impl From<&PlaybackSnapshot> for CSnapshot {
    fn from(s: &PlaybackSnapshot) -> Self {
        Self {
            position: s.position,
            bearing: s.bearing,
            camera_bearing: s.camera_bearing,
            marker_color: s.marker_color,
            distance_traveled: s.distance_traveled_meters,
            remaining_distance: s.remaining_distance_meters,
            eta_seconds: s.eta_seconds,
            distance_to_next_maneuver: s.distance_to_next_maneuver_meters,
            step_index: s.step_index,
            speed_multiplier: s.speed_multiplier,
            is_playing: s.is_playing,
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_new() -> *mut CController {
    Box::into_raw(Box::new(CController::new((), DEFAULT_OPTIONS)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_delete(ptr: *mut CController) {
    if !ptr.is_null() {
        let mut controller = Box::from_raw(ptr);
        controller.unload_route();
    }
}

fn load(controller: &mut CController, result: Result<route::Route, route::Error>) -> bool {
    match result {
        Ok(route) => {
            controller.load_route(Arc::new(RouteIndex::build(&route)));
            true
        }
        Err(e) => {
            log::warn!("failed to load route: {}", e);
            false
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_load_file(
    controller: *mut CController,
    c_options: *const CReadOptions,
    c_filename: *const c_char,
) -> bool {
    if let (Some(controller), Some(c_options), false) = (
        controller.as_mut(),
        c_options.as_ref(),
        c_filename.is_null(),
    ) {
        let filename = OsStr::from_bytes(CStr::from_ptr(c_filename).to_bytes());
        load(
            controller,
            route::read_route_from_file(filename, &c_options.as_rust()),
        )
    } else {
        false
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_load_memory(
    controller: *mut CController,
    c_options: *const CReadOptions,
    content: *const u8,
    content_len: usize,
) -> bool {
    if let (Some(controller), Some(c_options), false) =
        (controller.as_mut(), c_options.as_ref(), content.is_null())
    {
        let content = slice::from_raw_parts(content, content_len);
        load(
            controller,
            route::read_route_from_buffer(content, &c_options.as_rust()),
        )
    } else {
        false
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_unload(controller: *mut CController) {
    if let Some(controller) = controller.as_mut() {
        controller.unload_route();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_can_simulate(controller: *const CController) -> bool {
    controller
        .as_ref()
        .map(|c| c.can_simulate())
        .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_play(controller: *mut CController) -> bool {
    if let Some(controller) = controller.as_mut() {
        controller.play()
    } else {
        false
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_pause(controller: *mut CController) {
    if let Some(controller) = controller.as_mut() {
        controller.pause();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_reset(controller: *mut CController) {
    if let Some(controller) = controller.as_mut() {
        controller.reset();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_set_speed(
    controller: *mut CController,
    multiplier: f64,
) {
    if let Some(controller) = controller.as_mut() {
        controller.set_speed(multiplier);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_set_follow_camera(
    controller: *mut CController,
    follow: bool,
) {
    if let Some(controller) = controller.as_mut() {
        controller.set_follow_camera(follow);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_set_smooth_turns(
    controller: *mut CController,
    smooth_turns: bool,
) {
    if let Some(controller) = controller.as_mut() {
        controller.set_smooth_turns(smooth_turns);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_tick(
    controller: *mut CController,
    now_ms: f64,
) -> bool {
    if let Some(controller) = controller.as_mut() {
        controller.tick(now_ms)
    } else {
        false
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_snapshot(controller: *const CController) -> CSnapshot {
    controller
        .as_ref()
        .map(|c| CSnapshot::from(c.snapshot()))
        .unwrap_or(CSnapshot::ZERO)
}

/// Gets the route geometry of the loaded route. Returns the number of coordinates,
/// and sets `out_coordinates` to the first one (or NULL if no route is loaded).
///
/// The pointer is only valid until the route is unloaded or replaced.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn routeplay_controller_get_path(
    controller: *const CController,
    out_coordinates: *mut *const Coordinate,
) -> usize {
    match controller.as_ref().and_then(|c| c.engine()) {
        Some(engine) => {
            let path = engine.index().path();
            if !out_coordinates.is_null() {
                *out_coordinates = path.as_ptr();
            }
            path.len()
        }
        None => {
            if !out_coordinates.is_null() {
                *out_coordinates = null();
            }
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &[u8] = include_bytes!("route/test_fixtures/directions.json");

    #[test]
    fn null_pointers_are_ignored() {
        unsafe {
            routeplay_controller_delete(null_mut());
            routeplay_controller_pause(null_mut());
            routeplay_controller_reset(null_mut());
            assert!(!routeplay_controller_play(null_mut()));
            assert!(!routeplay_controller_tick(null_mut(), 0.0));
            assert!(!routeplay_controller_can_simulate(std::ptr::null()));
            assert_eq!(
                routeplay_controller_snapshot(std::ptr::null()),
                CSnapshot::ZERO
            );
        }
    }

    #[test]
    fn play_from_memory() {
        unsafe {
            let controller = routeplay_controller_new();
            let options = CReadOptions {
                format: CFileFormat::Unknown,
                alternative: 0,
            };
            assert!(routeplay_controller_load_memory(
                controller,
                &options,
                JSON.as_ptr(),
                JSON.len()
            ));
            assert!(routeplay_controller_can_simulate(controller));

            let mut path: *const Coordinate = std::ptr::null();
            assert_eq!(routeplay_controller_get_path(controller, &mut path), 5);
            assert!(!path.is_null());

            routeplay_controller_set_speed(controller, 100.0);
            assert!(routeplay_controller_play(controller));

            let mut now = 0.0;
            while routeplay_controller_tick(controller, now) {
                now += 100.0;
            }

            let snapshot = routeplay_controller_snapshot(controller);
            assert!(!snapshot.is_playing);
            assert_eq!(snapshot.remaining_distance, 0.0);
            assert_eq!(snapshot.speed_multiplier, 100.0);
            assert_eq!(snapshot.marker_color, CongestionCategory::Low);

            routeplay_controller_delete(controller);
        }
    }

    #[test]
    fn invalid_memory_is_rejected() {
        unsafe {
            let controller = routeplay_controller_new();
            let options = CReadOptions {
                format: CFileFormat::Json,
                alternative: 0,
            };
            let data = b"not json";
            assert!(!routeplay_controller_load_memory(
                controller,
                &options,
                data.as_ptr(),
                data.len()
            ));
            assert!(!routeplay_controller_can_simulate(controller));
            routeplay_controller_delete(controller);
        }
    }
}
