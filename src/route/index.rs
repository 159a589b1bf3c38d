// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use super::model::{Leg, Maneuver, Route, Step};
use crate::{bearing, classify, earth_distance, CongestionCategory, Coordinate, SegmentContext};

/// Distance-indexed description of a single [Step].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepIndex {
    /// Index into the route path of the first coordinate of this step.
    pub first_coord_index: usize,

    /// Cumulative distance (meters) from the start of the route to the start of this step.
    pub start_distance: f64,

    /// Cumulative distance (meters) from the start of the route to the end of this step.
    pub end_distance: f64,

    /// Travel time over this step, in seconds.
    pub duration: f64,

    /// Travel time from the start of the route to the end of this step, in seconds.
    pub cumulative_duration: f64,

    /// Name of the road traveled on by this step.
    pub name: Option<String>,

    /// Action performed at the start of this step.
    pub maneuver: Maneuver,
}

impl StepIndex {
    /// Length of this step along the route path, in meters.
    #[inline]
    pub fn length(&self) -> f64 {
        self.end_distance - self.start_distance
    }
}

/// Position and heading at a specific distance along a route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub position: Coordinate,

    /// Bearing of the segment containing the position, in degrees.
    pub bearing: f64,

    /// Index of the segment containing the position.
    /// Segment `i` spans from the `i`-th to the `i+1`-th coordinate.
    pub segment: usize,
}

/// Read-only, distance-indexed view of a [Route], used to drive playback.
///
/// Built once per route selection with [RouteIndex::build], and never mutated afterwards;
/// selecting a different route alternative requires building a new index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteIndex {
    path: Vec<Coordinate>,
    cumulative_distance: Vec<f64>,
    steps: Vec<StepIndex>,
    congestion: BTreeMap<usize, CongestionCategory>,
    total_duration: f64,
}

impl RouteIndex {
    /// Indexes the provided [Route].
    ///
    /// Malformed data (missing geometry, annotations pointing past the end of the path,
    /// steps not found on the path) never cause a failure. Instead, the offending entries
    /// are skipped or replaced by zero-length ones, and a warning is logged.
    pub fn build(route: &Route) -> Self {
        let path = route.coordinates().to_vec();
        let cumulative_distance = build_cumulative_distance(&path);

        let mut index = Self {
            path,
            cumulative_distance,
            steps: Vec::default(),
            congestion: BTreeMap::default(),
            total_duration: 0.0,
        };

        index.add_congestion(route.legs());
        index.add_steps(route.steps());

        index.total_duration = match index.steps.last() {
            Some(last) if last.cumulative_duration > 0.0 => last.cumulative_duration,
            _ => route
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(0.0),
        };

        log::debug!(
            "indexed route: {} coordinates, {} steps, {} classified segments, {:.1} m, {:.1} s",
            index.path.len(),
            index.steps.len(),
            index.congestion.len(),
            index.total_distance(),
            index.total_duration,
        );

        index
    }

    fn add_congestion(&mut self, legs: &[Leg]) {
        let mut coord_index: usize = 0;

        for (leg_idx, leg) in legs.iter().enumerate() {
            let Some(annotation) = leg.annotation.as_ref() else {
                continue;
            };

            let segments = annotation.len();
            for k in 0..segments {
                let segment = coord_index + k;
                if segment + 1 >= self.path.len() {
                    log::warn!(
                        "leg {}: annotation for segment {} exceeds route geometry ({} coordinates) - skipping",
                        leg_idx,
                        segment,
                        self.path.len(),
                    );
                    continue;
                }

                let context = SegmentContext {
                    speed_mps: annotation.speed.get(k).copied().flatten(),
                    max_speed_mps: annotation.maxspeed.get(k).and_then(|m| m.to_mps()),
                    distance_m: annotation.distance.get(k).copied().flatten(),
                    duration_s: annotation.duration.get(k).copied().flatten(),
                };
                let label = annotation.congestion.get(k).and_then(|l| l.as_deref());
                let numeric = annotation.congestion_numeric.get(k).copied().flatten();

                self.congestion
                    .insert(segment, classify(label, numeric, Some(&context)));
            }

            coord_index += segments;
        }
    }

    fn add_steps<'a, I: IntoIterator<Item = &'a Step>>(&mut self, steps: I) {
        let mut search_from: usize = 0;
        let mut cumulative_duration: f64 = 0.0;

        for (step_idx, step) in steps.into_iter().enumerate() {
            let duration = step
                .duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .unwrap_or(0.0);
            cumulative_duration += duration;

            let coords = step.coordinates();
            let (first, last) = match coords.first() {
                None => {
                    log::warn!("step {}: no geometry - treating as zero-length", step_idx);
                    (search_from, search_from)
                }

                Some(&head) => match self.find_coord_from(search_from, head) {
                    Some(first) => (first, self.find_step_end(first, coords)),
                    None => {
                        log::warn!(
                            "step {}: first coordinate not found on route geometry - treating as zero-length",
                            step_idx,
                        );
                        (search_from, search_from)
                    }
                },
            };

            self.steps.push(StepIndex {
                first_coord_index: first,
                start_distance: self.distance_at_coord(first),
                end_distance: self.distance_at_coord(last),
                duration,
                cumulative_duration,
                name: step.name.clone(),
                maneuver: step.maneuver.clone().unwrap_or_default(),
            });

            search_from = last;
        }
    }

    /// Finds the path index of the last coordinate of a step starting at path index `first`.
    ///
    /// Repeated step coordinates (like the `[p, p]` geometry of an "arrive" step)
    /// don't advance along the path.
    fn find_step_end(&self, first: usize, coords: &[Coordinate]) -> usize {
        let last_coord_index = self.path.len().saturating_sub(1);
        let Some(&tail) = coords.last() else {
            return first;
        };

        let advance = coords
            .windows(2)
            .filter(|pair| !pair[0].same_position(pair[1]))
            .count();
        let candidate = (first + advance).min(last_coord_index);

        if self.path[candidate].same_position(tail) {
            candidate
        } else {
            self.find_coord_from(first, tail).unwrap_or(candidate)
        }
    }

    /// Finds the first path index, not smaller than `from`, with the provided position.
    fn find_coord_from(&self, from: usize, c: Coordinate) -> Option<usize> {
        self.path
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(idx, &p)| if p.same_position(c) { Some(idx) } else { None })
    }

    fn distance_at_coord(&self, idx: usize) -> f64 {
        self.cumulative_distance.get(idx).copied().unwrap_or(0.0)
    }

    /// Returns the full route geometry.
    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    /// Returns the distance (meters) from the start of the route to every coordinate of the path.
    pub fn cumulative_distance(&self) -> &[f64] {
        &self.cumulative_distance
    }

    pub fn steps(&self) -> &[StepIndex] {
        &self.steps
    }

    /// Length of the route, in meters.
    pub fn total_distance(&self) -> f64 {
        self.cumulative_distance.last().copied().unwrap_or(0.0)
    }

    /// Travel time over the route, in seconds, or zero if unknown.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Checks if playback along this route is possible at all.
    pub fn can_simulate(&self) -> bool {
        self.path.len() >= 2 && self.total_distance() > 0.0
    }

    /// Returns the [CongestionCategory] of a segment (spanning from the `segment`-th
    /// to the `segment+1`-th coordinate). Segments without annotations are
    /// [CongestionCategory::Unknown].
    pub fn congestion_at_segment(&self, segment: usize) -> CongestionCategory {
        self.congestion.get(&segment).copied().unwrap_or_default()
    }

    /// Returns the [CongestionCategory] of the segment at a specific distance along the route.
    pub fn congestion_at_distance(&self, distance: f64) -> CongestionCategory {
        self.congestion_at_segment(self.segment_at(distance))
    }

    /// Groups consecutive classified segments into `(first_segment, last_segment, category)` runs,
    /// suitable for rendering a colored route overview.
    pub fn congestion_runs(&self) -> Vec<(usize, usize, CongestionCategory)> {
        let mut runs: Vec<(usize, usize, CongestionCategory)> = Vec::default();

        for (&segment, &category) in &self.congestion {
            match runs.last_mut() {
                Some((_, end, c)) if *c == category && *end + 1 == segment => *end = segment,
                _ => runs.push((segment, segment, category)),
            }
        }

        runs
    }

    /// Returns the index of the segment containing a specific distance along the route.
    ///
    /// Distances before the start belong to the first segment, and distances past the end
    /// belong to the last segment. Routes with less than 2 coordinates have no segments,
    /// and this function always returns 0.
    pub fn segment_at(&self, distance: f64) -> usize {
        let n = self.cumulative_distance.len();
        if n < 2 {
            return 0;
        }

        // First index with cumulative distance >= distance is the end of the segment.
        let end = self
            .cumulative_distance
            .partition_point(|&d| d < distance)
            .clamp(1, n - 1);
        end - 1
    }

    /// Computes the position and bearing at a specific distance along the route,
    /// clamped to the route's start and end.
    ///
    /// Returns `None` if the route has less than 2 coordinates.
    pub fn sample(&self, distance: f64) -> Option<Sample> {
        let n = self.path.len();
        if n < 2 {
            return None;
        }

        if distance <= 0.0 {
            return Some(Sample {
                position: self.path[0],
                bearing: bearing(self.path[0], self.path[1]),
                segment: 0,
            });
        }

        if distance >= self.total_distance() {
            return Some(Sample {
                position: self.path[n - 1],
                bearing: bearing(self.path[n - 2], self.path[n - 1]),
                segment: n - 2,
            });
        }

        let segment = self.segment_at(distance);
        let start = self.path[segment];
        let end = self.path[segment + 1];
        let start_distance = self.cumulative_distance[segment];
        let segment_length = self.cumulative_distance[segment + 1] - start_distance;
        let t = if segment_length > 0.0 {
            (distance - start_distance) / segment_length
        } else {
            0.0
        };

        Some(Sample {
            position: start.lerp(end, t),
            bearing: bearing(start, end),
            segment,
        })
    }
}

fn build_cumulative_distance(path: &[Coordinate]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(path.len());
    let mut total: f64 = 0.0;

    if !path.is_empty() {
        cumulative.push(0.0);
    }

    for pair in path.windows(2) {
        total += earth_distance(pair[0], pair[1]);
        cumulative.push(total);
    }

    cumulative
}
