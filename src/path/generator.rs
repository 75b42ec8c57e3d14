//! Waypoint sources that feed a path every tick
//!
//! A [`WaypointWindow`] keeps the last few positions of a moving "live" point;
//! [`SinusoidGenerator`] drives such a window with a point that scrolls along
//! x at constant speed while oscillating laterally.

use std::collections::VecDeque;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::common::{Point2D, SimError, SimResult};

/// Sliding window over a moving point
#[derive(Debug, Clone)]
pub struct WaypointWindow {
    max_path_length: usize,
    update_rate_s: f64,
    points: VecDeque<Point2D>,
    last_append_s: f64,
}

impl WaypointWindow {
    pub fn new(max_path_length: usize, update_rate_s: f64) -> SimResult<Self> {
        if max_path_length == 0 {
            return Err(SimError::InvalidParameter("max_path_length must be at least 1".to_string()));
        }
        if !(update_rate_s.is_finite() && update_rate_s > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "update_rate_s must be positive, found {}",
                update_rate_s
            )));
        }
        Ok(Self {
            max_path_length,
            update_rate_s,
            points: VecDeque::with_capacity(max_path_length + 1),
            last_append_s: 0.0,
        })
    }

    /// Record `live` if `update_rate_s` has elapsed since the last record and
    /// return the stored points followed by `live`.
    ///
    /// The window is trimmed after the list is emitted, so a returned list
    /// holds at most `max_path_length + 2` points.
    pub fn update(&mut self, time_s: f64, live: Point2D) -> Vec<Point2D> {
        if time_s - self.last_append_s > self.update_rate_s {
            self.points.push_back(live);
            self.last_append_s = time_s;
        }
        let mut waypoints: Vec<Point2D> = self.points.iter().copied().collect();
        waypoints.push(live);
        if self.points.len() > self.max_path_length {
            self.points.pop_front();
        }
        waypoints
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.last_append_s = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinusoidParams {
    pub max_path_length: usize,
    pub update_rate_s: f64,
    /// Peak-to-peak lateral excursion [m]
    pub sin_height: f64,
    /// [s]
    pub sin_period: f64,
    /// x of the live point at time zero [m]
    pub lead_distance: f64,
    /// Speed at which the live point advances along x [m/s]
    pub scroll_speed: f64,
    pub centre_y: f64,
}

impl Default for SinusoidParams {
    fn default() -> Self {
        Self {
            max_path_length: 13,
            update_rate_s: 0.2,
            sin_height: 8.0,
            sin_period: 4.0,
            lead_distance: 20.0,
            scroll_speed: 10.0,
            centre_y: 0.0,
        }
    }
}

/// Emits a waypoint list tracing `y = centre + (height / 2) * cos(2 pi t / period)`
#[derive(Debug, Clone)]
pub struct SinusoidGenerator {
    params: SinusoidParams,
    window: WaypointWindow,
}

impl SinusoidGenerator {
    pub fn new(params: SinusoidParams) -> SimResult<Self> {
        if !(params.sin_period.is_finite() && params.sin_period > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "sin_period must be positive, found {}",
                params.sin_period
            )));
        }
        let window = WaypointWindow::new(params.max_path_length, params.update_rate_s)?;
        Ok(Self { params, window })
    }

    pub fn params(&self) -> &SinusoidParams {
        &self.params
    }

    /// Live point at `time_s`
    pub fn live_point(&self, time_s: f64) -> Point2D {
        let p = &self.params;
        let y = p.centre_y + 0.5 * p.sin_height * (2.0 * PI * time_s / p.sin_period).cos();
        Point2D::new(p.lead_distance + p.scroll_speed * time_s, y)
    }

    pub fn update(&mut self, time_s: f64) -> Vec<Point2D> {
        let live = self.live_point(time_s);
        self.window.update(time_s, live)
    }
}
