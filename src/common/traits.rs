//! Common traits defining the seams between motion models, paths and
//! controllers

use crate::common::types::*;
use crate::dynamics::{Vehicle, VehicleCommand, VehicleState};

/// Trait for vehicle motion models
pub trait MotionModel {
    /// Integrate `vehicle` forward by `dt` under `command`.
    ///
    /// `dt` must be positive. The returned state has its steering angle
    /// clamped to the vehicle's limits.
    fn update(&self, vehicle: &Vehicle, command: &VehicleCommand, dt: f64) -> VehicleState;
}

/// Trait for reference paths that can be tracked by a controller
pub trait TrackingPath {
    /// Rebuild the path geometry from the given waypoints
    fn update(&mut self, waypoints: &[Point2D]);

    /// Sampled pose closest to `point` and its station, `None` without geometry
    fn get_nearest_pose(&self, point: Point2D) -> Option<(Pose2D, f64)>;

    /// First sampled pose at or beyond `station`, clamped to the path end
    fn get_pose_at_station(&self, station: f64) -> Option<Pose2D>;

    /// Signed curvature [1/m] at `station`, zero where undefined
    fn get_curv_at_station(&self, station: f64) -> f64;

    /// Station of the last sample, `None` for unbounded or empty paths
    fn end_station(&self) -> Option<f64>;

    /// Sampled poses, for drawing
    fn samples(&self) -> &[Pose2D];
}

/// Trait for path tracking/following algorithms
pub trait PathTracker {
    /// Compute the desired steering angle [rad] to follow `path`.
    ///
    /// Returns the previously held command when the path has no geometry.
    fn update(&mut self, vehicle: &Vehicle, path: &dyn TrackingPath) -> f64;

    /// Human readable controller name
    fn name(&self) -> &'static str;
}
