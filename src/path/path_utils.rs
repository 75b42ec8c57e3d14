//! Helpers for errors measured against a path pose

use std::f64::consts::FRAC_PI_2;

use crate::common::{unit_vec2, Point2D, Pose2D};

/// Unit normal pointing to the left of the path direction
pub fn get_path_unit_norm(path_pose: &Pose2D) -> Point2D {
    unit_vec2(path_pose.theta + FRAC_PI_2)
}

/// Signed lateral offset of `point` from `path_pose`, positive to the left
pub fn get_cross_err(path_pose: &Pose2D, point: &Point2D) -> f64 {
    (*point - path_pose.point()).dot(&get_path_unit_norm(path_pose))
}
