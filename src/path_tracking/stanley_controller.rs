//! Stanley steering referenced at the front axle
//!
//! Ref:
//! - [Stanley: The robot that won the DARPA grand challenge](http://isl.ecst.csuchico.edu/DOCS/darpa2005/DARPA%202005%20Stanley.pdf)
//! - [Autonomous Automobile Path Tracking](https://www.ri.cmu.edu/pub_files/2009/2/Automatic_Steering_Methods_for_Autonomous_Automobile_Path_Tracking.pdf)

use serde::{Deserialize, Serialize};

use crate::common::{pi_2_pi, PathTracker, SimError, SimResult, TrackingPath};
use crate::dynamics::Vehicle;
use crate::path::get_cross_err;
use crate::path_tracking::MAX_STEER_CMD;

/// Keeps the cross-track term defined at standstill [m/s]
const SPEED_EPS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanleyConfig {
    /// Cross-track error gain
    pub k: f64,
}

impl Default for StanleyConfig {
    fn default() -> Self {
        Self { k: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub struct StanleyController {
    config: StanleyConfig,
    steer_cmd: f64,
    cte: f64,
    theta_e: f64,
}

impl StanleyController {
    pub fn new(config: StanleyConfig) -> SimResult<Self> {
        if !(config.k >= 0.0) {
            return Err(SimError::InvalidParameter(format!("Stanley gain must be non-negative, found {}", config.k)));
        }
        Ok(Self {
            config,
            steer_cmd: 0.0,
            cte: 0.0,
            theta_e: 0.0,
        })
    }

    /// Front axle cross-track error on the last update [m]
    pub fn cte(&self) -> f64 {
        self.cte
    }

    /// Heading error on the last update [rad]
    pub fn theta_e(&self) -> f64 {
        self.theta_e
    }
}

impl PathTracker for StanleyController {
    fn update(&mut self, vehicle: &Vehicle, path: &dyn TrackingPath) -> f64 {
        let front_axle = vehicle.pose_front_axle().point();
        let nearest = match path.get_nearest_pose(front_axle) {
            Some((pose, _)) => pose,
            None => return self.steer_cmd,
        };

        self.theta_e = pi_2_pi(vehicle.state.theta - nearest.theta);
        self.cte = get_cross_err(&nearest, &front_axle);
        let steer = -self.theta_e + (-self.config.k * self.cte).atan2(vehicle.state.vx + SPEED_EPS);
        self.steer_cmd = steer.clamp(-MAX_STEER_CMD, MAX_STEER_CMD);
        self.steer_cmd
    }

    fn name(&self) -> &'static str {
        "stanley"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Point2D, Pose2D};
    use crate::dynamics::{VehicleParams, VehicleState};
    use crate::path::{BSplinePath, StraightPath};

    fn vehicle_at(pose: Pose2D, vel: f64) -> Vehicle {
        Vehicle::new(VehicleState::new(pose, vel, 0.0), VehicleParams::default())
    }

    #[test]
    fn test_zero_error_fixed_point() {
        let mut controller = StanleyController::new(StanleyConfig::default()).unwrap();
        let mut path = BSplinePath::with_defaults();
        let waypoints: Vec<Point2D> = (0..10).map(|i| Point2D::new(5.0 * i as f64, 0.0)).collect();
        path.update(&waypoints);
        let steer = controller.update(&vehicle_at(Pose2D::new(10.0, 0.0, 0.0), 8.0), &path);
        assert!(steer.abs() < 1e-9);
        assert!(controller.cte().abs() < 1e-9);
    }

    #[test]
    fn test_cross_track_and_heading_terms() {
        let mut controller = StanleyController::new(StanleyConfig { k: 2.0 }).unwrap();
        let steer = controller.update(&vehicle_at(Pose2D::new(0.0, 0.5, 0.0), 10.0), &StraightPath);
        assert!((controller.cte() - 0.5).abs() < 1e-12);
        assert!((steer - (-1.0_f64).atan2(10.0 + SPEED_EPS)).abs() < 1e-12);

        let steer = controller.update(&vehicle_at(Pose2D::new(0.0, 0.0, 0.2), 10.0), &StraightPath);
        assert!((controller.theta_e() - 0.2).abs() < 1e-12);
        assert!(steer < -0.2);
    }

    #[test]
    fn test_heading_error_wrapped() {
        let mut controller = StanleyController::new(StanleyConfig::default()).unwrap();
        let theta = 2.0 * std::f64::consts::PI + 0.1;
        controller.update(&vehicle_at(Pose2D::new(0.0, 0.0, theta), 10.0), &StraightPath);
        assert!((controller.theta_e() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_holds_command_without_geometry() {
        let mut controller = StanleyController::new(StanleyConfig::default()).unwrap();
        let first = controller.update(&vehicle_at(Pose2D::new(0.0, 3.0, 0.0), 10.0), &StraightPath);
        let empty = BSplinePath::with_defaults();
        assert_eq!(controller.update(&vehicle_at(Pose2D::origin(), 10.0), &empty), first);
        assert!(first.abs() <= MAX_STEER_CMD);
    }
}
