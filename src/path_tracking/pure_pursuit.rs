//! Pure pursuit steering referenced at the rear axle
//!
//! The steering angle is chosen so the rear axle follows a circular arc
//! through a lookahead point on the path.
//!
//! Ref:
//! - [Implementation of the Pure Pursuit Path Tracking Algorithm](https://www.ri.cmu.edu/pub_files/pub3/coulter_r_craig_1992_1/coulter_r_craig_1992_1.pdf)

use log::trace;
use serde::{Deserialize, Serialize};

use crate::common::{PathTracker, Pose2D, SimError, SimResult, TrackingPath};
use crate::dynamics::Vehicle;
use crate::path_tracking::MAX_STEER_CMD;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurePursuitConfig {
    /// Lookahead distance per unit of longitudinal speed [s]
    pub lookahead_k: f64,
    /// Lower bound on the lookahead distance [m]
    pub min_lookahead: f64,
}

impl Default for PurePursuitConfig {
    fn default() -> Self {
        Self {
            lookahead_k: 0.7,
            min_lookahead: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PurePursuitController {
    config: PurePursuitConfig,
    steer_cmd: f64,
    lookahead_pose: Option<Pose2D>,
    alpha: f64,
}

impl PurePursuitController {
    pub fn new(config: PurePursuitConfig) -> SimResult<Self> {
        if !(config.lookahead_k >= 0.0 && config.min_lookahead >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "lookahead parameters must be non-negative, found k = {} and min = {}",
                config.lookahead_k, config.min_lookahead
            )));
        }
        Ok(Self {
            config,
            steer_cmd: 0.0,
            lookahead_pose: None,
            alpha: 0.0,
        })
    }

    pub fn config(&self) -> &PurePursuitConfig {
        &self.config
    }

    /// Path pose targeted on the last update
    pub fn lookahead_pose(&self) -> Option<Pose2D> {
        self.lookahead_pose
    }

    /// Bearing of the lookahead point from the rear axle, body frame [rad]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl PathTracker for PurePursuitController {
    fn update(&mut self, vehicle: &Vehicle, path: &dyn TrackingPath) -> f64 {
        let rear_axle = vehicle.pose_rear_axle();
        let station = match path.get_nearest_pose(rear_axle.point()) {
            Some((_, station)) => station,
            None => return self.steer_cmd,
        };

        let lookahead = (vehicle.state.vx * self.config.lookahead_k).max(self.config.min_lookahead);
        let target = match path.get_pose_at_station(station + lookahead) {
            Some(pose) => pose,
            None => return self.steer_cmd,
        };
        self.lookahead_pose = Some(target);

        let local = (target.point() - rear_axle.point()).rot(-vehicle.state.theta);
        let dist = local.norm();
        if dist < 1e-9 {
            return self.steer_cmd;
        }
        self.alpha = local.y.atan2(local.x);

        // atan(L / R) with the arc radius R = d / (2 sin(alpha))
        let steer = (2.0 * vehicle.params.wheel_base() * self.alpha.sin() / dist).atan();
        self.steer_cmd = steer.clamp(-MAX_STEER_CMD, MAX_STEER_CMD);
        trace!("pure pursuit: lookahead {:.2} m, alpha {:.3} rad, steer {:.3} rad", dist, self.alpha, self.steer_cmd);
        self.steer_cmd
    }

    fn name(&self) -> &'static str {
        "pure pursuit"
    }
}
