//! LQR steering control on a lateral error model
//!
//! Error state: `[cte, cte_dot, theta_e, theta_e_dot]`. Two plant models are
//! available: a kinematic one referenced at the rear axle, and the linear-tire
//! dynamic lateral error model referenced at the CG.
//!
//! Ref:
//! - Rajamani, Vehicle Dynamics and Control, sec. 2.5 and 3.2

use std::time::Instant;

use log::{error, trace};
use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

use crate::common::{pi_2_pi, PathTracker, SimError, SimResult, TrackingPath};
use crate::control::lqr_control::{is_positive_definite, GainCache};
use crate::dynamics::{floor_speed, Vehicle, VehicleParams, MIN_LONGITUDINAL_SPEED};
use crate::path::get_cross_err;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LqrModel {
    Kinematic,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LqrConfig {
    pub model: LqrModel,
    /// State cost, row-major
    pub q: [[f64; 4]; 4],
    /// Input cost
    pub r: f64,
    /// Discretisation step of the error model [s]
    pub dt: f64,
    pub cache_capacity: usize,
    /// Speed grid of the gain cache key [m/s]
    pub quantization: f64,
}

impl Default for LqrConfig {
    fn default() -> Self {
        Self {
            model: LqrModel::Kinematic,
            q: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            r: 1.0,
            dt: 1.0 / 60.0,
            cache_capacity: GainCache::DEFAULT_CAPACITY,
            quantization: GainCache::DEFAULT_QUANTIZATION,
        }
    }
}

impl LqrConfig {
    pub fn q_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_fn(|i, j| self.q[i][j])
    }
}

/// Quantities computed on the last update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LqrDiagnostics {
    pub cte: f64,
    pub cte_dot: f64,
    pub theta_e: f64,
    pub theta_e_dot: f64,
    pub curv_ref: f64,
    pub solve_time_ms: f64,
    pub cache_hit: bool,
}

#[derive(Debug, Clone)]
pub struct LqrSteerController {
    config: LqrConfig,
    q: Matrix4<f64>,
    cache: GainCache,
    steer_cmd: f64,
    diagnostics: LqrDiagnostics,
}

/// Kinematic lateral error model at speed `v`
fn kinematic_model(v: f64, wheel_base: f64, dt: f64) -> (Matrix4<f64>, Vector4<f64>) {
    let a = Matrix4::new(
        1.0, dt, 0.0, 0.0,
        0.0, 0.0, v, 0.0,
        0.0, 0.0, 1.0, dt,
        0.0, 0.0, 0.0, 0.0,
    );
    let b = Vector4::new(0.0, 0.0, 0.0, v / wheel_base);
    (a, b)
}

/// Dynamic lateral error model at longitudinal speed `vx`, forward-Euler
/// discretised
fn dynamic_model(p: &VehicleParams, vx: f64, dt: f64) -> (Matrix4<f64>, Vector4<f64>) {
    let (m, iz, lf, lr, cf, cr) = (p.m, p.iz, p.lf, p.lr, p.cf, p.cr);
    let a = Matrix4::new(
        0.0, 1.0, 0.0, 0.0,
        0.0, -(cf + cr) / (m * vx), (cf + cr) / m, (lr * cr - lf * cf) / (m * vx),
        0.0, 0.0, 0.0, 1.0,
        0.0, (lr * cr - lf * cf) / (iz * vx), (lf * cf - lr * cr) / iz, -(lf * lf * cf + lr * lr * cr) / (iz * vx),
    );
    let b = Vector4::new(0.0, cf / m, 0.0, lf * cf / iz);
    (Matrix4::identity() + a * dt, b * dt)
}

impl LqrSteerController {
    pub fn new(config: LqrConfig) -> SimResult<Self> {
        let q = config.q_matrix();
        if !is_positive_definite(&q) {
            return Err(SimError::InvalidParameter("LQR state cost Q must be positive definite".to_string()));
        }
        if !(config.r.is_finite() && config.r > 0.0) {
            return Err(SimError::InvalidParameter(format!("LQR input cost R must be positive, found {}", config.r)));
        }
        if !(config.dt.is_finite() && config.dt > 0.0) {
            return Err(SimError::InvalidParameter(format!("LQR model step must be positive, found {}", config.dt)));
        }
        let cache = GainCache::new(config.cache_capacity, config.quantization)?;
        Ok(Self {
            config,
            q,
            cache,
            steer_cmd: 0.0,
            diagnostics: LqrDiagnostics::default(),
        })
    }

    pub fn config(&self) -> &LqrConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &LqrDiagnostics {
        &self.diagnostics
    }

    pub fn cache(&self) -> &GainCache {
        &self.cache
    }

    /// Steering that holds the vehicle on a path of curvature `curv` with zero
    /// error. `k3` is the gain on the heading error.
    fn feedforward(&self, params: &VehicleParams, vx: f64, curv: f64, k3: f64) -> f64 {
        let l = params.wheel_base();
        match self.config.model {
            LqrModel::Kinematic => (l * curv).atan2(1.0),
            LqrModel::Dynamic => {
                let (m, lf, lr, cf, cr) = (params.m, params.lf, params.lr, params.cf, params.cr);
                let understeer = lr * m / (cf * l) - lf * m / (cr * l);
                let vx2 = vx * vx;
                l * curv + understeer * vx2 * curv - k3 * (lr * curv - lf * m * vx2 * curv / (cr * l))
            }
        }
    }

    fn compute(&mut self, vehicle: &Vehicle, path: &dyn TrackingPath) -> SimResult<Option<f64>> {
        let params = &vehicle.params;
        let state = &vehicle.state;
        let reference = match self.config.model {
            LqrModel::Kinematic => vehicle.pose_rear_axle().point(),
            LqrModel::Dynamic => vehicle.point(),
        };
        let (nearest, station) = match path.get_nearest_pose(reference) {
            Some(found) => found,
            None => return Ok(None),
        };

        let curv_ref = path.get_curv_at_station(station);
        let cte = get_cross_err(&nearest, &reference);
        let theta_e = pi_2_pi(state.theta - nearest.theta);
        let cte_dot = state.vx * theta_e.sin() + state.vy * theta_e.cos();

        let dt = self.config.dt;
        let r = self.config.r;
        let start = Instant::now();
        let (speed, (k, cache_hit)) = match self.config.model {
            LqrModel::Kinematic => {
                let v = vehicle.vel_cog_mag().max(MIN_LONGITUDINAL_SPEED);
                let wheel_base = params.wheel_base();
                (v, self.cache.gain(v, |s| kinematic_model(s, wheel_base, dt), &self.q, r)?)
            }
            LqrModel::Dynamic => {
                let vx = floor_speed(state.vx);
                (vx, self.cache.gain(vx, |s| dynamic_model(params, s, dt), &self.q, r)?)
            }
        };
        let solve_time_ms = start.elapsed().as_secs_f64() * 1e3;
        let theta_e_dot = state.thetadot - speed * curv_ref;

        let x = Vector4::new(cte, cte_dot, theta_e, theta_e_dot);
        let ff = self.feedforward(params, speed, curv_ref, k[2]);
        // no angle wrap: large errors must keep the sign of -K x
        let fb = -(k * x)[0];

        self.diagnostics = LqrDiagnostics {
            cte,
            cte_dot,
            theta_e,
            theta_e_dot,
            curv_ref,
            solve_time_ms,
            cache_hit,
        };
        trace!("lqr: x = {:?}, ff {:.4}, fb {:.4}", x.as_slice(), ff, fb);
        Ok(Some((ff + fb).clamp(-params.delta_max, params.delta_max)))
    }
}

impl PathTracker for LqrSteerController {
    fn update(&mut self, vehicle: &Vehicle, path: &dyn TrackingPath) -> f64 {
        match self.compute(vehicle, path) {
            Ok(Some(steer)) => self.steer_cmd = steer,
            Ok(None) => {}
            Err(e) => error!("LQR steering failed, holding the previous command: {}", e),
        }
        self.steer_cmd
    }

    fn name(&self) -> &'static str {
        match self.config.model {
            LqrModel::Kinematic => "lqr (kinematic)",
            LqrModel::Dynamic => "lqr (dynamic)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{add_body_frame, Point2D, Pose2D};
    use crate::dynamics::VehicleState;
    use crate::path::{BSplinePath, PathConfig, SplineFit, StraightPath};

    fn vehicle_at(pose: Pose2D, vel: f64) -> Vehicle {
        Vehicle::new(VehicleState::new(pose, vel, 0.0), VehicleParams::default())
    }

    fn controller(model: LqrModel) -> LqrSteerController {
        LqrSteerController::new(LqrConfig { model, ..Default::default() }).unwrap()
    }

    #[test]
    fn test_zero_error_fixed_point_both_models() {
        let mut path = BSplinePath::with_defaults();
        let waypoints: Vec<Point2D> = (0..10).map(|i| Point2D::new(5.0 * i as f64, 0.0)).collect();
        path.update(&waypoints);
        for model in [LqrModel::Kinematic, LqrModel::Dynamic] {
            let mut lqr = controller(model);
            let steer = lqr.update(&vehicle_at(Pose2D::new(12.0, 0.0, 0.0), 10.0), &path);
            assert!(steer.abs() < 1e-9, "{:?}: {}", model, steer);
            let d = lqr.diagnostics();
            assert!(d.cte.abs() < 1e-9 && d.theta_e.abs() < 1e-9 && d.curv_ref.abs() < 1e-9);
        }
    }

    #[test]
    fn test_steers_back_towards_path() {
        for model in [LqrModel::Kinematic, LqrModel::Dynamic] {
            let mut lqr = controller(model);
            let left = lqr.update(&vehicle_at(Pose2D::new(0.0, 1.0, 0.0), 10.0), &StraightPath);
            assert!(left < 0.0, "{:?}: {}", model, left);
            assert!((lqr.diagnostics().cte - 1.0).abs() < 1e-12);

            let mut lqr = controller(model);
            let right = lqr.update(&vehicle_at(Pose2D::new(0.0, -1.0, 0.0), 10.0), &StraightPath);
            assert!(right > 0.0, "{:?}: {}", model, right);
        }
    }

    #[test]
    fn test_large_errors_keep_feedback_sign() {
        for model in [LqrModel::Kinematic, LqrModel::Dynamic] {
            let mut lqr = controller(model);
            let far_left = lqr.update(&vehicle_at(Pose2D::new(0.0, 6.0, 0.0), 10.0), &StraightPath);
            assert!(far_left < 0.0, "{:?}: {}", model, far_left);

            let mut lqr = controller(model);
            let far_right = lqr.update(&vehicle_at(Pose2D::new(0.0, -6.0, 0.0), 10.0), &StraightPath);
            assert!(far_right > 0.0, "{:?}: {}", model, far_right);

            let mut lqr = controller(model);
            let yawed_left = lqr.update(&vehicle_at(Pose2D::new(0.0, 0.0, 1.5), 10.0), &StraightPath);
            assert!(yawed_left < 0.0, "{:?}: {}", model, yawed_left);
            assert_eq!(yawed_left, -VehicleParams::default().delta_max);
        }
    }

    #[test]
    fn test_kinematic_feedforward_on_circle() {
        let radius = 30.0;
        let waypoints: Vec<Point2D> = (0..25)
            .map(|i| {
                let a = -std::f64::consts::FRAC_PI_2 + 0.1 * i as f64;
                Point2D::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        let mut path = BSplinePath::new(PathConfig {
            fit: SplineFit::Interpolate { smoothness: 0.0 },
            ..Default::default()
        })
        .unwrap();
        path.update(&waypoints);

        let mut lqr = controller(LqrModel::Kinematic);
        let (pose, _) = path.get_nearest_pose(Point2D::new(radius, 0.0)).unwrap();
        // rear axle on the path, yawing at the rate the path demands
        let mut vehicle = vehicle_at(add_body_frame(&pose, &Pose2D::new(1.5, 0.0, 0.0)), 5.0);
        vehicle.state.thetadot = 5.0 / radius;
        let steer = lqr.update(&vehicle, &path);

        let d = lqr.diagnostics();
        assert!((d.curv_ref - 1.0 / radius).abs() < 1e-3);
        assert!(d.cte.abs() < 1e-9 && d.theta_e.abs() < 1e-9 && d.cte_dot.abs() < 1e-9);
        let ff = (3.0 / radius).atan();
        assert!(steer > 0.0);
        assert!((steer - ff).abs() < 0.02);
    }

    #[test]
    fn test_gain_cache_reused_across_ticks() {
        let mut lqr = controller(LqrModel::Dynamic);
        let vehicle = vehicle_at(Pose2D::new(0.0, 0.3, 0.0), 12.0);
        lqr.update(&vehicle, &StraightPath);
        assert!(!lqr.diagnostics().cache_hit);
        lqr.update(&vehicle, &StraightPath);
        assert!(lqr.diagnostics().cache_hit);
        assert_eq!(lqr.cache().hits(), 1);
        assert_eq!(lqr.cache().misses(), 1);
    }

    #[test]
    fn test_command_within_steer_limit() {
        let mut lqr = controller(LqrModel::Kinematic);
        let vehicle = vehicle_at(Pose2D::new(0.0, -40.0, 1.0), 10.0);
        let steer = lqr.update(&vehicle, &StraightPath);
        assert!(steer.abs() <= vehicle.params.delta_max);
    }

    #[test]
    fn test_holds_command_without_geometry() {
        let mut lqr = controller(LqrModel::Kinematic);
        let first = lqr.update(&vehicle_at(Pose2D::new(0.0, 1.0, 0.0), 10.0), &StraightPath);
        let empty = BSplinePath::with_defaults();
        assert_eq!(lqr.update(&vehicle_at(Pose2D::origin(), 10.0), &empty), first);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut config = LqrConfig::default();
        config.q[1][1] = 0.0;
        assert!(matches!(LqrSteerController::new(config), Err(SimError::InvalidParameter(_))));

        let config = LqrConfig { r: 0.0, ..Default::default() };
        assert!(LqrSteerController::new(config).is_err());
        let config = LqrConfig { dt: 0.0, ..Default::default() };
        assert!(LqrSteerController::new(config).is_err());
    }
}
