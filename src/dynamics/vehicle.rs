//! Vehicle state and physical parameters
//!
//! The state is expressed at the centre of gravity (CG). Axle poses are derived
//! by composing a longitudinal offset in the body frame.

use serde::{Deserialize, Serialize};

use crate::common::{add_body_frame, Point2D, Pose2D, SimError, SimResult};

/// Physical parameters of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Mass [kg]
    pub m: f64,
    /// Yaw inertia [kg * m^2]
    pub iz: f64,
    /// Distance from CG to front axle [m]
    pub lf: f64,
    /// Distance from CG to rear axle [m]
    pub lr: f64,
    /// Front cornering stiffness [N / rad]
    pub cf: f64,
    /// Rear cornering stiffness [N / rad]
    pub cr: f64,
    /// Maximum steering angle [rad]
    pub delta_max: f64,
    /// Maximum steering rate [rad / s]
    pub delta_rate_max: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            m: 2000.0,
            iz: 4000.0,
            lf: 1.5,
            lr: 1.5,
            cf: 1e5,
            cr: 1e5,
            delta_max: 40.0_f64.to_radians(),
            delta_rate_max: 2.0,
        }
    }
}

impl VehicleParams {
    pub fn wheel_base(&self) -> f64 {
        self.lf + self.lr
    }

    /// Check every parameter is strictly positive and finite
    pub fn validate(&self) -> SimResult<()> {
        let fields = [
            ("m", self.m),
            ("iz", self.iz),
            ("lf", self.lf),
            ("lr", self.lr),
            ("cf", self.cf),
            ("cr", self.cr),
            ("delta_max", self.delta_max),
            ("delta_rate_max", self.delta_rate_max),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidParameter(format!(
                    "vehicle parameter `{}` must be positive, found {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Mutable vehicle state at the CG
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    pub x: f64,
    pub y: f64,
    /// Heading [rad]
    pub theta: f64,
    /// Steering angle [rad]
    pub delta: f64,
    /// Body-frame longitudinal velocity [m/s]
    pub vx: f64,
    /// Body-frame lateral velocity [m/s]
    pub vy: f64,
    /// Yaw rate [rad/s]
    pub thetadot: f64,
}

impl VehicleState {
    /// State at `pose` travelling at `vel` with sideslip `beta`
    pub fn new(pose: Pose2D, vel: f64, beta: f64) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            theta: pose.theta,
            vx: vel * beta.cos(),
            vy: vel * beta.sin(),
            ..Default::default()
        }
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.theta)
    }
}

/// A vehicle: its current state plus the parameters it was built with
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vehicle {
    pub state: VehicleState,
    pub params: VehicleParams,
}

impl Vehicle {
    pub fn new(state: VehicleState, params: VehicleParams) -> Self {
        Self { state, params }
    }

    pub fn pose(&self) -> Pose2D {
        self.state.pose()
    }

    pub fn point(&self) -> Point2D {
        Point2D::new(self.state.x, self.state.y)
    }

    pub fn pose_rear_axle(&self) -> Pose2D {
        add_body_frame(&self.pose(), &Pose2D::new(-self.params.lr, 0.0, 0.0))
    }

    pub fn pose_front_axle(&self) -> Pose2D {
        add_body_frame(&self.pose(), &Pose2D::new(self.params.lf, 0.0, 0.0))
    }

    /// Speed of the CG [m/s]
    pub fn vel_cog_mag(&self) -> f64 {
        self.state.vx.hypot(self.state.vy)
    }
}

/// Steering input to a motion model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteerCommand {
    /// Steering rate [rad/s], integrated into the steering angle
    Rate(f64),
    /// Steering angle [rad], applied directly
    Angle(f64),
}

/// Actuator-level command for one integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleCommand {
    /// Longitudinal velocity [m/s]
    pub vel: f64,
    pub steer: SteerCommand,
}

impl VehicleCommand {
    pub fn with_steer_rate(vel: f64, steer_rate: f64) -> Self {
        Self { vel, steer: SteerCommand::Rate(steer_rate) }
    }

    pub fn with_steer_angle(vel: f64, delta: f64) -> Self {
        Self { vel, steer: SteerCommand::Angle(delta) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = VehicleParams::default();
        assert!(params.validate().is_ok());
        assert!((params.wheel_base() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = VehicleParams { m: 0.0, ..Default::default() };
        assert!(matches!(params.validate(), Err(SimError::InvalidParameter(_))));

        let params = VehicleParams { cr: f64::NAN, ..Default::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_axle_poses() {
        let state = VehicleState::new(Pose2D::new(10.0, 5.0, 0.0), 8.0, 0.0);
        let vehicle = Vehicle::new(state, VehicleParams::default());
        let rear = vehicle.pose_rear_axle();
        let front = vehicle.pose_front_axle();
        assert!((rear.x - 8.5).abs() < 1e-12);
        assert!((front.x - 11.5).abs() < 1e-12);
        assert!((rear.y - 5.0).abs() < 1e-12);
        assert!((vehicle.vel_cog_mag() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_state_from_sideslip() {
        let state = VehicleState::new(Pose2D::origin(), 2.0, std::f64::consts::FRAC_PI_6);
        assert!((state.vx - 3.0_f64.sqrt()).abs() < 1e-12);
        assert!((state.vy - 1.0).abs() < 1e-12);
    }
}
