//! Kinematic bicycle model referenced at the CG
//!
//! Integrated state: `[x, y, theta, delta]`. The sideslip angle follows from
//! the steering angle, `beta = atan(lr * tan(delta) / L)`.

use nalgebra::Vector4;

use crate::common::MotionModel;
use crate::dynamics::{steer_input, IntegrationScheme, Vehicle, VehicleCommand, VehicleState};

#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicBicycleModel {
    pub scheme: IntegrationScheme,
}

impl KinematicBicycleModel {
    pub fn new(scheme: IntegrationScheme) -> Self {
        Self { scheme }
    }
}

fn sideslip(delta: f64, lr: f64, wheel_base: f64) -> f64 {
    (lr * delta.tan() / wheel_base).atan()
}

impl MotionModel for KinematicBicycleModel {
    fn update(&self, vehicle: &Vehicle, command: &VehicleCommand, dt: f64) -> VehicleState {
        let params = &vehicle.params;
        let lr = params.lr;
        let wb = params.wheel_base();
        let v = command.vel;
        let (delta0, steer_rate) = steer_input(vehicle.state.delta, command.steer);

        let f = |z: &Vector4<f64>| {
            let beta = sideslip(z[3], lr, wb);
            Vector4::new(
                v * (z[2] + beta).cos(),
                v * (z[2] + beta).sin(),
                v * z[3].tan() * beta.cos() / wb,
                steer_rate,
            )
        };

        let z0 = Vector4::new(vehicle.state.x, vehicle.state.y, vehicle.state.theta, delta0);
        let z = self.scheme.integrate(f, &z0, dt);

        let delta = z[3].clamp(-params.delta_max, params.delta_max);
        let beta = sideslip(delta, lr, wb);
        VehicleState {
            x: z[0],
            y: z[1],
            theta: z[2],
            delta,
            vx: v * beta.cos(),
            vy: v * beta.sin(),
            thetadot: v * delta.tan() * beta.cos() / wb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose2D;
    use crate::dynamics::VehicleParams;

    fn vehicle_at(theta: f64, vel: f64) -> Vehicle {
        Vehicle::new(VehicleState::new(Pose2D::new(0.0, 0.0, theta), vel, 0.0), VehicleParams::default())
    }

    #[test]
    fn test_straight_line_all_schemes() {
        let theta = 0.4;
        let v = 5.0;
        let dt = 0.05;
        for scheme in [IntegrationScheme::Euler, IntegrationScheme::Rk4, IntegrationScheme::rk45()] {
            let model = KinematicBicycleModel::new(scheme);
            let mut vehicle = vehicle_at(theta, v);
            for _ in 0..40 {
                vehicle.state = model.update(&vehicle, &VehicleCommand::with_steer_rate(v, 0.0), dt);
            }
            // 40 * 0.05 s = 2 s
            assert!((vehicle.state.x - 2.0 * v * theta.cos()).abs() < 1e-9);
            assert!((vehicle.state.y - 2.0 * v * theta.sin()).abs() < 1e-9);
            assert!((vehicle.state.theta - theta).abs() < 1e-12);
            assert!((vehicle.state.vx - v).abs() < 1e-12);
            assert_eq!(vehicle.state.vy, 0.0);
        }
    }

    #[test]
    fn test_steer_rate_integrated_and_clamped() {
        let model = KinematicBicycleModel::default();
        let vehicle = vehicle_at(0.0, 3.0);
        let state = model.update(&vehicle, &VehicleCommand::with_steer_rate(3.0, 0.5), 0.1);
        assert!((state.delta - 0.05).abs() < 1e-12);

        let state = model.update(&vehicle, &VehicleCommand::with_steer_rate(3.0, 100.0), 0.1);
        assert_eq!(state.delta, vehicle.params.delta_max);
    }

    #[test]
    fn test_left_turn_positive_yaw_rate() {
        let model = KinematicBicycleModel::default();
        let mut vehicle = vehicle_at(0.0, 5.0);
        for _ in 0..20 {
            vehicle.state = model.update(&vehicle, &VehicleCommand::with_steer_angle(5.0, 0.2), 0.05);
        }
        assert!(vehicle.state.thetadot > 0.0);
        assert!(vehicle.state.theta > 0.0);
        assert!(vehicle.state.y > 0.0);
        assert!((vehicle.state.delta - 0.2).abs() < 1e-12);
    }
}
