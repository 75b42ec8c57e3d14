//! Dynamic bicycle model with a linear tire force model
//!
//! Integrated state: `[x, y, theta, vy, thetadot, delta]`. The longitudinal
//! velocity is the commanded one and is held over the step.
//!
//! Ref:
//! - Rajamani, Vehicle Dynamics and Control, ch. 2

use nalgebra::SVector;

use crate::common::MotionModel;
use crate::dynamics::{floor_speed, steer_input, IntegrationScheme, Vehicle, VehicleCommand, VehicleState};

#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicBicycleModel {
    pub scheme: IntegrationScheme,
}

impl DynamicBicycleModel {
    pub fn new(scheme: IntegrationScheme) -> Self {
        Self { scheme }
    }
}

impl MotionModel for DynamicBicycleModel {
    fn update(&self, vehicle: &Vehicle, command: &VehicleCommand, dt: f64) -> VehicleState {
        let p = vehicle.params;
        let vx = floor_speed(command.vel);
        let (delta0, steer_rate) = steer_input(vehicle.state.delta, command.steer);

        let f = |z: &SVector<f64, 6>| {
            let (theta, vy, r, delta) = (z[2], z[3], z[4], z[5]);
            let alpha_f = delta - (vy + p.lf * r) / vx;
            let alpha_r = -(vy - p.lr * r) / vx;
            let fyf = p.cf * alpha_f;
            let fyr = p.cr * alpha_r;
            let (s, c) = theta.sin_cos();
            SVector::<f64, 6>::from([
                vx * c - vy * s,
                vx * s + vy * c,
                r,
                (fyf * delta.cos() + fyr) / p.m - vx * r,
                (p.lf * fyf * delta.cos() - p.lr * fyr) / p.iz,
                steer_rate,
            ])
        };

        let s = &vehicle.state;
        let z0 = SVector::<f64, 6>::from([s.x, s.y, s.theta, s.vy, s.thetadot, delta0]);
        let z = self.scheme.integrate(f, &z0, dt);

        VehicleState {
            x: z[0],
            y: z[1],
            theta: z[2],
            delta: z[5].clamp(-p.delta_max, p.delta_max),
            vx,
            vy: z[3],
            thetadot: z[4],
        }
    }
}
