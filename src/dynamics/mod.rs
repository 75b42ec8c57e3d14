//! Vehicle dynamics: state, motion models and integration schemes

pub mod vehicle;
pub mod integrator;
pub mod kinematic;
pub mod dynamic;

pub use vehicle::*;
pub use integrator::IntegrationScheme;
pub use kinematic::KinematicBicycleModel;
pub use dynamic::DynamicBicycleModel;

use serde::{Deserialize, Serialize};

use crate::common::MotionModel;

/// Smallest longitudinal speed magnitude the dynamic model divides by [m/s]
pub const MIN_LONGITUDINAL_SPEED: f64 = 0.1;

/// Keep `vx` away from zero, preserving its sign
pub(crate) fn floor_speed(vx: f64) -> f64 {
    if vx.abs() >= MIN_LONGITUDINAL_SPEED {
        vx
    } else if vx < 0.0 {
        -MIN_LONGITUDINAL_SPEED
    } else {
        MIN_LONGITUDINAL_SPEED
    }
}

/// Split a steering command into the initial angle and the rate to integrate
pub(crate) fn steer_input(delta: f64, steer: SteerCommand) -> (f64, f64) {
    match steer {
        SteerCommand::Rate(rate) => (delta, rate),
        SteerCommand::Angle(angle) => (angle, 0.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModelType {
    Kinematic,
    Dynamic,
}

/// Motion model of the given type integrating with `scheme`
pub fn build_motion_model(model: MotionModelType, scheme: IntegrationScheme) -> Box<dyn MotionModel> {
    match model {
        MotionModelType::Kinematic => Box::new(KinematicBicycleModel::new(scheme)),
        MotionModelType::Dynamic => Box::new(DynamicBicycleModel::new(scheme)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_speed() {
        assert_eq!(floor_speed(0.0), MIN_LONGITUDINAL_SPEED);
        assert_eq!(floor_speed(-0.01), -MIN_LONGITUDINAL_SPEED);
        assert_eq!(floor_speed(5.0), 5.0);
        assert_eq!(floor_speed(-3.0), -3.0);
    }
}
