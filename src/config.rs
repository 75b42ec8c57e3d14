//! Simulation configuration loaded from TOML
//!
//! Every section is optional; missing fields fall back to their defaults.
//!
//! ```toml
//! dt = 0.0166
//! model = "dynamic"
//!
//! [control]
//! controller = "lqr"
//!
//! [control.lqr]
//! model = "dynamic"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{Pose2D, SimError, SimResult};
use crate::control::{SpeedParams, SteerControl};
use crate::dynamics::{IntegrationScheme, MotionModelType, VehicleParams, VehicleState};
use crate::path::{PathConfig, SinusoidParams};
use crate::path_tracking::ControllerConfig;

/// Initial CG pose and speed of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub vel: f64,
    /// Sideslip [rad]
    pub beta: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            vel: 10.0,
            beta: 0.0,
        }
    }
}

impl InitialState {
    pub fn to_state(&self) -> VehicleState {
        VehicleState::new(Pose2D::new(self.x, self.y, self.theta), self.vel, self.beta)
    }
}

// Scalar fields come before the tables so the struct serializes to valid TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Tick length [s]
    pub dt: f64,
    /// Length of a headless run [s]
    pub duration_s: f64,
    pub model: MotionModelType,
    pub integration: IntegrationScheme,
    pub vehicle: VehicleParams,
    pub initial: InitialState,
    pub path: PathConfig,
    pub control: ControllerConfig,
    pub steer_control: SteerControl,
    pub speed_control: SpeedParams,
    pub generator: SinusoidParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            duration_s: 20.0,
            model: MotionModelType::Dynamic,
            integration: IntegrationScheme::Rk4,
            vehicle: VehicleParams::default(),
            initial: InitialState::default(),
            path: PathConfig::default(),
            control: ControllerConfig::default(),
            steer_control: SteerControl::default(),
            speed_control: SpeedParams::default(),
            generator: SinusoidParams::default(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidTimeStep(self.dt));
        }
        if !(self.duration_s >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "duration_s must be non-negative, found {}",
                self.duration_s
            )));
        }
        self.vehicle.validate()?;
        self.path.validate()?;
        self.speed_control.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::SplineFit;
    use crate::path_tracking::{ControllerType, LqrModel};

    #[test]
    fn test_default_round_trip() {
        let text = toml::to_string(&SimConfig::default()).unwrap();
        let parsed = SimConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, SimConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let text = r#"
            dt = 0.02
            model = "kinematic"
            integration = "euler"

            [vehicle]
            m = 1500.0

            [path]
            degree = 2
            fit = { mode = "interpolate", smoothness = 0.5 }

            [control]
            controller = "lqr"

            [control.lqr]
            model = "dynamic"
            r = 2.0
        "#;
        let config = SimConfig::from_toml_str(text).unwrap();
        assert_eq!(config.dt, 0.02);
        assert_eq!(config.model, MotionModelType::Kinematic);
        assert_eq!(config.integration, IntegrationScheme::Euler);
        assert_eq!(config.vehicle.m, 1500.0);
        assert_eq!(config.vehicle.iz, VehicleParams::default().iz);
        assert_eq!(config.path.degree, 2);
        assert_eq!(config.path.fit, SplineFit::Interpolate { smoothness: 0.5 });
        assert_eq!(config.control.controller, ControllerType::Lqr);
        assert_eq!(config.control.lqr.model, LqrModel::Dynamic);
        assert_eq!(config.control.lqr.r, 2.0);
        assert_eq!(config.speed_control, SpeedParams::default());
    }

    #[test]
    fn test_shipped_params_load() {
        let config = SimConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/params/sim.toml")).unwrap();
        assert!((config.dt - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(config.control.controller, ControllerType::PurePursuit);
        assert_eq!(config.path, PathConfig::default());
        assert_eq!(config.generator, SinusoidParams::default());
        assert_eq!(config.speed_control, SpeedParams::default());
    }

    #[test]
    fn test_rk45_scheme() {
        let config = SimConfig::from_toml_str("integration = { rk45 = { rtol = 1e-4, atol = 1e-7 } }").unwrap();
        assert_eq!(config.integration, IntegrationScheme::Rk45 { rtol: 1e-4, atol: 1e-7 });
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(SimConfig::from_toml_str("dt = -0.1"), Err(SimError::InvalidTimeStep(_))));
        assert!(matches!(SimConfig::from_toml_str("dt = \"fast\""), Err(SimError::Config(_))));
        assert!(SimConfig::from_toml_str("[vehicle]\nlf = 0.0").is_err());
        assert!(matches!(SimConfig::load("does/not/exist.toml"), Err(SimError::Io(_))));
    }
}
