//! Path tracking controllers producing a desired steering angle

pub mod pure_pursuit;
pub mod stanley_controller;
pub mod lqr_steer_control;

pub use pure_pursuit::{PurePursuitConfig, PurePursuitController};
pub use stanley_controller::{StanleyConfig, StanleyController};
pub use lqr_steer_control::{LqrConfig, LqrDiagnostics, LqrModel, LqrSteerController};

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::{PathTracker, SimResult};

/// Geometric controllers limit their steering command to this magnitude [rad]
pub const MAX_STEER_CMD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerType {
    PurePursuit,
    Stanley,
    Lqr,
}

/// Controller selection plus the parameters of every controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub controller: ControllerType,
    pub pure_pursuit: PurePursuitConfig,
    pub stanley: StanleyConfig,
    pub lqr: LqrConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller: ControllerType::PurePursuit,
            pure_pursuit: PurePursuitConfig::default(),
            stanley: StanleyConfig::default(),
            lqr: LqrConfig::default(),
        }
    }
}

/// Build the controller selected by `config.controller`
pub fn build_controller(config: &ControllerConfig) -> SimResult<Box<dyn PathTracker>> {
    let controller: Box<dyn PathTracker> = match config.controller {
        ControllerType::PurePursuit => Box::new(PurePursuitController::new(config.pure_pursuit)?),
        ControllerType::Stanley => Box::new(StanleyController::new(config.stanley)?),
        ControllerType::Lqr => Box::new(LqrSteerController::new(config.lqr)?),
    };
    info!("path tracker: {}", controller.name());
    Ok(controller)
}
