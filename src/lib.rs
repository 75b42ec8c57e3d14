//! trolley_sim - planar vehicle simulation and path tracking
//!
//! This crate provides kinematic and dynamic bicycle models, a B-spline
//! path built from live waypoints, pure pursuit, Stanley and LQR steering
//! controllers, and the low-level steering and speed loops that tie them
//! together in a fixed-step simulation.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Simulation modules
pub mod dynamics;
pub mod path;
pub mod control;
pub mod path_tracking;
pub mod simulation;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, MotionModel, TrackingPath, PathTracker};
pub use common::{SimError, SimResult};
pub use config::SimConfig;
pub use dynamics::{Vehicle, VehicleCommand, VehicleParams, VehicleState};
pub use simulation::{Simulation, TickOutput};
