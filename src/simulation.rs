//! Per-tick orchestration of path, controllers and motion model
//!
//! Each call to [`Simulation::step`] rebuilds the path from the supplied
//! waypoints, computes the desired steering angle, turns it into a steering
//! rate and a speed command, and integrates the vehicle forward.

use log::{debug, info, warn};

use crate::common::{MotionModel, PathTracker, Point2D, SimError, SimResult, TrackingPath};
use crate::config::SimConfig;
use crate::control::{SpeedControl, SteerControl};
use crate::dynamics::{build_motion_model, Vehicle, VehicleCommand, VehicleState};
use crate::path::{BSplinePath, SinusoidGenerator};
use crate::path_tracking::build_controller;

/// Ticks longer than this are accepted but logged [s]
pub const NOMINAL_MAX_DT: f64 = 0.05;

/// Commands issued and state reached on one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Simulation time at the end of the tick [s]
    pub time_s: f64,
    pub steer_desired: f64,
    pub steer_rate: f64,
    pub speed_cmd: f64,
    pub state: VehicleState,
}

pub struct Simulation {
    vehicle: Vehicle,
    motion_model: Box<dyn MotionModel>,
    path: Box<dyn TrackingPath>,
    controller: Box<dyn PathTracker>,
    steer_control: SteerControl,
    speed_control: SpeedControl,
    time_s: f64,
}

impl Simulation {
    pub fn new(
        vehicle: Vehicle,
        motion_model: Box<dyn MotionModel>,
        path: Box<dyn TrackingPath>,
        controller: Box<dyn PathTracker>,
        steer_control: SteerControl,
        speed_control: SpeedControl,
    ) -> SimResult<Self> {
        vehicle.params.validate()?;
        speed_control.params().validate()?;
        Ok(Self {
            vehicle,
            motion_model,
            path,
            controller,
            steer_control,
            speed_control,
            time_s: 0.0,
        })
    }

    /// B-spline path tracking simulation described by `config`
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Self::new(
            Vehicle::new(config.initial.to_state(), config.vehicle),
            build_motion_model(config.model, config.integration),
            Box::new(BSplinePath::new(config.path)?),
            build_controller(&config.control)?,
            config.steer_control,
            SpeedControl::new(config.speed_control),
        )
    }

    /// Advance by `dt` seconds tracking the path through `waypoints`
    pub fn step(&mut self, dt: f64, waypoints: &[Point2D]) -> SimResult<TickOutput> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimeStep(dt));
        }
        if dt > NOMINAL_MAX_DT {
            warn!("time step {:.3} s exceeds the nominal {:.3} s", dt, NOMINAL_MAX_DT);
        }

        self.path.update(waypoints);
        let steer_desired = self.controller.update(&self.vehicle, self.path.as_ref());
        let steer_rate = self.steer_control.update(&self.vehicle, steer_desired, dt);
        let speed_cmd = self.speed_control.update(&self.vehicle, self.path.as_ref(), dt);

        let command = VehicleCommand::with_steer_rate(speed_cmd, steer_rate);
        self.vehicle.state = self.motion_model.update(&self.vehicle, &command, dt);
        self.time_s += dt;

        debug!(
            "t = {:.3} s: steer {:.3} rad ({:.3} rad/s), speed {:.2} m/s",
            self.time_s, steer_desired, steer_rate, speed_cmd
        );
        Ok(TickOutput {
            time_s: self.time_s,
            steer_desired,
            steer_rate,
            speed_cmd,
            state: self.vehicle.state,
        })
    }

    /// Run for `duration_s` seconds against waypoints from `generator`,
    /// returning every tick
    pub fn run(&mut self, generator: &mut SinusoidGenerator, dt: f64, duration_s: f64) -> SimResult<Vec<TickOutput>> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimeStep(dt));
        }
        let n_ticks = (duration_s / dt).round().max(0.0) as usize;
        let mut ticks = Vec::with_capacity(n_ticks);
        for _ in 0..n_ticks {
            let waypoints = generator.update(self.time_s);
            ticks.push(self.step(dt, &waypoints)?);
        }
        info!(
            "{}: {} ticks, final pose ({:.2}, {:.2}, {:.3})",
            self.controller.name(),
            ticks.len(),
            self.vehicle.state.x,
            self.vehicle.state.y,
            self.vehicle.state.theta
        );
        Ok(ticks)
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn path(&self) -> &dyn TrackingPath {
        self.path.as_ref()
    }

    pub fn controller_name(&self) -> &'static str {
        self.controller.name()
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }
}
