//! Actuator-level loops: steering angle to steering rate, and a station-based
//! speed policy that keeps the vehicle a fixed distance behind the path end

use log::trace;
use serde::{Deserialize, Serialize};

use crate::common::{SimError, SimResult, TrackingPath};
use crate::dynamics::Vehicle;

/// Proportional steering rate controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteerControl {
    pub p: f64,
}

impl Default for SteerControl {
    fn default() -> Self {
        Self { p: 50.0 }
    }
}

impl SteerControl {
    pub fn new(p: f64) -> Self {
        Self { p }
    }

    /// Steering rate [rad/s] driving the measured angle towards `steer_desired`.
    ///
    /// The magnitude never exceeds `delta_rate_max`, and the rate never
    /// overshoots the error within `dt`.
    pub fn update(&self, vehicle: &Vehicle, steer_desired: f64, dt: f64) -> f64 {
        let rate_max = vehicle.params.delta_rate_max;
        let err = steer_desired - vehicle.state.delta;
        if !err.is_finite() {
            return 0.0;
        }
        let mut rate = (self.p * err).clamp(-rate_max, rate_max);
        if dt > 0.0 {
            let reach = (err / dt).abs();
            rate = rate.clamp(-reach, reach);
        }
        rate.clamp(-rate_max, rate_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedParams {
    pub min_speed: f64,
    pub max_speed: f64,
    pub min_accel: f64,
    pub max_accel: f64,
    /// Distance to keep behind the path end [m]
    pub station_setpoint: f64,
    pub p: f64,
    pub p_d: f64,
    pub initial_speed: f64,
}

impl SpeedParams {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed) {
            return Err(SimError::InvalidParameter(format!(
                "speed limits must satisfy 0 < min_speed <= max_speed, found [{}, {}]",
                self.min_speed, self.max_speed
            )));
        }
        if self.min_accel > self.max_accel {
            return Err(SimError::InvalidParameter(format!(
                "min_accel {} exceeds max_accel {}",
                self.min_accel, self.max_accel
            )));
        }
        if !(self.initial_speed >= self.min_speed && self.initial_speed <= self.max_speed) {
            return Err(SimError::InvalidParameter(format!(
                "initial_speed {} outside [{}, {}]",
                self.initial_speed, self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }
}

impl Default for SpeedParams {
    fn default() -> Self {
        Self {
            min_speed: 1.0,
            max_speed: 30.0,
            min_accel: -50.0,
            max_accel: 10.0,
            station_setpoint: 18.0,
            p: 0.5,
            p_d: 1.0,
            initial_speed: 10.0,
        }
    }
}

/// PD speed controller on the station error to a setpoint near the path end
#[derive(Debug, Clone)]
pub struct SpeedControl {
    params: SpeedParams,
    speed_cmd: f64,
    station_to_setpoint: Option<f64>,
}

impl SpeedControl {
    pub fn new(params: SpeedParams) -> Self {
        Self {
            speed_cmd: params.initial_speed,
            params,
            station_to_setpoint: None,
        }
    }

    pub fn params(&self) -> &SpeedParams {
        &self.params
    }

    pub fn speed_cmd(&self) -> f64 {
        self.speed_cmd
    }

    /// Speed command [m/s] for the next `dt` seconds.
    ///
    /// Without a nearest pose or a bounded path the previous command is held.
    pub fn update(&mut self, vehicle: &Vehicle, path: &dyn TrackingPath, dt: f64) -> f64 {
        let p = &self.params;
        let station = match path.get_nearest_pose(vehicle.pose_rear_axle().point()) {
            Some((_, station)) => station,
            None => return self.speed_cmd,
        };
        let end = match path.end_station() {
            Some(end) => end,
            None => return self.speed_cmd,
        };

        let s2sp = station - (end - p.station_setpoint).max(end / 2.0);
        let rate = match self.station_to_setpoint {
            Some(prev) if dt > 0.0 => (s2sp - prev) / dt,
            _ => 0.0,
        };
        self.station_to_setpoint = Some(s2sp);

        let accel = (-p.p * s2sp - p.p_d * rate).clamp(p.min_accel, p.max_accel);
        self.speed_cmd = (self.speed_cmd + dt * accel).clamp(p.min_speed, p.max_speed);
        trace!("station error {:.2} m, accel {:.2} m/s^2, speed {:.2} m/s", s2sp, accel, self.speed_cmd);
        self.speed_cmd
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::new(SpeedParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Point2D, Pose2D};
    use crate::dynamics::{VehicleParams, VehicleState};
    use crate::path::{BSplinePath, StraightPath};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn vehicle_with_delta(delta: f64) -> Vehicle {
        let mut vehicle = Vehicle::new(VehicleState::new(Pose2D::origin(), 10.0, 0.0), VehicleParams::default());
        vehicle.state.delta = delta;
        vehicle
    }

    #[test]
    fn test_steer_rate_proportional_and_saturated() {
        let control = SteerControl::default();
        let vehicle = vehicle_with_delta(0.0);
        // 50 * 0.01 = 0.5, reachable within dt
        assert!((control.update(&vehicle, 0.01, 0.01) - 0.5).abs() < 1e-12);
        assert_eq!(control.update(&vehicle, 0.5, 0.1), vehicle.params.delta_rate_max);
        assert_eq!(control.update(&vehicle, -0.5, 0.1), -vehicle.params.delta_rate_max);
    }

    #[test]
    fn test_steer_rate_no_overshoot() {
        let control = SteerControl::default();
        let vehicle = vehicle_with_delta(0.1);
        let dt = 0.5;
        let rate = control.update(&vehicle, 0.11, dt);
        assert!(rate > 0.0);
        assert!(vehicle.state.delta + rate * dt <= 0.11 + 1e-12);
    }

    #[test]
    fn test_randomised_command_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let steer = SteerControl::default();
        let mut speed = SpeedControl::default();
        let mut path = BSplinePath::with_defaults();
        let params = *speed.params();

        for _ in 0..500 {
            let vehicle = Vehicle::new(
                VehicleState {
                    x: rng.gen_range(-50.0..50.0),
                    y: rng.gen_range(-50.0..50.0),
                    theta: rng.gen_range(-4.0..4.0),
                    delta: rng.gen_range(-0.7..0.7),
                    vx: rng.gen_range(0.0..30.0),
                    ..Default::default()
                },
                VehicleParams::default(),
            );
            let waypoints: Vec<Point2D> = (0..rng.gen_range(0..10))
                .map(|i| Point2D::new(5.0 * i as f64, rng.gen_range(-5.0..5.0)))
                .collect();
            path.update(&waypoints);
            let dt = rng.gen_range(1e-3..0.05);

            let rate = steer.update(&vehicle, rng.gen_range(-10.0..10.0), dt);
            assert!(rate.abs() <= vehicle.params.delta_rate_max);

            let cmd = speed.update(&vehicle, &path, dt);
            assert!(cmd >= params.min_speed && cmd <= params.max_speed);
        }
    }

    #[test]
    fn test_speed_params_validation() {
        assert!(SpeedParams::default().validate().is_ok());
        assert!(SpeedParams { min_speed: 40.0, ..Default::default() }.validate().is_err());
        assert!(SpeedParams { min_accel: 20.0, ..Default::default() }.validate().is_err());
        assert!(SpeedParams { initial_speed: 0.0, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_speed_holds_without_path() {
        let mut speed = SpeedControl::default();
        let vehicle = vehicle_with_delta(0.0);
        let empty = BSplinePath::with_defaults();
        assert_eq!(speed.update(&vehicle, &empty, 0.1), 10.0);
        // an unbounded path has no end to regulate against
        assert_eq!(speed.update(&vehicle, &StraightPath, 0.1), 10.0);
    }

    #[test]
    fn test_speed_tracks_setpoint_direction() {
        let mut path = BSplinePath::with_defaults();
        let waypoints: Vec<Point2D> = (0..11).map(|i| Point2D::new(10.0 * i as f64, 0.0)).collect();
        path.update(&waypoints);
        let end = path.end_station().unwrap();

        // far behind the setpoint: speed up
        let mut speed = SpeedControl::default();
        let behind = vehicle_with_delta(0.0);
        assert!(speed.update(&behind, &path, 0.1) > 10.0);

        // past the setpoint: slow down
        let mut speed = SpeedControl::default();
        let mut ahead = vehicle_with_delta(0.0);
        ahead.state.x = end - 2.0;
        assert!(speed.update(&ahead, &path, 0.1) < 10.0);
    }
}
