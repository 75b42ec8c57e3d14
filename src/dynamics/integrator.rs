//! Numerical integration schemes for the motion models
//!
//! All schemes integrate an autonomous system `z' = f(z)` over a single step
//! of length `dt`; control inputs are held constant across the step.

use log::warn;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// Hard cap on the number of adaptive sub-steps taken within one `dt`
const RK45_MAX_STEPS: usize = 1000;

/// Integration scheme used by a motion model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    /// Explicit Euler: `z + dt * f(z)`
    Euler,
    /// Classic fixed-step fourth order Runge-Kutta
    Rk4,
    /// Adaptive Dormand-Prince 5(4) with the given relative/absolute tolerances
    Rk45 { rtol: f64, atol: f64 },
}

impl Default for IntegrationScheme {
    fn default() -> Self {
        IntegrationScheme::Rk4
    }
}

impl IntegrationScheme {
    /// Dormand-Prince with the tolerances scipy uses by default
    pub fn rk45() -> Self {
        IntegrationScheme::Rk45 { rtol: 1e-3, atol: 1e-6 }
    }

    /// Advance `z` by `dt` under `f`
    pub fn integrate<const N: usize, F>(&self, f: F, z: &SVector<f64, N>, dt: f64) -> SVector<f64, N>
    where
        F: Fn(&SVector<f64, N>) -> SVector<f64, N>,
    {
        match *self {
            IntegrationScheme::Euler => z + f(z) * dt,
            IntegrationScheme::Rk4 => rk4_step(&f, z, dt),
            IntegrationScheme::Rk45 { rtol, atol } => rk45(&f, z, dt, rtol, atol),
        }
    }
}

fn rk4_step<const N: usize, F>(f: &F, z: &SVector<f64, N>, dt: f64) -> SVector<f64, N>
where
    F: Fn(&SVector<f64, N>) -> SVector<f64, N>,
{
    let k1 = f(z);
    let k2 = f(&(z + k1 * (dt / 2.0)));
    let k3 = f(&(z + k2 * (dt / 2.0)));
    let k4 = f(&(z + k3 * dt));
    z + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

// Dormand-Prince tableau. The system is autonomous so the c_i nodes are unused.
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
// Difference between the 5th and embedded 4th order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

fn rk45<const N: usize, F>(f: &F, z0: &SVector<f64, N>, dt: f64, rtol: f64, atol: f64) -> SVector<f64, N>
where
    F: Fn(&SVector<f64, N>) -> SVector<f64, N>,
{
    let mut z = *z0;
    let mut t = 0.0;
    let mut h = dt;
    let mut k1 = f(&z);

    for _ in 0..RK45_MAX_STEPS {
        if dt - t <= dt * 1e-12 {
            return z;
        }
        h = h.min(dt - t);

        let k2 = f(&(z + k1 * (h * A21)));
        let k3 = f(&(z + (k1 * A31 + k2 * A32) * h));
        let k4 = f(&(z + (k1 * A41 + k2 * A42 + k3 * A43) * h));
        let k5 = f(&(z + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h));
        let k6 = f(&(z + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h));
        let z_new = z + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
        let k7 = f(&z_new);

        let err = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
        let err_sq: f64 = err
            .iter()
            .zip(z.iter().zip(z_new.iter()))
            .map(|(e, (a, b))| {
                let scale = atol + rtol * a.abs().max(b.abs());
                (e / scale).powi(2)
            })
            .sum();
        let err_norm = (err_sq / N.max(1) as f64).sqrt();

        if err_norm <= 1.0 || h <= dt * 1e-6 {
            t += h;
            z = z_new;
            k1 = k7;
        }

        let factor = if err_norm == 0.0 {
            5.0
        } else {
            (0.9 * err_norm.powf(-0.2)).clamp(0.2, 5.0)
        };
        h *= factor;
    }

    warn!("RK45 did not reach the end of the step after {} sub-steps", RK45_MAX_STEPS);
    z
}
