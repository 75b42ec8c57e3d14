//! Discrete-time LQR: Riccati solver, gain computation and a gain cache
//!
//! x[k+1] = A x[k] + B u[k]
//! cost = sum x[k]^T Q x[k] + u[k]^T R u[k]
//!
//! Ref:
//! - Bertsekas, Dynamic Programming and Optimal Control, p. 151

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};
use nalgebra::{Complex, Matrix4, RowVector4, SMatrix, Vector4};
use ordered_float::OrderedFloat;

use crate::common::{SimError, SimResult};

pub const DARE_MAX_ITER: usize = 150;
pub const DARE_EPS: f64 = 0.01;

/// Solve the discrete algebraic Riccati equation by fixed-point iteration
/// starting from `X = Q`.
///
/// Iteration stops once the largest entry of `|X_{n+1} - X_n|` drops below
/// `eps`. If that never happens within `max_iter` iterations the last iterate
/// is returned.
pub fn solve_dare<const N: usize, const M: usize>(
    a: &SMatrix<f64, N, N>,
    b: &SMatrix<f64, N, M>,
    q: &SMatrix<f64, N, N>,
    r: &SMatrix<f64, M, M>,
    max_iter: usize,
    eps: f64,
) -> SimResult<SMatrix<f64, N, N>> {
    let mut x = *q;
    for _ in 0..max_iter {
        let bt_x = b.transpose() * x;
        let inv = (r + bt_x * b)
            .try_inverse()
            .ok_or_else(|| SimError::Numerical("R + B^T X B is singular".to_string()))?;
        let xn = a.transpose() * x * a - a.transpose() * x * b * inv * bt_x * a + q;
        if (xn - x).abs().max() < eps {
            return Ok(xn);
        }
        x = xn;
    }
    warn!("DARE did not converge within {} iterations, using the last iterate", max_iter);
    Ok(x)
}

/// Gain, Riccati solution and closed-loop eigenvalues of a 4-state,
/// single-input LQR problem
#[derive(Debug, Clone)]
pub struct LqrSolution {
    pub k: RowVector4<f64>,
    pub x: Matrix4<f64>,
    pub eigenvalues: Vector4<Complex<f64>>,
}

/// Solve the discrete-time LQR controller for `u = -K x`
pub fn dlqr(a: &Matrix4<f64>, b: &Vector4<f64>, q: &Matrix4<f64>, r: f64) -> SimResult<LqrSolution> {
    let r = SMatrix::<f64, 1, 1>::new(r);
    let x = solve_dare(a, b, q, &r, DARE_MAX_ITER, DARE_EPS)?;

    let bt_x = b.transpose() * x;
    let denominator = (bt_x * b + r)[0];
    if denominator.abs() < 1e-12 {
        return Err(SimError::Numerical("B^T X B + R is singular".to_string()));
    }
    let k = bt_x * a / denominator;
    let eigenvalues = (a - b * k).complex_eigenvalues();

    Ok(LqrSolution { k, x, eigenvalues })
}

/// Check that a symmetric cost matrix is positive definite
pub fn is_positive_definite(q: &Matrix4<f64>) -> bool {
    q.is_square() && (q - q.transpose()).abs().max() < 1e-9 && q.cholesky().is_some()
}

type CacheKey = Vec<OrderedFloat<f64>>;

/// Bounded LRU cache of LQR gains keyed by system matrices at a quantised speed
#[derive(Debug, Clone)]
pub struct GainCache {
    capacity: usize,
    quantization: f64,
    gains: HashMap<CacheKey, RowVector4<f64>>,
    /// Least recently used first
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl GainCache {
    pub const DEFAULT_CAPACITY: usize = 256;
    pub const DEFAULT_QUANTIZATION: f64 = 0.01;

    pub fn new(capacity: usize, quantization: f64) -> SimResult<Self> {
        if capacity == 0 {
            return Err(SimError::InvalidParameter("gain cache capacity must be at least 1".to_string()));
        }
        if !(quantization.is_finite() && quantization > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "gain cache quantization must be positive, found {}",
                quantization
            )));
        }
        Ok(Self {
            capacity,
            quantization,
            gains: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        })
    }

    fn quantize(&self, v: f64) -> f64 {
        (v / self.quantization).round() * self.quantization
    }

    /// Gain for the plant `(A, B) = plant(speed)` and whether it came from
    /// the cache.
    ///
    /// The lookup key is `plant` evaluated at `speed` rounded to the cache
    /// quantization, together with `Q` and `R`, so only the speed-dependent
    /// entries are rounded and nearby speeds share one gain. On a miss the
    /// DARE is solved on the plant at the exact `speed`.
    pub fn gain<F>(&mut self, speed: f64, plant: F, q: &Matrix4<f64>, r: f64) -> SimResult<(RowVector4<f64>, bool)>
    where
        F: Fn(f64) -> (Matrix4<f64>, Vector4<f64>),
    {
        if !speed.is_finite() {
            return Err(SimError::Numerical(format!("cannot build an LQR plant at speed {}", speed)));
        }
        let (a_key, b_key) = plant(self.quantize(speed));
        let key: CacheKey = a_key
            .iter()
            .chain(b_key.iter())
            .chain(q.iter())
            .chain(std::iter::once(&r))
            .map(|&v| OrderedFloat(v))
            .collect();

        if let Some(k) = self.gains.get(&key).copied() {
            self.hits += 1;
            if let Some(pos) = self.order.iter().position(|entry| *entry == key) {
                if let Some(entry) = self.order.remove(pos) {
                    self.order.push_back(entry);
                }
            }
            return Ok((k, true));
        }

        self.misses += 1;
        let (a, b) = plant(speed);
        let solution = dlqr(&a, &b, q, r)?;
        if self.gains.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.gains.remove(&evicted);
            }
        }
        self.gains.insert(key.clone(), solution.k);
        self.order.push_back(key);
        debug!("LQR gain cache miss at {:.3} m/s, {} entries", speed, self.gains.len());
        Ok((solution.k, false))
    }

    pub fn len(&self) -> usize {
        self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.gains.clear();
        self.order.clear();
    }
}

impl Default for GainCache {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            quantization: Self::DEFAULT_QUANTIZATION,
            gains: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }
}
