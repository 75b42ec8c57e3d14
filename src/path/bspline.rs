//! Univariate B-splines
//!
//! Knot placement follows the "not-a-knot" rule used by FITPACK for
//! interpolating splines: the boundary knots are repeated `degree + 1` times and
//! the interior knots are taken from the data sites (odd degree) or midway
//! between them (even degree).
//!
//! Ref:
//! - Carl de Boor, A Practical Guide to Splines
//! - Eilers and Marx, Flexible smoothing with B-splines and penalties (1996)

use nalgebra::{DMatrix, DVector};

use crate::common::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Spline from an explicit knot vector and coefficients.
    ///
    /// `knots.len()` must equal `coeffs.len() + degree + 1`.
    pub fn new(knots: Vec<f64>, coeffs: Vec<f64>, degree: usize) -> SimResult<Self> {
        if coeffs.len() < degree + 1 || knots.len() != coeffs.len() + degree + 1 {
            return Err(SimError::InvalidParameter(format!(
                "{} knots and {} coefficients do not form a degree {} spline",
                knots.len(),
                coeffs.len(),
                degree
            )));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(SimError::InvalidParameter("knots must be non-decreasing".to_string()));
        }
        Ok(Self { knots, coeffs, degree })
    }

    /// Knot vector for a spline with one coefficient per data site
    pub fn not_a_knot_knots(sites: &[f64], degree: usize) -> Vec<f64> {
        let n = sites.len();
        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat(sites[0]).take(degree + 1));
        let n_interior = n.saturating_sub(degree + 1);
        if degree % 2 == 1 {
            let first = (degree + 1) / 2;
            knots.extend_from_slice(&sites[first..first + n_interior]);
        } else {
            let first = degree / 2;
            knots.extend((first..first + n_interior).map(|j| 0.5 * (sites[j] + sites[j + 1])));
        }
        knots.extend(std::iter::repeat(sites[n - 1]).take(degree + 1));
        knots
    }

    /// Fit `values` sampled at the strictly increasing `sites`.
    ///
    /// With `smoothness == 0` the spline passes through every sample. A positive
    /// `smoothness` weights a second-difference penalty on the coefficients and
    /// the fit becomes a penalised least-squares approximation.
    pub fn fit(sites: &[f64], values: &[f64], degree: usize, smoothness: f64) -> SimResult<Self> {
        let n = sites.len();
        if n != values.len() || n < degree + 1 {
            return Err(SimError::InvalidParameter(format!(
                "cannot fit a degree {} spline to {} sites and {} values",
                degree,
                n,
                values.len()
            )));
        }
        if !(smoothness >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "smoothness must be non-negative, found {}",
                smoothness
            )));
        }

        let knots = Self::not_a_knot_knots(sites, degree);
        let spline = Self { knots, coeffs: vec![0.0; n], degree };

        let mut collocation = DMatrix::<f64>::zeros(n, n);
        for (i, &t) in sites.iter().enumerate() {
            let span = spline.find_span(t);
            for (j, b) in spline.basis_funs(span, t).into_iter().enumerate() {
                collocation[(i, span - degree + j)] = b;
            }
        }
        let rhs = DVector::from_column_slice(values);

        let coeffs = if smoothness > 0.0 && n > 2 {
            let mut diff = DMatrix::<f64>::zeros(n - 2, n);
            for i in 0..n - 2 {
                diff[(i, i)] = 1.0;
                diff[(i, i + 1)] = -2.0;
                diff[(i, i + 2)] = 1.0;
            }
            let lhs = collocation.transpose() * &collocation + diff.transpose() * diff * smoothness;
            lhs.lu().solve(&(collocation.transpose() * rhs))
        } else {
            collocation.lu().solve(&rhs)
        };

        let coeffs = coeffs.ok_or_else(|| {
            SimError::Numerical("singular B-spline collocation system".to_string())
        })?;
        Ok(Self { coeffs: coeffs.iter().copied().collect(), ..spline })
    }

    /// Spline on the not-a-knot knot vector of `sites` using `control` directly
    /// as its coefficients. The curve approximates rather than interpolates
    /// the control polygon.
    pub fn from_control_points(sites: &[f64], control: &[f64], degree: usize) -> SimResult<Self> {
        if sites.len() != control.len() {
            return Err(SimError::InvalidParameter(format!(
                "{} sites but {} control points",
                sites.len(),
                control.len()
            )));
        }
        if sites.len() < degree + 1 {
            return Err(SimError::InvalidParameter(format!(
                "a degree {} spline needs at least {} control points",
                degree,
                degree + 1
            )));
        }
        Self::new(Self::not_a_knot_knots(sites, degree), control.to_vec(), degree)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Parameter interval the spline is defined on
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.coeffs.len()])
    }

    /// Index `l` of the knot span `knots[l] <= t < knots[l + 1]`, restricted to
    /// the spline's domain
    fn find_span(&self, t: f64) -> usize {
        let n = self.coeffs.len();
        let (lo, hi) = self.domain();
        if t >= hi {
            // last non-empty span
            let mut l = n - 1;
            while l > self.degree && self.knots[l] >= hi {
                l -= 1;
            }
            return l;
        }
        if t <= lo {
            let mut l = self.degree;
            while l < n - 1 && self.knots[l + 1] <= lo {
                l += 1;
            }
            return l;
        }
        // upper_bound over knots[degree..=n], minus one
        let idx = self.knots[self.degree..=n].partition_point(|&k| k <= t);
        (self.degree + idx - 1).min(n - 1)
    }

    /// Values of the `degree + 1` basis functions that are non-zero on `span`
    fn basis_funs(&self, span: usize, t: f64) -> Vec<f64> {
        let k = self.degree;
        let mut values = vec![0.0; k + 1];
        let mut left = vec![0.0; k + 1];
        let mut right = vec![0.0; k + 1];
        values[0] = 1.0;
        for j in 1..=k {
            left[j] = t - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - t;
            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom == 0.0 { 0.0 } else { values[r] / denom };
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }
        values
    }

    /// Evaluate with de Boor's algorithm. Outside the domain the boundary
    /// polynomial piece is extrapolated.
    pub fn eval(&self, t: f64) -> f64 {
        let k = self.degree;
        let span = self.find_span(t);
        let mut d: Vec<f64> = (0..=k).map(|j| self.coeffs[span - k + j]).collect();
        for r in 1..=k {
            for j in (r..=k).rev() {
                let i = span - k + j;
                let denom = self.knots[i + k + 1 - r] - self.knots[i];
                let alpha = if denom == 0.0 { 0.0 } else { (t - self.knots[i]) / denom };
                d[j] = (1.0 - alpha) * d[j - 1] + alpha * d[j];
            }
        }
        d[k]
    }

    /// The derivative as a spline of one degree lower. A constant spline's
    /// derivative is identically zero.
    pub fn derivative(&self) -> BSpline {
        let k = self.degree;
        if k == 0 {
            return Self { coeffs: vec![0.0; self.coeffs.len()], ..self.clone() };
        }
        let coeffs = self
            .coeffs
            .windows(2)
            .enumerate()
            .map(|(i, c)| {
                let denom = self.knots[i + k + 1] - self.knots[i + 1];
                if denom == 0.0 {
                    0.0
                } else {
                    k as f64 * (c[1] - c[0]) / denom
                }
            })
            .collect();
        Self {
            knots: self.knots[1..self.knots.len() - 1].to_vec(),
            coeffs,
            degree: k - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_not_a_knot_knots() {
        let knots = BSpline::not_a_knot_knots(&sites(6), 3);
        assert_eq!(knots, vec![0.0, 0.0, 0.0, 0.0, 2.0, 3.0, 5.0, 5.0, 5.0, 5.0]);

        let knots = BSpline::not_a_knot_knots(&sites(5), 2);
        assert_eq!(knots, vec![0.0, 0.0, 0.0, 1.5, 2.5, 4.0, 4.0, 4.0]);

        let knots = BSpline::not_a_knot_knots(&sites(4), 3);
        assert_eq!(knots.len(), 8);
    }

    #[test]
    fn test_interpolation_hits_samples() {
        let t = sites(7);
        let values = [0.0, 1.0, -2.0, 0.5, 3.0, 3.0, -1.0];
        for degree in 1..=4 {
            let spline = BSpline::fit(&t, &values, degree, 0.0).unwrap();
            for (ti, vi) in t.iter().zip(values.iter()) {
                assert!((spline.eval(*ti) - vi).abs() < 1e-9, "degree {} at {}", degree, ti);
            }
        }
    }

    #[test]
    fn test_cubic_reproduces_polynomial() {
        let t = sites(6);
        let f = |x: f64| 0.5 * x * x * x - x * x + 2.0;
        let df = |x: f64| 1.5 * x * x - 2.0 * x;
        let ddf = |x: f64| 3.0 * x - 2.0;
        let values: Vec<f64> = t.iter().map(|&x| f(x)).collect();
        let spline = BSpline::fit(&t, &values, 3, 0.0).unwrap();
        let d1 = spline.derivative();
        let d2 = d1.derivative();
        for i in 0..=50 {
            let x = i as f64 * 0.1;
            assert!((spline.eval(x) - f(x)).abs() < 1e-9);
            assert!((d1.eval(x) - df(x)).abs() < 1e-8);
            assert!((d2.eval(x) - ddf(x)).abs() < 1e-7);
        }
    }

    #[test]
    fn test_control_points_clamped_ends() {
        let t = sites(5);
        let control = [0.0, 2.0, -1.0, 4.0, 1.0];
        let spline = BSpline::from_control_points(&t, &control, 3).unwrap();
        assert!((spline.eval(0.0) - 0.0).abs() < 1e-12);
        assert!((spline.eval(4.0) - 1.0).abs() < 1e-12);
        // convex hull property
        for i in 0..=40 {
            let v = spline.eval(i as f64 * 0.1);
            assert!(v >= -1.0 - 1e-12 && v <= 4.0 + 1e-12);
        }
    }

    #[test]
    fn test_smoothing_reduces_roughness() {
        let t = sites(9);
        let values = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let exact = BSpline::fit(&t, &values, 3, 0.0).unwrap();
        let smooth = BSpline::fit(&t, &values, 3, 10.0).unwrap();
        let spread = |s: &BSpline| {
            let v: Vec<f64> = (0..=80).map(|i| s.eval(i as f64 * 0.1)).collect();
            v.iter().cloned().fold(f64::MIN, f64::max) - v.iter().cloned().fold(f64::MAX, f64::min)
        };
        assert!(spread(&smooth) < spread(&exact));
    }

    #[test]
    fn test_invalid_input() {
        assert!(BSpline::fit(&sites(3), &[0.0, 1.0, 2.0], 3, 0.0).is_err());
        assert!(BSpline::fit(&sites(5), &[0.0; 5], 3, -1.0).is_err());
        assert!(BSpline::new(vec![0.0, 1.0], vec![1.0], 3).is_err());
    }
}
