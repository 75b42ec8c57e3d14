//! Reference path built from a B-spline through (or around) a list of waypoints
//!
//! Both coordinates are fitted against the waypoint index, `t = 0..N-1`, and
//! the curve is resampled at `n_path_points` parameters per waypoint interval.

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::common::{Point2D, Pose2D, SimError, SimResult, TrackingPath};
use crate::path::bspline::BSpline;

/// How the spline relates to its waypoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplineFit {
    /// Pass through the waypoints; a positive `smoothness` trades exactness
    /// for a smaller second-difference penalty
    Interpolate { smoothness: f64 },
    /// Use the waypoints as B-spline control points
    ControlPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub degree: usize,
    /// Samples per waypoint interval
    pub n_path_points: usize,
    pub fit: SplineFit,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            degree: 3,
            n_path_points: 15,
            fit: SplineFit::ControlPoints,
        }
    }
}

impl PathConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.degree == 0 {
            return Err(SimError::InvalidParameter("spline degree must be at least 1".to_string()));
        }
        if self.n_path_points == 0 {
            return Err(SimError::InvalidParameter("n_path_points must be at least 1".to_string()));
        }
        if let SplineFit::Interpolate { smoothness } = self.fit {
            if !(smoothness.is_finite() && smoothness >= 0.0) {
                return Err(SimError::InvalidParameter(format!(
                    "smoothness must be non-negative, found {}",
                    smoothness
                )));
            }
        }
        Ok(())
    }
}

/// x(t), y(t) and their first two derivatives
#[derive(Debug, Clone)]
struct PlanarSpline {
    x: BSpline,
    dx: BSpline,
    ddx: BSpline,
    y: BSpline,
    dy: BSpline,
    ddy: BSpline,
}

impl PlanarSpline {
    fn new(x: BSpline, y: BSpline) -> Self {
        let dx = x.derivative();
        let ddx = dx.derivative();
        let dy = y.derivative();
        let ddy = dy.derivative();
        Self { x, dx, ddx, y, dy, ddy }
    }

    fn pose(&self, t: f64) -> Pose2D {
        Pose2D::new(self.x.eval(t), self.y.eval(t), self.dy.eval(t).atan2(self.dx.eval(t)))
    }

    /// Magnitude of the tangent, zero where waypoints coincide
    fn speed(&self, t: f64) -> f64 {
        self.dx.eval(t).hypot(self.dy.eval(t))
    }

    fn curvature(&self, t: f64) -> f64 {
        let (dx, dy) = (self.dx.eval(t), self.dy.eval(t));
        let (ddx, ddy) = (self.ddx.eval(t), self.ddy.eval(t));
        let k = (dx * ddy - dy * ddx) / (dx * dx + dy * dy).powf(1.5);
        if k.is_finite() {
            k
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct BSplinePath {
    config: PathConfig,
    spline: Option<PlanarSpline>,
    samples: Vec<Pose2D>,
    stations: Vec<f64>,
    /// Spline parameter of each sample
    params: Vec<f64>,
}

impl BSplinePath {
    pub fn new(config: PathConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            spline: None,
            samples: Vec::new(),
            stations: Vec::new(),
            params: Vec::new(),
        })
    }

    /// Empty path with the default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: PathConfig::default(),
            spline: None,
            samples: Vec::new(),
            stations: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    pub fn stations(&self) -> &[f64] {
        &self.stations
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    fn clear(&mut self) {
        self.spline = None;
        self.samples.clear();
        self.stations.clear();
        self.params.clear();
    }

    fn fit_spline(&self, waypoints: &[Point2D]) -> SimResult<PlanarSpline> {
        let sites: Vec<f64> = (0..waypoints.len()).map(|i| i as f64).collect();
        let xs: Vec<f64> = waypoints.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = waypoints.iter().map(|p| p.y).collect();
        let degree = self.config.degree;
        let (x, y) = match self.config.fit {
            SplineFit::Interpolate { smoothness } => (
                BSpline::fit(&sites, &xs, degree, smoothness)?,
                BSpline::fit(&sites, &ys, degree, smoothness)?,
            ),
            SplineFit::ControlPoints => (
                BSpline::from_control_points(&sites, &xs, degree)?,
                BSpline::from_control_points(&sites, &ys, degree)?,
            ),
        };
        Ok(PlanarSpline::new(x, y))
    }

    fn sample_spline(&mut self, spline: PlanarSpline, n_waypoints: usize) {
        let t_end = (n_waypoints - 1) as f64;
        let n = (self.config.n_path_points * (n_waypoints - 1)).max(2);
        for i in 0..n {
            let t = t_end * i as f64 / (n - 1) as f64;
            let mut pose = spline.pose(t);
            // a vanishing tangent has no heading, keep the previous one
            if spline.speed(t) < 1e-12 {
                if let Some(prev) = self.samples.last() {
                    pose.theta = prev.theta;
                }
            }
            self.samples.push(pose);
            self.params.push(t);
        }
        self.spline = Some(spline);
    }

    /// Straight segments between the raw waypoints, each carrying its own heading
    fn sample_linear(&mut self, waypoints: &[Point2D]) {
        let n = self.config.n_path_points;
        let mut heading = 0.0;
        for (i, (a, b)) in waypoints.iter().tuple_windows().enumerate() {
            let d = *b - *a;
            heading = d.y.atan2(d.x);
            for j in 0..n {
                let s = j as f64 / n as f64;
                let p = *a + d * s;
                self.samples.push(Pose2D::new(p.x, p.y, heading));
                self.params.push(i as f64 + s);
            }
        }
        if let Some(last) = waypoints.last() {
            self.samples.push(Pose2D::new(last.x, last.y, heading));
            self.params.push((waypoints.len() - 1) as f64);
        }
    }

    fn update_stations(&mut self) {
        self.stations.reserve(self.samples.len());
        self.stations.push(0.0);
        let mut station = 0.0;
        for (a, b) in self.samples.iter().tuple_windows() {
            station += a.distance(b);
            self.stations.push(station);
        }
    }

    /// Spline parameter at `station`, interpolated between the bracketing samples
    fn param_at_station(&self, station: f64) -> Option<f64> {
        let first = *self.stations.first()?;
        let last = *self.stations.last()?;
        if station.is_nan() || station <= first {
            return self.params.first().copied();
        }
        if station >= last {
            return self.params.last().copied();
        }
        let hi = self.stations.partition_point(|&s| s < station);
        let lo = hi - 1;
        let span = self.stations[hi] - self.stations[lo];
        if span <= 0.0 {
            return Some(self.params[hi]);
        }
        let frac = (station - self.stations[lo]) / span;
        Some(self.params[lo] + frac * (self.params[hi] - self.params[lo]))
    }
}

impl Default for BSplinePath {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TrackingPath for BSplinePath {
    fn update(&mut self, waypoints: &[Point2D]) {
        self.clear();
        if waypoints.len() <= 1 {
            return;
        }

        if waypoints.len() <= self.config.degree {
            self.sample_linear(waypoints);
        } else {
            match self.fit_spline(waypoints) {
                Ok(spline) => self.sample_spline(spline, waypoints.len()),
                Err(e) => {
                    warn!("B-spline fit failed ({}), falling back to straight segments", e);
                    self.sample_linear(waypoints);
                }
            }
        }
        self.update_stations();
        debug!(
            "path rebuilt from {} waypoints: {} samples, {:.2} m",
            waypoints.len(),
            self.samples.len(),
            self.stations.last().copied().unwrap_or(0.0)
        );
    }

    fn get_nearest_pose(&self, point: Point2D) -> Option<(Pose2D, f64)> {
        let mut nearest: Option<(usize, f64)> = None;
        for (i, pose) in self.samples.iter().enumerate() {
            let d = pose.point().distance(&point);
            match nearest {
                Some((_, d_min)) if d >= d_min => {}
                _ => nearest = Some((i, d)),
            }
        }
        nearest.map(|(i, _)| (self.samples[i], self.stations[i]))
    }

    fn get_pose_at_station(&self, station: f64) -> Option<Pose2D> {
        if station.is_nan() {
            return self.samples.first().copied();
        }
        self.stations
            .iter()
            .position(|&s| station <= s)
            .map(|i| self.samples[i])
            .or_else(|| self.samples.last().copied())
    }

    fn get_curv_at_station(&self, station: f64) -> f64 {
        match (&self.spline, self.param_at_station(station)) {
            (Some(spline), Some(t)) => spline.curvature(t),
            _ => 0.0,
        }
    }

    fn end_station(&self) -> Option<f64> {
        self.stations.last().copied()
    }

    fn samples(&self) -> &[Pose2D] {
        &self.samples
    }
}
