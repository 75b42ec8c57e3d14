//! Reference paths: B-spline and straight-line geometry, error helpers and
//! waypoint generators

pub mod bspline;
pub mod spline_path;
pub mod straight_path;
pub mod path_utils;
pub mod generator;

pub use bspline::BSpline;
pub use spline_path::{BSplinePath, PathConfig, SplineFit};
pub use straight_path::StraightPath;
pub use path_utils::{get_cross_err, get_path_unit_norm};
pub use generator::{SinusoidGenerator, SinusoidParams, WaypointWindow};
