//! Unbounded reference line along the global x axis

use crate::common::{Point2D, Pose2D, TrackingPath};

/// The line `y = 0`, heading `0`, with station equal to `x`.
///
/// Waypoints are ignored. The path has no end, so [`TrackingPath::end_station`]
/// is `None` and no samples are exposed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightPath;

impl TrackingPath for StraightPath {
    fn update(&mut self, _waypoints: &[Point2D]) {}

    fn get_nearest_pose(&self, point: Point2D) -> Option<(Pose2D, f64)> {
        Some((Pose2D::new(point.x, 0.0, 0.0), point.x))
    }

    fn get_pose_at_station(&self, station: f64) -> Option<Pose2D> {
        Some(Pose2D::new(station, 0.0, 0.0))
    }

    fn get_curv_at_station(&self, _station: f64) -> f64 {
        0.0
    }

    fn end_station(&self) -> Option<f64> {
        None
    }

    fn samples(&self) -> &[Pose2D] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_path_queries() {
        let mut path = StraightPath;
        path.update(&[Point2D::new(3.0, 3.0)]);
        let (pose, station) = path.get_nearest_pose(Point2D::new(4.0, -2.0)).unwrap();
        assert_eq!(pose, Pose2D::new(4.0, 0.0, 0.0));
        assert_eq!(station, 4.0);
        assert_eq!(path.get_pose_at_station(12.5).unwrap(), Pose2D::new(12.5, 0.0, 0.0));
        assert_eq!(path.get_curv_at_station(1.0), 0.0);
        assert!(path.end_station().is_none());
        assert!(path.samples().is_empty());
    }
}
