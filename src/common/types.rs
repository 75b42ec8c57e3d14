//! Geometry primitives used throughout trolley_sim
//!
//! Every function here is pure and deterministic: identical inputs give
//! bit-identical outputs.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::Vector2;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (*self - *other).norm()
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product of the two vectors
    pub fn cross(&self, other: &Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotate counter-clockwise about the origin by `angle` [rad]
    pub fn rot(&self, angle: f64) -> Point2D {
        let (s, c) = angle.sin_cos();
        Point2D::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2D {
    type Output = Point2D;

    fn neg(self) -> Point2D {
        Point2D::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + heading)
///
/// `theta` may hold any real value; wrap it with [`pi_2_pi`] before comparing
/// headings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, theta: 0.0 }
    }

    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn distance(&self, other: &Pose2D) -> f64 {
        self.point().distance(&other.point())
    }
}

impl From<Point2D> for Pose2D {
    fn from(p: Point2D) -> Self {
        Self { x: p.x, y: p.y, theta: 0.0 }
    }
}

/// Compose `delta`, expressed in the body frame of `base`, into the frame
/// `base` is expressed in.
pub fn add_body_frame(base: &Pose2D, delta: &Pose2D) -> Pose2D {
    let offset = delta.point().rot(base.theta);
    Pose2D::new(base.x + offset.x, base.y + offset.y, base.theta + delta.theta)
}

/// Unit vector pointing along `angle`
pub fn unit_vec2(angle: f64) -> Point2D {
    let (s, c) = angle.sin_cos();
    Point2D::new(c, s)
}

/// Wrap an angle into (-pi, pi]
pub fn pi_2_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
        assert!((p2.norm() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_point2d_rot_and_products() {
        let p = Point2D::new(1.0, 0.0).rot(PI / 2.0);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);

        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(3.0, -1.0);
        assert_eq!(a.dot(&b), 1.0);
        assert_eq!(a.cross(&b), -7.0);
        assert_eq!(a + b, Point2D::new(4.0, 1.0));
        assert_eq!(a - b, Point2D::new(-2.0, 3.0));
    }

    #[test]
    fn test_add_body_frame() {
        let base = Pose2D::new(1.0, 1.0, PI / 2.0);
        let rear = add_body_frame(&base, &Pose2D::new(-1.5, 0.0, 0.0));
        assert!((rear.x - 1.0).abs() < 1e-12);
        assert!((rear.y + 0.5).abs() < 1e-12);
        assert_eq!(rear.theta, base.theta);

        let left = add_body_frame(&Pose2D::origin(), &Pose2D::new(0.0, 2.0, 0.3));
        assert_eq!(left, Pose2D::new(0.0, 2.0, 0.3));
    }

    #[test]
    fn test_pi_2_pi_range() {
        assert!((pi_2_pi(3.0 * PI) - PI).abs() < 1e-12);
        assert!((pi_2_pi(-PI) - PI).abs() < 1e-12);
        assert!((pi_2_pi(PI) - PI).abs() < 1e-12);
        assert!((pi_2_pi(0.5) - 0.5).abs() < 1e-12);
        assert!((pi_2_pi(-0.5 - 4.0 * PI) + 0.5).abs() < 1e-12);
        for i in -50..50 {
            let a = pi_2_pi(i as f64 * 0.37);
            assert!(a > -PI && a <= PI);
        }
    }

    #[test]
    fn test_unit_vec2() {
        let u = unit_vec2(PI / 4.0);
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((u.x - u.y).abs() < 1e-12);
    }
}
