//! 2D ray type.

use super::{Point2, Segment2, Vec2};
use num_traits::Float;

/// A 2D ray defined by an origin point and direction.
///
/// The direction is stored as-is (not necessarily normalized).
///
/// # Example
///
/// ```
/// use sectorsight::primitives::{Ray2, Point2, Segment2};
///
/// let ray: Ray2<f64> = Ray2::from_angle(Point2::origin(), 0.0);
/// let wall = Segment2::from_coords(5.0, -1.0, 5.0, 1.0);
///
/// let (t_ray, t_wall) = ray.intersect_segment_line(&wall).unwrap();
/// assert!((t_ray - 5.0).abs() < 1e-12);
/// assert!((t_wall - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray2<F> {
    pub origin: Point2<F>,
    pub direction: Vec2<F>,
}

impl<F: Float> Ray2<F> {
    /// Creates a new ray from origin and direction.
    #[inline]
    pub fn new(origin: Point2<F>, direction: Vec2<F>) -> Self {
        Self { origin, direction }
    }

    /// Creates a unit-direction ray leaving `origin` at angle `theta`.
    #[inline]
    pub fn from_angle(origin: Point2<F>, theta: F) -> Self {
        Self {
            origin,
            direction: Vec2::from_radius_angle(F::one(), theta),
        }
    }

    /// Returns the point along the ray at parameter t.
    #[inline]
    pub fn point_at(&self, t: F) -> Point2<F> {
        self.origin + self.direction * t
    }

    /// Intersects the ray's supporting line with the segment's supporting line.
    ///
    /// Returns `(t_ray, t_segment)`; neither parameter is clamped, callers
    /// decide which ranges count as a hit. Returns `None` for parallel lines.
    pub fn intersect_segment_line(&self, segment: &Segment2<F>) -> Option<(F, F)> {
        let seg_dir = segment.direction();
        let cross = self.direction.cross(seg_dir);
        if cross.abs() <= F::epsilon() * seg_dir.magnitude().max(F::one()) {
            return None;
        }

        let delta = segment.start - self.origin;
        let t_ray = delta.cross(seg_dir) / cross;
        let t_seg = delta.cross(self.direction) / cross;
        Some((t_ray, t_seg))
    }

    /// Distance along the ray to the segment's supporting line.
    ///
    /// Returns infinity when the line is parallel or behind the origin.
    pub fn distance_to_segment_line(&self, segment: &Segment2<F>) -> F {
        match self.intersect_segment_line(segment) {
            Some((t, _)) if t >= F::zero() => t * self.direction.magnitude(),
            _ => F::infinity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_diagonal_hit() {
        let ray: Ray2<f64> = Ray2::from_angle(Point2::origin(), FRAC_PI_4);
        let wall = Segment2::from_coords(10.0, 0.0, 10.0, 20.0);
        let d = ray.distance_to_segment_line(&wall);
        assert_relative_eq!(d, 10.0 * 2f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_parallel_is_infinite() {
        let ray: Ray2<f64> = Ray2::from_angle(Point2::origin(), 0.0);
        let wall = Segment2::from_coords(0.0, 1.0, 10.0, 1.0);
        assert!(ray.intersect_segment_line(&wall).is_none());
        assert!(ray.distance_to_segment_line(&wall).is_infinite());
    }

    #[test]
    fn test_behind_origin_is_infinite() {
        let ray: Ray2<f64> = Ray2::from_angle(Point2::origin(), 0.0);
        let wall = Segment2::from_coords(-5.0, -1.0, -5.0, 1.0);
        assert!(ray.distance_to_segment_line(&wall).is_infinite());
    }
}
