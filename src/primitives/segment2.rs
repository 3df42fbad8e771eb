//! 2D line segment type.

use super::{Point2, Vec2};
use num_traits::Float;
use std::cmp::Ordering;

/// A 2D line segment defined by two endpoints.
///
/// Used for crossover (portal) segments, barrier edges, and visible
/// sub-segments propagated between sectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2<F> {
    pub start: Point2<F>,
    pub end: Point2<F>,
}

impl<F: Float> Segment2<F> {
    /// Creates a new segment from two points.
    #[inline]
    pub fn new(start: Point2<F>, end: Point2<F>) -> Self {
        Self { start, end }
    }

    /// Creates a segment from coordinate pairs.
    #[inline]
    pub fn from_coords(x1: F, y1: F, x2: F, y2: F) -> Self {
        Self {
            start: Point2::new(x1, y1),
            end: Point2::new(x2, y2),
        }
    }

    /// Returns the direction vector from start to end.
    #[inline]
    pub fn direction(self) -> Vec2<F> {
        self.end - self.start
    }

    /// Returns the length of the segment.
    #[inline]
    pub fn length(self) -> F {
        self.start.distance(self.end)
    }

    /// Returns the midpoint of the segment.
    #[inline]
    pub fn midpoint(self) -> Point2<F> {
        self.start.midpoint(self.end)
    }

    /// Returns the point at parameter `t` along the segment.
    ///
    /// - `t = 0` returns `start`
    /// - `t = 1` returns `end`
    #[inline]
    pub fn point_at(self, t: F) -> Point2<F> {
        self.start.lerp(self.end, t)
    }

    /// Returns the reversed segment (start and end swapped).
    #[inline]
    pub fn reversed(self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// Shrinks both endpoints towards each other by `amount`.
    ///
    /// Returns `None` when the segment is not longer than `2 * amount`:
    /// nothing of it survives the erosion.
    pub fn eroded(self, amount: F) -> Option<Self> {
        let length = self.length();
        let two = F::one() + F::one();
        if length <= two * amount {
            return None;
        }
        let shrink = self.direction() * (amount / length);
        Some(Self {
            start: self.start + shrink,
            end: self.end - shrink,
        })
    }

    /// Sub-segment between parameters `t0` and `t1`.
    #[inline]
    pub fn slice(self, t0: F, t1: F) -> Self {
        Self {
            start: self.point_at(t0),
            end: self.point_at(t1),
        }
    }

    /// Lexicographic total order on (start, end).
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.start
            .lexicographic_cmp(&other.start)
            .then_with(|| self.end.lexicographic_cmp(&other.end))
    }
}

impl<F: Float> From<(Point2<F>, Point2<F>)> for Segment2<F> {
    fn from((start, end): (Point2<F>, Point2<F>)) -> Self {
        Self::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_and_midpoint() {
        let s: Segment2<f64> = Segment2::from_coords(0.0, 0.0, 6.0, 8.0);
        assert_eq!(s.length(), 10.0);
        assert_eq!(s.midpoint(), Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_point_at() {
        let s: Segment2<f64> = Segment2::from_coords(0.0, 600.0, 0.0, 800.0);
        assert_eq!(s.point_at(0.0).y, 600.0);
        assert_eq!(s.point_at(0.5).y, 700.0);
        assert_eq!(s.point_at(1.0).y, 800.0);
    }

    #[test]
    fn test_eroded_shrinks_both_ends() {
        let s: Segment2<f64> = Segment2::from_coords(1000.0, 600.0, 1000.0, 800.0);
        let e = s.eroded(15.0).unwrap();
        assert_relative_eq!(e.start.y, 615.0, epsilon = 1e-10);
        assert_relative_eq!(e.end.y, 785.0, epsilon = 1e-10);
        assert_relative_eq!(e.length(), 170.0, epsilon = 1e-10);
    }

    #[test]
    fn test_eroded_too_narrow() {
        let s: Segment2<f64> = Segment2::from_coords(0.0, 0.0, 30.0, 0.0);
        assert!(s.eroded(15.0).is_none());
        assert!(s.eroded(14.9).is_some());
    }

    #[test]
    fn test_slice() {
        let s: Segment2<f64> = Segment2::from_coords(0.0, 0.0, 10.0, 0.0);
        let sub = s.slice(0.2, 0.7);
        assert_relative_eq!(sub.start.x, 2.0);
        assert_relative_eq!(sub.end.x, 7.0);
    }
}
