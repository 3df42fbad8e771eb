//! 2D affine transformation type.

use super::{Point2, Segment2, Vec2};
use num_traits::Float;

/// A 2D affine transformation matrix.
///
/// Represented as a 2x3 matrix in row-major order:
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// ```
///
/// Sector snapshots carry one of these as their sector-to-world transform and
/// another as its inverse.
///
/// # Example
///
/// ```
/// use sectorsight::primitives::{Affine2, Point2};
///
/// let to_world: Affine2<f64> = Affine2::translate(-1500.0, -500.0);
/// let to_local = to_world.inverse().unwrap();
///
/// let world = to_world.apply_point(Point2::new(800.0, 700.0));
/// assert_eq!(world, Point2::new(-700.0, 200.0));
/// assert_eq!(to_local.apply_point(world), Point2::new(800.0, 700.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2<F> {
    pub a: F,
    pub b: F,
    pub c: F,
    pub d: F,
    pub tx: F,
    pub ty: F,
}

impl<F: Float> Affine2<F> {
    /// Creates a new affine transform from matrix components.
    #[inline]
    pub fn new(a: F, b: F, c: F, d: F, tx: F, ty: F) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Creates the identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self::translate(F::zero(), F::zero())
    }

    /// Creates a translation transform from x and y components.
    #[inline]
    pub fn translate(tx: F, ty: F) -> Self {
        Self {
            a: F::one(),
            b: F::zero(),
            c: F::zero(),
            d: F::one(),
            tx,
            ty,
        }
    }

    /// Creates a rotation transform around the origin.
    ///
    /// Angle is in radians, positive is counter-clockwise.
    #[inline]
    pub fn rotation(angle: F) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            a: cos_a,
            b: -sin_a,
            c: sin_a,
            d: cos_a,
            tx: F::zero(),
            ty: F::zero(),
        }
    }

    /// Applies this transform to a point.
    #[inline]
    pub fn apply_point(&self, p: Point2<F>) -> Point2<F> {
        Point2::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    /// Applies this transform to a vector (no translation).
    #[inline]
    pub fn apply_vec(&self, v: Vec2<F>) -> Vec2<F> {
        Vec2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }

    /// Applies this transform to both endpoints of a segment.
    #[inline]
    pub fn apply_segment(&self, s: Segment2<F>) -> Segment2<F> {
        Segment2::new(self.apply_point(s.start), self.apply_point(s.end))
    }

    /// Composes this transform with another (self * other).
    ///
    /// The resulting transform applies `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.a * other.tx + self.b * other.ty + self.tx,
            ty: self.c * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Returns a transform that applies `self` first, then `other`.
    #[inline]
    pub fn then(&self, other: Self) -> Self {
        other.compose(self)
    }

    /// Returns the determinant of the linear part.
    #[inline]
    pub fn determinant(&self) -> F {
        self.a * self.d - self.b * self.c
    }

    /// Returns the inverse transform, if it exists.
    ///
    /// Returns `None` if the transform is singular (determinant is zero).
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < F::epsilon() {
            return None;
        }

        let inv_det = F::one() / det;
        Some(Self {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            tx: (self.b * self.ty - self.d * self.tx) * inv_det,
            ty: (self.c * self.tx - self.a * self.ty) * inv_det,
        })
    }
}

impl<F: Float> Default for Affine2<F> {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translation_round_trip() {
        let t: Affine2<f64> = Affine2::translate(500.0, -500.0);
        let inv = t.inverse().unwrap();
        let p = Point2::new(12.0, 34.0);
        assert_eq!(inv.apply_point(t.apply_point(p)), p);
    }

    #[test]
    fn test_rotation_then_translation() {
        let t: Affine2<f64> = Affine2::rotation(FRAC_PI_2).then(Affine2::translate(10.0, 0.0));
        let p = t.apply_point(Point2::new(1.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);

        let back = t.inverse().unwrap().apply_point(p);
        assert_relative_eq!(back.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(back.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_apply_segment() {
        let t: Affine2<f64> = Affine2::translate(-500.0, -500.0);
        let s = t.apply_segment(Segment2::from_coords(0.0, 600.0, 0.0, 800.0));
        assert_eq!(s, Segment2::from_coords(-500.0, 100.0, -500.0, 300.0));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let t: Affine2<f64> = Affine2::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
        assert!(t.inverse().is_none());
    }
}
