//! Geometric predicates with explicit tolerance.

use crate::primitives::{Point2, Segment2};
use num_traits::Float;

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Points are counter-clockwise (positive area).
    CounterClockwise,
    /// Points are clockwise (negative area).
    Clockwise,
    /// Points are collinear (within tolerance).
    Collinear,
}

/// Computes the orientation of three points with tolerance.
///
/// Returns the orientation of the triangle formed by points `a`, `b`, `c`:
/// - `CounterClockwise` if `c` is to the left of the line from `a` to `b`
/// - `Clockwise` if `c` is to the right of the line from `a` to `b`
/// - `Collinear` if twice the signed area is within `eps` of zero
#[inline]
pub fn orient2d<F: Float>(a: Point2<F>, b: Point2<F>, c: Point2<F>, eps: F) -> Orientation {
    let cross = (b - a).cross(c - a);

    if cross > eps {
        Orientation::CounterClockwise
    } else if cross < -eps {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Returns the point where two segments cross strictly inside both of them.
///
/// Touching at endpoints, collinear overlap and parallel segments all yield
/// `None`; `eps` trims that much parameter space off each end.
pub fn proper_crossing<F: Float>(s1: Segment2<F>, s2: Segment2<F>, eps: F) -> Option<Point2<F>> {
    let d1 = s1.direction();
    let d2 = s2.direction();
    let cross = d1.cross(d2);
    if cross.abs() <= F::epsilon() * d1.magnitude() * d2.magnitude() {
        return None;
    }

    let d = s2.start - s1.start;
    let t1 = d.cross(d2) / cross;
    let t2 = d.cross(d1) / cross;
    let upper = F::one() - eps;
    if t1 > eps && t1 < upper && t2 > eps && t2 < upper {
        Some(s1.point_at(t1))
    } else {
        None
    }
}

/// Parameter along line `a1 → a2` where it meets the line `b1 → b2`.
///
/// Returns `None` when the lines are parallel or coincident, the only case
/// in which no single parameter exists.
pub fn line_line_intersection_t<F: Float>(
    a1: Point2<F>,
    a2: Point2<F>,
    b1: Point2<F>,
    b2: Point2<F>,
) -> Option<F> {
    let da = a2 - a1;
    let db = b2 - b1;
    let cross = da.cross(db);
    if cross.abs() <= F::epsilon() * da.magnitude() * db.magnitude() {
        return None;
    }
    Some((b1 - a1).cross(db) / cross)
}
