//! Core polygon type and basic measurements.

use crate::primitives::{Point2, Segment2, Vec2};
use num_traits::Float;

/// A simple closed contour represented as a sequence of vertices.
///
/// The contour is implicitly closed (the last vertex connects to the first).
/// Land contours are kept counter-clockwise and hole contours clockwise, so
/// the walkable side is always on the left of every edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon<F> {
    /// The contour vertices.
    pub vertices: Vec<Point2<F>>,
}

/// Where a point lies relative to a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    Boundary,
}

impl<F: Float> Polygon<F> {
    /// Creates a new polygon from vertices.
    #[inline]
    pub fn new(vertices: Vec<Point2<F>>) -> Self {
        Self { vertices }
    }

    /// Creates an empty polygon.
    #[inline]
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    /// Axis-aligned counter-clockwise rectangle spanning `min..max`.
    pub fn rectangle(min: Point2<F>, max: Point2<F>) -> Self {
        Self::new(vec![
            min,
            Point2::new(max.x, min.y),
            max,
            Point2::new(min.x, max.y),
        ])
    }

    /// Returns true if the polygon has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the signed area of the polygon using the shoelace formula.
    ///
    /// Positive for CCW winding, negative for CW winding.
    pub fn signed_area(&self) -> F {
        polygon_signed_area(&self.vertices)
    }

    /// Returns the absolute area of the polygon.
    pub fn area(&self) -> F {
        self.signed_area().abs()
    }

    /// Returns true when the winding is counter-clockwise.
    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > F::zero()
    }

    /// Iterates the closed contour's edges in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = Segment2<F>> + '_ {
        let n = self.vertices.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| Segment2::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Classifies `point` against the contour.
    ///
    /// Points within `eps` of an edge report [`PointLocation::Boundary`];
    /// everything else is decided by crossing parity.
    pub fn locate_point(&self, point: Point2<F>, eps: F) -> PointLocation {
        if self.vertices.len() < 3 {
            return PointLocation::Outside;
        }
        if self
            .edges()
            .any(|edge| distance_to_segment(point, edge) <= eps)
        {
            return PointLocation::Boundary;
        }

        let mut inside = false;
        let n = self.vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if ((vi.y > point.y) != (vj.y > point.y))
                && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
            {
                inside = !inside;
            }
            j = i;
        }

        if inside {
            PointLocation::Inside
        } else {
            PointLocation::Outside
        }
    }

    /// Tests if a point is strictly inside the polygon.
    #[inline]
    pub fn contains(&self, point: Point2<F>) -> bool {
        self.locate_point(point, F::epsilon()) == PointLocation::Inside
    }

    /// Returns the bounding box as (min, max) points.
    pub fn bounding_box(&self) -> Option<(Point2<F>, Point2<F>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices[1..].iter().fold((first, first), |(lo, hi), v| {
            (
                Point2::new(lo.x.min(v.x), lo.y.min(v.y)),
                Point2::new(hi.x.max(v.x), hi.y.max(v.y)),
            )
        }))
    }

    /// Ensures the polygon has CCW winding order.
    pub fn ensure_ccw(&mut self) {
        if self.signed_area() < F::zero() {
            self.vertices.reverse();
        }
    }

    /// Ensures the polygon has CW winding order.
    pub fn ensure_cw(&mut self) {
        if self.signed_area() > F::zero() {
            self.vertices.reverse();
        }
    }

    /// Returns a polygon with reversed winding order.
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }

    /// Maps every vertex through `f`.
    pub fn map_points(&self, f: impl Fn(Point2<F>) -> Point2<F>) -> Self {
        Self::new(self.vertices.iter().map(|&v| f(v)).collect())
    }
}

/// Computes the signed area of a polygon using the shoelace formula.
///
/// Positive for CCW winding, negative for CW winding.
pub fn polygon_signed_area<F: Float>(vertices: &[Point2<F>]) -> F {
    if vertices.len() < 3 {
        return F::zero();
    }

    let n = vertices.len();
    let twice = (0..n).fold(F::zero(), |acc, i| {
        let j = (i + 1) % n;
        acc + vertices[i].x * vertices[j].y - vertices[j].x * vertices[i].y
    });

    twice / (F::one() + F::one())
}

/// Euclidean distance from `point` to the closed segment.
pub(crate) fn distance_to_segment<F: Float>(point: Point2<F>, segment: Segment2<F>) -> F {
    let d: Vec2<F> = segment.direction();
    let len_sq = d.magnitude_squared();
    if len_sq <= F::epsilon() {
        return point.distance(segment.start);
    }
    let t = ((point - segment.start).dot(d) / len_sq)
        .max(F::zero())
        .min(F::one());
    point.distance(segment.point_at(t))
}
