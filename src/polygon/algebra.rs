//! Polygon algebra on top of `clipper2`.
//!
//! Every operation takes flat contour lists, runs a non-zero fill through
//! clipper, and nests the output into a [`PolyTree`]. Coordinates go through
//! clipper's fixed-point scaler, so results are snapped to 1/100 of a unit.

use super::core::Polygon;
use super::tree::PolyTree;
use crate::error::{Result, TerrainError};
use crate::primitives::{Point2, Segment2};
use clipper2::{difference, union, EndType, FillRule, JoinType, Paths};

fn to_paths(contours: &[Polygon<f64>]) -> Paths {
    let coords: Vec<Vec<(f64, f64)>> = contours
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| c.vertices.iter().map(|&p| p.into()).collect())
        .collect();
    coords.into()
}

fn from_paths(paths: Paths) -> Vec<Polygon<f64>> {
    let coords: Vec<Vec<(f64, f64)>> = paths.into();
    coords
        .into_iter()
        .filter(|path| path.len() >= 3)
        .map(|path| Polygon::new(path.into_iter().map(Point2::from).collect()))
        .collect()
}

fn algebra_error(err: impl std::fmt::Debug) -> TerrainError {
    TerrainError::PolygonAlgebra(format!("{err:?}"))
}

/// Normalizes arbitrarily wound, possibly overlapping contours into their
/// non-zero union.
fn normalize(contours: &[Polygon<f64>]) -> Result<Paths> {
    let empty: Paths = Vec::<Vec<(f64, f64)>>::new().into();
    union(to_paths(contours), empty, FillRule::NonZero).map_err(algebra_error)
}

/// Union of a contour set, optionally grown or shrunk with round joins.
///
/// ```
/// use sectorsight::polygon::{OffsetBuilder, Polygon};
/// use sectorsight::primitives::Point2;
///
/// let square = Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(100.0, 100.0));
/// let tree = OffsetBuilder::new().include([square]).erode(10.0).execute().unwrap();
/// assert!((tree.area() - 6400.0).abs() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct OffsetBuilder {
    contours: Vec<Polygon<f64>>,
    delta: f64,
    miter_limit: f64,
}

impl Default for OffsetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetBuilder {
    pub fn new() -> Self {
        Self {
            contours: Vec::new(),
            delta: 0.0,
            miter_limit: 2.0,
        }
    }

    /// Adds contours to the operand set.
    pub fn include(mut self, contours: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        self.contours.extend(contours);
        self
    }

    /// Grows the union outward by `radius`.
    pub fn dilate(mut self, radius: f64) -> Self {
        self.delta = radius;
        self
    }

    /// Shrinks the union inward by `radius`.
    pub fn erode(mut self, radius: f64) -> Self {
        self.delta = -radius;
        self
    }

    pub fn miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    pub fn execute(self) -> Result<PolyTree> {
        if self.contours.is_empty() {
            return Ok(PolyTree::new());
        }
        let mut paths = normalize(&self.contours)?;
        if self.delta != 0.0 {
            paths = paths.inflate(self.delta, JoinType::Round, EndType::Polygon, self.miter_limit);
        }
        Ok(PolyTree::from_contours(from_paths(paths)))
    }
}

/// `included − excluded` under a non-zero fill.
#[derive(Debug, Clone, Default)]
pub struct PunchBuilder {
    included: Vec<Polygon<f64>>,
    excluded: Vec<Polygon<f64>>,
}

impl PunchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, contours: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        self.included.extend(contours);
        self
    }

    pub fn exclude(mut self, contours: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        self.excluded.extend(contours);
        self
    }

    pub fn execute(self) -> Result<PolyTree> {
        if self.included.is_empty() {
            return Ok(PolyTree::new());
        }
        let paths = if self.excluded.is_empty() {
            normalize(&self.included)?
        } else {
            difference(
                to_paths(&self.included),
                to_paths(&self.excluded),
                FillRule::NonZero,
            )
            .map_err(algebra_error)?
        };
        Ok(PolyTree::from_contours(from_paths(paths)))
    }
}

/// Rectangle around `segment` reaching `half_width` past each endpoint and
/// to either side, wound counter-clockwise.
///
/// Returns `None` for a zero-length segment.
pub fn extrude_segment(segment: Segment2<f64>, half_width: f64) -> Option<Polygon<f64>> {
    let along = segment.direction().normalize()? * half_width;
    let across = along.perpendicular();
    let start = segment.start - along;
    let end = segment.end + along;
    Some(Polygon::new(vec![
        start - across,
        end - across,
        end + across,
        start + across,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_union_merges_overlap() {
        let tree = OffsetBuilder::new()
            .include([rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 0.0, 15.0, 10.0)])
            .execute()
            .unwrap();
        assert_eq!(tree.land_nodes().len(), 1);
        assert_relative_eq!(tree.area(), 150.0, epsilon = 1e-6);
    }

    #[test]
    fn test_union_accepts_clockwise_input() {
        let tree = OffsetBuilder::new()
            .include([rect(0.0, 0.0, 10.0, 10.0).reversed()])
            .execute()
            .unwrap();
        assert_relative_eq!(tree.area(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_erode_and_dilate() {
        let square = rect(0.0, 0.0, 100.0, 100.0);
        let eroded = OffsetBuilder::new()
            .include([square.clone()])
            .erode(10.0)
            .execute()
            .unwrap();
        assert_relative_eq!(eroded.area(), 6400.0, epsilon = 1.0);

        // Round joins: 100² + 4·100·10 + π·10².
        let dilated = OffsetBuilder::new()
            .include([square])
            .dilate(10.0)
            .execute()
            .unwrap();
        let expected = 10000.0 + 4000.0 + std::f64::consts::PI * 100.0;
        assert_relative_eq!(dilated.area(), expected, max_relative = 0.01);
    }

    #[test]
    fn test_erode_to_nothing() {
        let tree = OffsetBuilder::new()
            .include([rect(0.0, 0.0, 10.0, 10.0)])
            .erode(6.0)
            .execute()
            .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_punch_leaves_hole() {
        let tree = PunchBuilder::new()
            .include([rect(0.0, 0.0, 100.0, 100.0)])
            .exclude([rect(40.0, 40.0, 60.0, 60.0)])
            .execute()
            .unwrap();
        let land = tree.land_nodes();
        assert_eq!(land.len(), 1);
        assert_eq!(tree.node(land[0]).children.len(), 1);
        assert_relative_eq!(tree.area(), 9600.0, epsilon = 1e-6);
    }

    #[test]
    fn test_extrude_segment_square_caps() {
        let strip = extrude_segment(Segment2::from_coords(0.0, 0.0, 10.0, 0.0), 2.0).unwrap();
        assert!(strip.is_ccw());
        assert_relative_eq!(strip.area(), 14.0 * 4.0, epsilon = 1e-9);
        let (min, max) = strip.bounding_box().unwrap();
        assert_relative_eq!(min.x, -2.0, epsilon = 1e-12);
        assert_relative_eq!(max.x, 12.0, epsilon = 1e-12);
        assert!(extrude_segment(Segment2::from_coords(1.0, 1.0, 1.0, 1.0), 2.0).is_none());
    }
}
