//! Triangulation of polygon trees with `earcutr`.
//!
//! Each land node is cut together with its direct hole children; islands
//! inside those holes are land nodes of their own and are cut separately.

use super::core::Polygon;
use super::tree::{NodeId, PolyTree};
use crate::error::{Result, TerrainError};
use crate::primitives::Point2;
use num_traits::Float;

/// A triangle from polygon triangulation, represented by three points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonTriangle<F> {
    pub a: Point2<F>,
    pub b: Point2<F>,
    pub c: Point2<F>,
}

impl<F: Float> PolygonTriangle<F> {
    #[inline]
    pub fn new(a: Point2<F>, b: Point2<F>, c: Point2<F>) -> Self {
        Self { a, b, c }
    }

    /// Computes the area of the triangle.
    pub fn area(&self) -> F {
        let twice = (self.b - self.a).cross(self.c - self.a);
        twice.abs() / (F::one() + F::one())
    }

    /// Returns the centroid of the triangle.
    pub fn centroid(&self) -> Point2<F> {
        let three = F::one() + F::one() + F::one();
        Point2::new(
            (self.a.x + self.b.x + self.c.x) / three,
            (self.a.y + self.b.y + self.c.y) / three,
        )
    }
}

/// Triangles covering the land of a [`PolyTree`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Triangulation {
    pub triangles: Vec<PolygonTriangle<f64>>,
    /// Land node each triangle was cut from, parallel to `triangles`.
    pub nodes: Vec<NodeId>,
}

impl Triangulation {
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Total covered area.
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(PolygonTriangle::area).sum()
    }

    /// Triangles paired with the land node they belong to.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PolygonTriangle<f64>)> {
        self.nodes.iter().copied().zip(self.triangles.iter())
    }
}

/// Triangulates a single contour with holes.
pub fn triangulate_with_holes(
    outer: &Polygon<f64>,
    holes: &[&Polygon<f64>],
) -> Result<Vec<PolygonTriangle<f64>>> {
    if outer.len() < 3 {
        return Ok(Vec::new());
    }

    let mut points: Vec<Point2<f64>> = outer.vertices.clone();
    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes.iter().filter(|h| h.len() >= 3) {
        hole_indices.push(points.len());
        points.extend_from_slice(&hole.vertices);
    }

    let coords: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&coords, &hole_indices, 2)
        .map_err(|err| TerrainError::Triangulation(format!("{err:?}")))?;

    Ok(indices
        .chunks_exact(3)
        .map(|tri| PolygonTriangle::new(points[tri[0]], points[tri[1]], points[tri[2]]))
        .collect())
}

/// Triangulates every attached land node of `tree`.
pub fn triangulate_tree(tree: &PolyTree) -> Result<Triangulation> {
    let mut result = Triangulation::default();
    for id in tree.land_nodes() {
        let node = tree.node(id);
        let holes: Vec<&Polygon<f64>> = node
            .children
            .iter()
            .map(|&child| tree.node(child))
            .filter(|child| child.is_hole)
            .map(|child| &child.contour)
            .collect();

        let triangles = triangulate_with_holes(&node.contour, &holes)?;
        result.nodes.extend(std::iter::repeat(id).take(triangles.len()));
        result.triangles.extend(triangles);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_triangle_area_and_centroid() {
        let tri = PolygonTriangle::new(
            Point2::new(0.0_f64, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 3.0),
        );
        assert_relative_eq!(tri.area(), 4.5);
        let c = tri.centroid();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
    }

    #[test]
    fn test_square_is_two_triangles() {
        let triangles = triangulate_with_holes(&rect(0.0, 0.0, 1.0, 1.0), &[]).unwrap();
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn test_tree_area_preserved() {
        let tree = PolyTree::from_contours(vec![
            rect(0.0, 0.0, 100.0, 100.0),
            rect(20.0, 20.0, 80.0, 80.0),
            rect(40.0, 40.0, 60.0, 60.0),
        ]);
        let triangulation = triangulate_tree(&tree).unwrap();
        assert_relative_eq!(triangulation.area(), tree.area(), epsilon = 1e-6);

        let island = tree.land_nodes()[1];
        let island_triangles = triangulation.iter().filter(|(id, _)| *id == island).count();
        assert_eq!(island_triangles, 2);
    }

    #[test]
    fn test_empty_tree() {
        assert!(triangulate_tree(&PolyTree::new()).unwrap().is_empty());
    }
}
