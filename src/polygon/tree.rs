//! Arena of nested contours produced by polygon algebra.
//!
//! Node 0 is the unbounded exterior. It has no contour and counts as a hole,
//! so depth parity decides the rest: depth 1 is land, depth 2 a hole in that
//! land, depth 3 an island inside the hole, and so on.

use super::core::{PointLocation, Polygon};
use crate::primitives::{Point2, Segment2};
use std::cmp::Ordering;
use tracing::debug;

/// Index of a node inside a [`PolyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Tolerance used when locating points against contours.
const LOCATE_EPS: f64 = 1e-9;

/// One contour of a [`PolyTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct PolyNode {
    /// Land contours wind counter-clockwise, hole contours clockwise.
    pub contour: Polygon<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub is_hole: bool,
    /// Crossover snapshot indices whose labeling point resolved to this node.
    pub crossover_snapshots: Vec<usize>,
    /// Eroded crossover segments, parallel to `crossover_snapshots`.
    pub eroded_crossover_segments: Vec<Segment2<f64>>,
}

impl PolyNode {
    fn new(contour: Polygon<f64>, parent: Option<NodeId>, is_hole: bool) -> Self {
        Self {
            contour,
            parent,
            children: Vec::new(),
            is_hole,
            crossover_snapshots: Vec::new(),
            eroded_crossover_segments: Vec::new(),
        }
    }
}

/// Hierarchical polygon-with-holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyTree {
    nodes: Vec<PolyNode>,
}

impl Default for PolyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyTree {
    /// The root node.
    pub const ROOT: NodeId = NodeId(0);

    /// Creates a tree holding only the exterior root.
    pub fn new() -> Self {
        Self {
            nodes: vec![PolyNode::new(Polygon::empty(), None, true)],
        }
    }

    /// Nests a flat list of non-overlapping contours by containment.
    ///
    /// Contours are processed largest first; each one descends from the root
    /// into whichever child contains it. Windings are normalized on insert.
    pub fn from_contours(contours: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        let mut contours: Vec<Polygon<f64>> = contours
            .into_iter()
            .filter(|c| c.len() >= 3 && c.area() > f64::EPSILON)
            .collect();
        contours.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap_or(Ordering::Equal));

        let mut tree = Self::new();
        for mut contour in contours {
            let mut parent = Self::ROOT;
            while let Some(&child) = tree.nodes[parent.0]
                .children
                .iter()
                .find(|&&child| encloses(&tree.nodes[child.0].contour, &contour))
            {
                parent = child;
            }

            let is_hole = !tree.nodes[parent.0].is_hole;
            if is_hole {
                contour.ensure_cw();
            } else {
                contour.ensure_ccw();
            }
            tree.push(contour, parent, is_hole);
        }
        tree
    }

    fn push(&mut self, contour: Polygon<f64>, parent: NodeId, is_hole: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PolyNode::new(contour, Some(parent), is_hole));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Borrows a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &PolyNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut PolyNode {
        &mut self.nodes[id.0]
    }

    /// Every node still attached to the root, in depth-first pre-order.
    /// The root itself is not included.
    pub fn attached(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Attached land nodes, in depth-first pre-order.
    pub fn land_nodes(&self) -> Vec<NodeId> {
        self.attached()
            .into_iter()
            .filter(|id| !self.nodes[id.0].is_hole)
            .collect()
    }

    /// True when nothing but the root is attached.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Land area minus hole area over the attached nodes.
    pub fn area(&self) -> f64 {
        self.attached()
            .into_iter()
            .map(|id| self.nodes[id.0].contour.signed_area())
            .sum()
    }

    /// Descends to the deepest node whose region contains `point`.
    ///
    /// A point on a land contour belongs to that land; a point on a hole
    /// contour stays with the enclosing land. Returns the root when the
    /// point is outside every contour. Check [`PolyNode::is_hole`] on the
    /// result to tell land from holes.
    pub fn pick_deepest(&self, point: Point2<f64>) -> NodeId {
        let mut current = Self::ROOT;
        while let Some(&child) = self.nodes[current.0].children.iter().find(|&&child| {
            let node = &self.nodes[child.0];
            match node.contour.locate_point(point, LOCATE_EPS) {
                PointLocation::Inside => true,
                PointLocation::Boundary => !node.is_hole,
                PointLocation::Outside => false,
            }
        }) {
            current = child;
        }
        current
    }

    /// Detaches every node whose contour area falls below `threshold`,
    /// together with its whole subtree. Returns the number of detached
    /// subtree roots.
    pub fn prune(&mut self, threshold: f64) -> usize {
        let mut pruned = 0;
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let children = std::mem::take(&mut self.nodes[id.0].children);
            let mut kept = Vec::with_capacity(children.len());
            for child in children {
                let area = self.nodes[child.0].contour.area();
                if area < threshold {
                    debug!(node = child.0, area, threshold, "pruning polygon fragment");
                    self.nodes[child.0].parent = None;
                    pruned += 1;
                } else {
                    kept.push(child);
                    stack.push(child);
                }
            }
            self.nodes[id.0].children = kept;
        }
        pruned
    }

    /// Directed edges bounding the region of `id`: its own contour plus the
    /// contours of its direct hole children. Land lies on the left of each.
    pub fn contour_and_child_hole_barriers(&self, id: NodeId) -> Vec<Segment2<f64>> {
        let node = &self.nodes[id.0];
        let mut barriers: Vec<Segment2<f64>> = node.contour.edges().collect();
        for &child in &node.children {
            let child = &self.nodes[child.0];
            if child.is_hole {
                barriers.extend(child.contour.edges());
            }
        }
        barriers
    }

    /// The attached contours as a flat list, windings preserved, suitable
    /// for a non-zero fill.
    pub fn flatten_to_polygons(&self) -> Vec<Polygon<f64>> {
        self.attached()
            .into_iter()
            .map(|id| self.nodes[id.0].contour.clone())
            .collect()
    }
}

/// `outer` encloses `inner` when no vertex of `inner` lies strictly outside
/// it and at least one lies strictly inside.
fn encloses(outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool {
    let mut any_inside = false;
    for &v in &inner.vertices {
        match outer.locate_point(v, LOCATE_EPS) {
            PointLocation::Outside => return false,
            PointLocation::Inside => any_inside = true,
            PointLocation::Boundary => {}
        }
    }
    any_inside
}
