//! Contours, polygon trees, and the algebra that produces them.
//!
//! # Example
//!
//! ```
//! use sectorsight::polygon::{Polygon, PunchBuilder};
//! use sectorsight::primitives::Point2;
//!
//! let land = Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(100.0, 100.0));
//! let rock = Polygon::rectangle(Point2::new(40.0, 40.0), Point2::new(60.0, 60.0));
//!
//! let tree = PunchBuilder::new().include([land]).exclude([rock]).execute().unwrap();
//! let land_node = tree.land_nodes()[0];
//! assert_eq!(tree.node(land_node).children.len(), 1); // the rock is a hole
//! ```

mod algebra;
mod core;
mod tree;
mod triangulate;

pub use algebra::{extrude_segment, OffsetBuilder, PunchBuilder};
pub use core::{polygon_signed_area, PointLocation, Polygon};
pub use tree::{NodeId, PolyNode, PolyTree};
pub use triangulate::{triangulate_tree, triangulate_with_holes, PolygonTriangle, Triangulation};
