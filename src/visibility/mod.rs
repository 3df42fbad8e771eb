//! Angular visibility around a viewer and its propagation through portals.
//!
//! # Example
//!
//! ```
//! use sectorsight::primitives::{Affine2, Point2, Segment2};
//! use sectorsight::terrain::{SectorId, TerrainSnapshotBuilder, TerrainStaticMetadata};
//! use sectorsight::visibility::{SnapshotOverlay, VisibilityPropagator};
//!
//! let mut builder = TerrainSnapshotBuilder::new(1);
//! builder.add_sector(SectorId(0), TerrainStaticMetadata::blank(1000.0, 1000.0), Affine2::identity());
//! builder.add_sector(
//!     SectorId(1),
//!     TerrainStaticMetadata::blank(1000.0, 1000.0),
//!     Affine2::translate(1000.0, 0.0),
//! );
//! builder
//!     .add_portal(
//!         SectorId(0),
//!         SectorId(1),
//!         Segment2::from_coords(1000.0, 600.0, 1000.0, 800.0),
//!         Segment2::from_coords(0.0, 600.0, 0.0, 800.0),
//!     )
//!     .unwrap();
//! let snapshot = builder.build().unwrap();
//!
//! let overlay = SnapshotOverlay::new(&snapshot, 0.0);
//! let result = VisibilityPropagator::new(&overlay)
//!     .propagate(SectorId(0), Point2::new(800.0, 700.0))
//!     .unwrap();
//! assert!(result.reached(SectorId(1)));
//! ```

mod overlay;
mod polygon;
mod propagate;

pub use overlay::{EdgeGroup, PortalEdge, SectorGraph, SnapshotOverlay};
pub use polygon::{
    angular_span, compare_at, compare_segments, faces, normalize_angle, AngularSpan,
    IntervalRange, RangeOwner, VisibilityPolygon,
};
pub use propagate::{PropagationResult, SectorVisibility, VisibilityPropagator};
