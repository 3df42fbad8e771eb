//! sectorsight - Sector geometry and cross-sector visibility
//!
//! A tiled world is split into sectors joined by narrow portals
//! ("crossovers"). This library compiles each sector's walkable land for any
//! agent radius, caches it, and answers line-of-sight queries that follow the
//! view through portals into neighboring sectors.

pub mod config;
pub mod error;
pub mod polygon;
pub mod primitives;
pub mod terrain;
pub mod tolerance;
pub mod visibility;

pub use config::{GeometryConfig, PropagationConfig};
pub use error::{Result, TerrainError};
pub use primitives::{Affine2, Point2, Segment2, Vec2};
pub use terrain::{SectorId, SectorSnapshot, TerrainSnapshot, TerrainSnapshotBuilder};
pub use visibility::{VisibilityPolygon, VisibilityPropagator};
