//! Sector snapshots and their memoized per-radius geometry.
//!
//! A [`TerrainSnapshot`] is assembled once by [`TerrainSnapshotBuilder`] and
//! read concurrently afterwards. Each [`SectorSnapshot`] answers geometry
//! queries for any agent radius:
//!
//! - [`SectorSnapshot::dilated_holes_union`]: obstacles grown by the radius
//! - [`SectorSnapshot::eroded_crossover_segments`]: portals shrunk by it
//! - [`SectorSnapshot::punched_land`]: walkable land with portals labeled
//! - [`SectorSnapshot::triangulation`]: the land cut into triangles
//! - [`SectorSnapshot::line_of_sight`]: a viewer's visibility polygon

mod builder;
mod cache;
mod geometry;
mod labeling;
mod snapshot;

pub use builder::TerrainSnapshotBuilder;
pub use cache::{KeyedCache, PointKey, RadiusKey};
pub use labeling::{label_crossovers, CrossoverLabels, PunchedLand};
pub use snapshot::{
    Crossover, CrossoverId, CrossoverSnapshot, SectorId, SectorSnapshot, TemporaryHole,
    TerrainSnapshot, TerrainStaticMetadata,
};
