//! Sector adjacency as seen by the visibility propagator.

use crate::error::Result;
use crate::primitives::{Affine2, Segment2};
use crate::terrain::{SectorId, TerrainSnapshot};
use std::fmt::Debug;
use std::hash::Hash;

/// A portal seen from its source sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalEdge {
    /// The portal in the source sector's frame.
    pub source_segment: Segment2<f64>,
    /// The same portal in the destination sector's frame; parameter `t`
    /// along one maps to `t` along the other.
    pub destination_segment: Segment2<f64>,
}

/// All portals leading from one sector into one neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGroup<N> {
    pub neighbor: N,
    pub edges: Vec<PortalEdge>,
}

/// Adjacency provider for [`super::VisibilityPropagator`].
pub trait SectorGraph {
    type Node: Copy + Eq + Hash + Debug;

    /// Land boundary edges of `node` in its local frame, land on the left.
    fn barriers(&self, node: Self::Node) -> Result<Vec<Segment2<f64>>>;

    fn outbound_edge_groups(&self, node: Self::Node) -> Result<Vec<EdgeGroup<Self::Node>>>;

    /// Local-to-world transform of `node`.
    fn world_transform(&self, node: Self::Node) -> Result<Affine2<f64>>;

    /// World-to-local transform of `node`.
    fn world_transform_inv(&self, node: Self::Node) -> Result<Affine2<f64>>;
}

/// [`SectorGraph`] over a [`TerrainSnapshot`] at a fixed agent radius.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOverlay<'a> {
    pub snapshot: &'a TerrainSnapshot,
    pub radius: f64,
}

impl<'a> SnapshotOverlay<'a> {
    pub fn new(snapshot: &'a TerrainSnapshot, radius: f64) -> Self {
        Self { snapshot, radius }
    }
}

impl SectorGraph for SnapshotOverlay<'_> {
    type Node = SectorId;

    fn barriers(&self, node: SectorId) -> Result<Vec<Segment2<f64>>> {
        Ok(self.snapshot.sector(node)?.punched_land(self.radius)?.barriers())
    }

    /// Groups the sector's crossovers by remote sector, in the order each
    /// remote first appears.
    fn outbound_edge_groups(&self, node: SectorId) -> Result<Vec<EdgeGroup<SectorId>>> {
        let sector = self.snapshot.sector(node)?;
        let mut groups: Vec<EdgeGroup<SectorId>> = Vec::new();
        for crossover in &sector.crossovers {
            let edge = PortalEdge {
                source_segment: crossover.local_segment,
                destination_segment: crossover.remote_segment,
            };
            match groups.iter_mut().find(|g| g.neighbor == crossover.remote) {
                Some(group) => group.edges.push(edge),
                None => groups.push(EdgeGroup {
                    neighbor: crossover.remote,
                    edges: vec![edge],
                }),
            }
        }
        Ok(groups)
    }

    fn world_transform(&self, node: SectorId) -> Result<Affine2<f64>> {
        Ok(self.snapshot.sector(node)?.world_transform)
    }

    fn world_transform_inv(&self, node: SectorId) -> Result<Affine2<f64>> {
        Ok(self.snapshot.sector(node)?.world_transform_inv)
    }
}
