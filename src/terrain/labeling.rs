//! Attaches crossovers to the punched-land nodes that contain them.

use super::snapshot::{CrossoverId, CrossoverSnapshot, SectorId};
use crate::error::{Result, TerrainError};
use crate::polygon::{NodeId, PolyTree};
use crate::primitives::Segment2;
use ahash::AHashMap;

/// Reverse lookups from crossovers to the land node reachable through them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossoverLabels {
    pub by_crossover: AHashMap<CrossoverId, NodeId>,
    /// Indexed like the sector's crossover list; `None` for portals too
    /// narrow to survive erosion.
    pub by_snapshot: Vec<Option<NodeId>>,
}

impl CrossoverLabels {
    pub fn node_for(&self, crossover: CrossoverId) -> Option<NodeId> {
        self.by_crossover.get(&crossover).copied()
    }
}

/// A sector's walkable region at one radius, with its portals attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PunchedLand {
    pub tree: PolyTree,
    pub labels: CrossoverLabels,
}

impl PunchedLand {
    /// The land node containing the sector's end of `crossover`.
    pub fn node_for(&self, crossover: CrossoverId) -> Option<NodeId> {
        self.labels.node_for(crossover)
    }

    /// Barriers of every land node.
    pub fn barriers(&self) -> Vec<Segment2<f64>> {
        self.tree
            .land_nodes()
            .into_iter()
            .flat_map(|id| self.tree.contour_and_child_hole_barriers(id))
            .collect()
    }
}

/// Labels `tree` with every crossover whose eroded segment survived.
///
/// The start of each eroded segment is located in the tree; landing in a
/// hole (or outside all land) means the portal opens onto an obstacle.
pub fn label_crossovers(
    sector: SectorId,
    tree: &mut PolyTree,
    crossovers: &[CrossoverSnapshot],
    eroded: &[Option<Segment2<f64>>],
) -> Result<CrossoverLabels> {
    let mut labels = CrossoverLabels {
        by_crossover: AHashMap::with_capacity(crossovers.len()),
        by_snapshot: vec![None; crossovers.len()],
    };

    for (index, (snapshot, segment)) in crossovers.iter().zip(eroded).enumerate() {
        let Some(segment) = *segment else {
            continue;
        };

        let id = tree.pick_deepest(segment.start);
        if tree.node(id).is_hole {
            return Err(TerrainError::CrossoverInHole {
                sector,
                crossover: snapshot.crossover,
            });
        }

        let node = tree.node_mut(id);
        node.crossover_snapshots.push(index);
        node.eroded_crossover_segments.push(segment);
        labels.by_crossover.insert(snapshot.crossover, id);
        labels.by_snapshot[index] = Some(id);
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Polygon;
    use crate::primitives::Point2;

    fn crossover(id: u32, segment: Segment2<f64>) -> CrossoverSnapshot {
        CrossoverSnapshot {
            crossover: CrossoverId(id),
            remote: SectorId(9),
            local_segment: segment,
            remote_segment: segment,
        }
    }

    fn land_with_hole() -> PolyTree {
        PolyTree::from_contours(vec![
            Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(1000.0, 1000.0)),
            Polygon::rectangle(Point2::new(300.0, 300.0), Point2::new(700.0, 700.0)),
        ])
    }

    #[test]
    fn test_labels_land_node() {
        let mut tree = land_with_hole();
        let seg = Segment2::from_coords(0.0, 600.0, 0.0, 800.0);
        let crossovers = [crossover(1, seg), crossover(2, seg)];
        let eroded = [seg.eroded(2.0), None];

        let labels = label_crossovers(SectorId(0), &mut tree, &crossovers, &eroded).unwrap();
        let land = tree.land_nodes()[0];
        assert_eq!(labels.node_for(CrossoverId(1)), Some(land));
        assert_eq!(labels.node_for(CrossoverId(2)), None);
        assert_eq!(labels.by_snapshot, vec![Some(land), None]);
        assert_eq!(tree.node(land).crossover_snapshots, vec![0]);
        assert_eq!(tree.node(land).eroded_crossover_segments.len(), 1);
    }

    #[test]
    fn test_crossover_in_hole_is_fatal() {
        let mut tree = land_with_hole();
        let seg = Segment2::from_coords(500.0, 400.0, 500.0, 600.0);
        let err = label_crossovers(SectorId(3), &mut tree, &[crossover(5, seg)], &[Some(seg)])
            .unwrap_err();
        assert_eq!(
            err,
            TerrainError::CrossoverInHole {
                sector: SectorId(3),
                crossover: CrossoverId(5),
            }
        );
    }

    #[test]
    fn test_crossover_outside_land_is_fatal() {
        let mut tree = land_with_hole();
        let seg = Segment2::from_coords(1500.0, 400.0, 1500.0, 600.0);
        assert!(label_crossovers(SectorId(3), &mut tree, &[crossover(5, seg)], &[Some(seg)]).is_err());
    }
}
