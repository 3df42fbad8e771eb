//! Assembles and validates a [`TerrainSnapshot`].

use super::snapshot::{
    Crossover, CrossoverId, CrossoverSnapshot, SectorId, SectorSnapshot, TemporaryHole,
    TerrainSnapshot, TerrainStaticMetadata,
};
use crate::config::GeometryConfig;
use crate::error::{Result, TerrainError};
use crate::primitives::{Affine2, Point2, Segment2};
use crate::tolerance::proper_crossing;
use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::{debug, info_span};

#[derive(Debug, Clone)]
struct SectorDecl {
    metadata: TerrainStaticMetadata,
    world_transform: Affine2<f64>,
}

/// Collects sectors, portals and dynamic obstacles, then compiles them into
/// an immutable snapshot.
///
/// Building always compiles every sector's punched land at radius zero, plus
/// any radii registered with [`TerrainSnapshotBuilder::validate_at`], so a
/// portal that opens onto an obstacle fails the build instead of a later
/// query.
#[derive(Debug, Clone)]
pub struct TerrainSnapshotBuilder {
    version: u64,
    config: GeometryConfig,
    sectors: BTreeMap<SectorId, SectorDecl>,
    crossovers: Vec<Crossover>,
    temporary_holes: Vec<TemporaryHole>,
    validation_radii: Vec<f64>,
}

impl TerrainSnapshotBuilder {
    pub fn new(version: u64) -> Self {
        Self::with_config(version, GeometryConfig::default())
    }

    pub fn with_config(version: u64, config: GeometryConfig) -> Self {
        Self {
            version,
            config,
            sectors: BTreeMap::new(),
            crossovers: Vec::new(),
            temporary_holes: Vec::new(),
            validation_radii: Vec::new(),
        }
    }

    /// Registers a sector. Re-registering an id replaces it.
    pub fn add_sector(
        &mut self,
        id: SectorId,
        metadata: TerrainStaticMetadata,
        world_transform: Affine2<f64>,
    ) -> &mut Self {
        self.sectors.insert(
            id,
            SectorDecl {
                metadata,
                world_transform,
            },
        );
        self
    }

    /// Connects two sectors through a portal. `segment_a` and `segment_b` are
    /// the same portal in each sector's local frame, with matching endpoint
    /// order.
    pub fn add_portal(
        &mut self,
        a: SectorId,
        b: SectorId,
        segment_a: Segment2<f64>,
        segment_b: Segment2<f64>,
    ) -> Result<CrossoverId> {
        if a == b {
            return Err(TerrainError::SelfPortal(a));
        }
        for id in [a, b] {
            if !self.sectors.contains_key(&id) {
                return Err(TerrainError::UnknownSector(id));
            }
        }
        let id = CrossoverId(self.crossovers.len() as u32);
        self.crossovers.push(Crossover {
            id,
            sectors: [a, b],
            segments: [segment_a, segment_b],
        });
        Ok(id)
    }

    /// Registers a dynamic obstacle in world space. It is handed to every
    /// sector whose world bounds it overlaps.
    pub fn add_temporary_hole(&mut self, hole: TemporaryHole) -> &mut Self {
        self.temporary_holes.push(hole);
        self
    }

    /// Additionally compiles punched land at `radius` during the build.
    pub fn validate_at(&mut self, radius: f64) -> &mut Self {
        self.validation_radii.push(radius);
        self
    }

    pub fn build(self) -> Result<TerrainSnapshot> {
        let span = info_span!(
            "build_terrain_snapshot",
            version = self.version,
            sectors = self.sectors.len(),
            crossovers = self.crossovers.len()
        );
        let _guard = span.enter();

        let mut crossovers_by_sector: AHashMap<SectorId, Vec<CrossoverSnapshot>> = AHashMap::new();
        for crossover in &self.crossovers {
            for side in 0..2 {
                crossovers_by_sector
                    .entry(crossover.sectors[side])
                    .or_default()
                    .push(CrossoverSnapshot {
                        crossover: crossover.id,
                        remote: crossover.sectors[1 - side],
                        local_segment: crossover.segments[side],
                        remote_segment: crossover.segments[1 - side],
                    });
            }
        }

        let mut sector_snapshots = BTreeMap::new();
        for (id, decl) in self.sectors {
            let to_local = decl
                .world_transform
                .inverse()
                .ok_or(TerrainError::NonInvertibleTransform(id))?;
            let world_bounds = TemporaryHole::new(decl.metadata.local_included_contours.clone())
                .transformed(&decl.world_transform)
                .bounding_box();

            let holes: Vec<TemporaryHole> = self
                .temporary_holes
                .iter()
                .filter(|hole| match (world_bounds, hole.bounding_box()) {
                    (Some(sector), Some(hole)) => boxes_overlap(sector, hole),
                    _ => false,
                })
                .map(|hole| hole.transformed(&to_local))
                .collect();

            let mut sector = SectorSnapshot::new(
                id,
                decl.metadata,
                decl.world_transform,
                holes,
                crossovers_by_sector.remove(&id).unwrap_or_default(),
                self.config.clone(),
            )?;

            sector.punched_land(0.0)?;
            for &radius in &self.validation_radii {
                sector.punched_land(radius)?;
            }
            sector.barriers_between_crossovers = barriers_between_crossovers(&sector)?;

            debug!(
                sector = id.0,
                holes = sector.temporary_holes.len(),
                crossovers = sector.crossovers.len(),
                "sector snapshot compiled"
            );
            sector_snapshots.insert(id, sector);
        }

        let crossover_index = self
            .crossovers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();

        Ok(TerrainSnapshot {
            version: self.version,
            crossovers: self.crossovers,
            sector_snapshots,
            temporary_holes: self.temporary_holes,
            crossover_index,
        })
    }
}

fn boxes_overlap(a: (Point2<f64>, Point2<f64>), b: (Point2<f64>, Point2<f64>)) -> bool {
    a.0.x <= b.1.x && b.0.x <= a.1.x && a.0.y <= b.1.y && b.0.y <= a.1.y
}

/// Radius-zero land edges properly crossing the straight line between each
/// pair of crossover midpoints.
fn barriers_between_crossovers(
    sector: &SectorSnapshot,
) -> Result<BTreeMap<(usize, usize), Vec<Segment2<f64>>>> {
    let barriers = sector.punched_land(0.0)?.barriers();
    let mut out = BTreeMap::new();
    for (i, a) in sector.crossovers.iter().enumerate() {
        for (j, b) in sector.crossovers.iter().enumerate().skip(i + 1) {
            let link = Segment2::new(a.local_segment.midpoint(), b.local_segment.midpoint());
            let between: Vec<Segment2<f64>> = barriers
                .iter()
                .copied()
                .filter(|&barrier| proper_crossing(barrier, link, 0.0).is_some())
                .collect();
            if !between.is_empty() {
                out.insert((i, j), between);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Polygon;

    fn portal_segments() -> (Segment2<f64>, Segment2<f64>) {
        (
            Segment2::from_coords(1000.0, 600.0, 1000.0, 800.0),
            Segment2::from_coords(0.0, 600.0, 0.0, 800.0),
        )
    }

    #[test]
    fn test_portal_validation() {
        let mut builder = TerrainSnapshotBuilder::new(1);
        builder.add_sector(SectorId(0), TerrainStaticMetadata::blank(1000.0, 1000.0), Affine2::identity());
        let (a, b) = portal_segments();
        assert_eq!(
            builder.add_portal(SectorId(0), SectorId(0), a, b),
            Err(TerrainError::SelfPortal(SectorId(0)))
        );
        assert_eq!(
            builder.add_portal(SectorId(0), SectorId(5), a, b),
            Err(TerrainError::UnknownSector(SectorId(5)))
        );
    }

    #[test]
    fn test_build_pairs_crossovers_and_assigns_holes() {
        let mut builder = TerrainSnapshotBuilder::new(3);
        builder
            .add_sector(SectorId(0), TerrainStaticMetadata::blank(1000.0, 1000.0), Affine2::identity())
            .add_sector(
                SectorId(1),
                TerrainStaticMetadata::blank(1000.0, 1000.0),
                Affine2::translate(1000.0, 0.0),
            )
            .add_temporary_hole(TemporaryHole::rectangle(Point2::new(1500.0, 200.0), 40.0, 40.0, 0.0));
        let (a, b) = portal_segments();
        let id = builder.add_portal(SectorId(0), SectorId(1), a, b).unwrap();

        let snapshot = builder.build().unwrap();
        assert_eq!(snapshot.version, 3);
        assert_eq!(snapshot.crossover(id).unwrap().sectors, [SectorId(0), SectorId(1)]);

        let left = snapshot.sector(SectorId(0)).unwrap();
        let right = snapshot.sector(SectorId(1)).unwrap();
        assert_eq!(left.crossovers[0].remote, SectorId(1));
        assert_eq!(left.crossovers[0].local_segment, a);
        assert_eq!(right.crossovers[0].remote, SectorId(0));
        assert_eq!(right.crossovers[0].remote_segment, a);

        assert!(left.temporary_holes.is_empty());
        assert_eq!(right.temporary_holes.len(), 1);
        let (min, _) = right.temporary_holes[0].bounding_box().unwrap();
        assert!((min.x - 480.0).abs() < 1e-9);

        assert!(snapshot.sector(SectorId(7)).is_err());
    }

    #[test]
    fn test_build_fails_on_blocked_portal() {
        let metadata = TerrainStaticMetadata::blank(1000.0, 1000.0).with_excluded(
            Polygon::rectangle(Point2::new(900.0, 500.0), Point2::new(1100.0, 900.0)),
        );
        let mut builder = TerrainSnapshotBuilder::new(1);
        builder
            .add_sector(SectorId(0), metadata, Affine2::identity())
            .add_sector(
                SectorId(1),
                TerrainStaticMetadata::blank(1000.0, 1000.0),
                Affine2::translate(1000.0, 0.0),
            );
        let (a, b) = portal_segments();
        builder.add_portal(SectorId(0), SectorId(1), a, b).unwrap();
        assert!(matches!(
            builder.build(),
            Err(TerrainError::CrossoverInHole { sector: SectorId(0), .. })
        ));
    }

    #[test]
    fn test_barriers_between_crossovers() {
        // A wall across the middle separates the west and east portals; the
        // north portal sees the west one unobstructed.
        let metadata = TerrainStaticMetadata::blank(1000.0, 1000.0)
            .with_excluded(Polygon::rectangle(Point2::new(450.0, 100.0), Point2::new(550.0, 700.0)));
        let mut builder = TerrainSnapshotBuilder::new(1);
        for (id, dx, dy) in [(0, 0.0, 0.0), (1, -1000.0, 0.0), (2, 1000.0, 0.0), (3, 0.0, 1000.0)] {
            let metadata = if id == 0 {
                metadata.clone()
            } else {
                TerrainStaticMetadata::blank(1000.0, 1000.0)
            };
            builder.add_sector(SectorId(id), metadata, Affine2::translate(dx, dy));
        }
        builder
            .add_portal(
                SectorId(0),
                SectorId(1),
                Segment2::from_coords(0.0, 300.0, 0.0, 500.0),
                Segment2::from_coords(1000.0, 300.0, 1000.0, 500.0),
            )
            .unwrap();
        builder
            .add_portal(
                SectorId(0),
                SectorId(2),
                Segment2::from_coords(1000.0, 300.0, 1000.0, 500.0),
                Segment2::from_coords(0.0, 300.0, 0.0, 500.0),
            )
            .unwrap();
        builder
            .add_portal(
                SectorId(0),
                SectorId(3),
                Segment2::from_coords(100.0, 1000.0, 300.0, 1000.0),
                Segment2::from_coords(100.0, 0.0, 300.0, 0.0),
            )
            .unwrap();

        let snapshot = builder.build().unwrap();
        let center = snapshot.sector(SectorId(0)).unwrap();
        assert_eq!(center.barriers_between(0, 1).len(), 2);
        assert_eq!(center.barriers_between(1, 0).len(), 2);
        assert!(center.barriers_between(0, 2).is_empty());
    }
}
