//! Immutable per-sector and whole-terrain snapshots.

use super::cache::{KeyedCache, PointKey, RadiusKey};
use super::labeling::PunchedLand;
use crate::config::GeometryConfig;
use crate::error::{Result, TerrainError};
use crate::polygon::{PolyTree, Polygon, Triangulation};
use crate::primitives::{Affine2, Point2, Segment2};
use crate::visibility::VisibilityPolygon;
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Identifies a sector of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorId(pub u32);

/// Identifies a logical portal shared by two sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrossoverId(pub u32);

/// Authored, local-space outline of a sector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerrainStaticMetadata {
    /// Walkable outlines.
    pub local_included_contours: Vec<Polygon<f64>>,
    /// Permanent obstacles.
    pub local_excluded_contours: Vec<Polygon<f64>>,
}

impl TerrainStaticMetadata {
    /// A fully walkable `width` x `height` sector anchored at the local origin.
    pub fn blank(width: f64, height: f64) -> Self {
        Self {
            local_included_contours: vec![Polygon::rectangle(
                Point2::origin(),
                Point2::new(width, height),
            )],
            local_excluded_contours: Vec::new(),
        }
    }

    pub fn with_excluded(mut self, contour: Polygon<f64>) -> Self {
        self.local_excluded_contours.push(contour);
        self
    }
}

/// A dynamic obstacle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemporaryHole {
    pub polygons: Vec<Polygon<f64>>,
}

impl TemporaryHole {
    pub fn new(polygons: Vec<Polygon<f64>>) -> Self {
        Self { polygons }
    }

    /// A `width` x `height` rectangle centered on `center`, rotated by
    /// `rotation` radians about its center.
    pub fn rectangle(center: Point2<f64>, width: f64, height: f64, rotation: f64) -> Self {
        let place = Affine2::rotation(rotation).then(Affine2::translate(center.x, center.y));
        let (hw, hh) = (width / 2.0, height / 2.0);
        let corners = Polygon::rectangle(Point2::new(-hw, -hh), Point2::new(hw, hh));
        Self::new(vec![corners.map_points(|p| place.apply_point(p))])
    }

    /// The same hole expressed in another frame.
    pub fn transformed(&self, transform: &Affine2<f64>) -> Self {
        Self::new(
            self.polygons
                .iter()
                .map(|p| p.map_points(|v| transform.apply_point(v)))
                .collect(),
        )
    }

    /// Axis-aligned bounds over every polygon.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        self.polygons
            .iter()
            .filter_map(Polygon::bounding_box)
            .reduce(|(lo, hi), (a, b)| {
                (
                    Point2::new(lo.x.min(a.x), lo.y.min(a.y)),
                    Point2::new(hi.x.max(b.x), hi.y.max(b.y)),
                )
            })
    }
}

/// One directed side of a portal, as seen from the owning sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverSnapshot {
    pub crossover: CrossoverId,
    pub remote: SectorId,
    /// The portal in this sector's frame.
    pub local_segment: Segment2<f64>,
    /// The same portal in the remote sector's frame.
    pub remote_segment: Segment2<f64>,
}

/// A logical portal between two sectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossover {
    pub id: CrossoverId,
    pub sectors: [SectorId; 2],
    /// The portal segment in each sector's local frame, parallel to `sectors`.
    pub segments: [Segment2<f64>; 2],
}

#[derive(Debug, Default)]
pub(crate) struct SectorCaches {
    pub(crate) dilated_holes_union: KeyedCache<RadiusKey, PolyTree>,
    pub(crate) eroded_crossover_segments: KeyedCache<RadiusKey, Vec<Option<Segment2<f64>>>>,
    pub(crate) punched_land: KeyedCache<RadiusKey, PunchedLand>,
    pub(crate) triangulation: KeyedCache<RadiusKey, Triangulation>,
    pub(crate) line_of_sight: KeyedCache<(RadiusKey, PointKey), VisibilityPolygon>,
}

/// One sector's resolved geometry at a point in time.
///
/// All derived geometry is computed lazily per radius and memoized; see the
/// query methods in [`crate::terrain`].
#[derive(Debug)]
pub struct SectorSnapshot {
    pub id: SectorId,
    pub metadata: TerrainStaticMetadata,
    pub world_transform: Affine2<f64>,
    pub world_transform_inv: Affine2<f64>,
    /// Dynamic obstacles in this sector's frame.
    pub temporary_holes: Vec<TemporaryHole>,
    pub crossovers: Vec<CrossoverSnapshot>,
    /// Land edges separating two crossovers, keyed by their indices into
    /// `crossovers`.
    pub barriers_between_crossovers: BTreeMap<(usize, usize), Vec<Segment2<f64>>>,
    pub(crate) config: GeometryConfig,
    pub(crate) caches: SectorCaches,
}

impl SectorSnapshot {
    pub fn new(
        id: SectorId,
        metadata: TerrainStaticMetadata,
        world_transform: Affine2<f64>,
        temporary_holes: Vec<TemporaryHole>,
        crossovers: Vec<CrossoverSnapshot>,
        config: GeometryConfig,
    ) -> Result<Self> {
        let world_transform_inv = world_transform
            .inverse()
            .ok_or(TerrainError::NonInvertibleTransform(id))?;
        Ok(Self {
            id,
            metadata,
            world_transform,
            world_transform_inv,
            temporary_holes,
            crossovers,
            barriers_between_crossovers: BTreeMap::new(),
            config,
            caches: SectorCaches::default(),
        })
    }

    #[inline]
    pub fn world_to_local(&self, point: Point2<f64>) -> Point2<f64> {
        self.world_transform_inv.apply_point(point)
    }

    #[inline]
    pub fn world_to_local_segment(&self, segment: Segment2<f64>) -> Segment2<f64> {
        self.world_transform_inv.apply_segment(segment)
    }

    #[inline]
    pub fn local_to_world(&self, point: Point2<f64>) -> Point2<f64> {
        self.world_transform.apply_point(point)
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// World-space bounds of the included contours.
    pub fn world_bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let hole = TemporaryHole::new(self.metadata.local_included_contours.clone());
        hole.transformed(&self.world_transform).bounding_box()
    }

    /// Barriers between two crossovers, in either order.
    pub fn barriers_between(&self, a: usize, b: usize) -> &[Segment2<f64>] {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.barriers_between_crossovers
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Every sector, portal and dynamic obstacle valid at one version.
#[derive(Debug, Default)]
pub struct TerrainSnapshot {
    pub version: u64,
    pub crossovers: Vec<Crossover>,
    pub sector_snapshots: BTreeMap<SectorId, SectorSnapshot>,
    /// World-space dynamic obstacles as registered.
    pub temporary_holes: Vec<TemporaryHole>,
    pub(crate) crossover_index: AHashMap<CrossoverId, usize>,
}

impl TerrainSnapshot {
    pub fn sector(&self, id: SectorId) -> Result<&SectorSnapshot> {
        self.sector_snapshots
            .get(&id)
            .ok_or(TerrainError::UnknownSector(id))
    }

    pub fn crossover(&self, id: CrossoverId) -> Option<&Crossover> {
        self.crossover_index.get(&id).map(|&i| &self.crossovers[i])
    }

    pub fn sector_ids(&self) -> impl Iterator<Item = SectorId> + '_ {
        self.sector_snapshots.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_local_mapping() {
        let sector = SectorSnapshot::new(
            SectorId(1),
            TerrainStaticMetadata::blank(1000.0, 1000.0),
            Affine2::translate(-500.0, -500.0),
            Vec::new(),
            Vec::new(),
            GeometryConfig::default(),
        )
        .unwrap();

        let local = sector.world_to_local(Point2::new(0.0, -30.0));
        assert_eq!(local, Point2::new(500.0, 470.0));
        assert_eq!(sector.local_to_world(local), Point2::new(0.0, -30.0));

        let seg = sector.world_to_local_segment(Segment2::from_coords(500.0, 100.0, 500.0, 300.0));
        assert_eq!(seg, Segment2::from_coords(1000.0, 600.0, 1000.0, 800.0));

        let (min, max) = sector.world_bounding_box().unwrap();
        assert_eq!(min, Point2::new(-500.0, -500.0));
        assert_eq!(max, Point2::new(500.0, 500.0));
    }

    #[test]
    fn test_singular_transform_rejected() {
        let err = SectorSnapshot::new(
            SectorId(4),
            TerrainStaticMetadata::blank(10.0, 10.0),
            Affine2::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            Vec::new(),
            Vec::new(),
            GeometryConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, TerrainError::NonInvertibleTransform(SectorId(4)));
    }

    #[test]
    fn test_rectangle_hole() {
        let hole = TemporaryHole::rectangle(Point2::new(0.0, -30.0), 100.0, 180.0, 0.0);
        let (min, max) = hole.bounding_box().unwrap();
        assert_relative_eq!(min.x, -50.0);
        assert_relative_eq!(min.y, -120.0);
        assert_relative_eq!(max.x, 50.0);
        assert_relative_eq!(max.y, 60.0);

        let turned = TemporaryHole::rectangle(Point2::origin(), 100.0, 20.0, std::f64::consts::FRAC_PI_2);
        let (min, max) = turned.bounding_box().unwrap();
        assert_relative_eq!(max.x - min.x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(max.y - min.y, 100.0, epsilon = 1e-9);
        assert_relative_eq!(turned.polygons[0].area(), 2000.0, epsilon = 1e-9);
    }
}
