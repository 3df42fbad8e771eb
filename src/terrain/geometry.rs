//! Per-radius derived geometry of a [`SectorSnapshot`].
//!
//! Every query buckets its radius with [`RadiusKey`] and computes with the
//! bucket's radius, so callers that differ by less than half a quantum share
//! one cache entry and see identical geometry.

use super::cache::{PointKey, RadiusKey};
use super::labeling::{label_crossovers, PunchedLand};
use super::snapshot::SectorSnapshot;
use crate::error::Result;
use crate::polygon::{
    extrude_segment, triangulate_tree, OffsetBuilder, PolyTree, Polygon, PunchBuilder,
    Triangulation,
};
use crate::primitives::{Point2, Segment2};
use crate::visibility::{faces, VisibilityPolygon};
use std::sync::Arc;
use tracing::debug;

impl SectorSnapshot {
    fn radius_key(&self, radius: f64) -> Result<RadiusKey> {
        RadiusKey::quantize(radius, self.config.radius_quantum)
    }

    /// Union of every obstacle (permanent and temporary) grown by `radius`.
    pub fn dilated_holes_union(&self, radius: f64) -> Result<Arc<PolyTree>> {
        let key = self.radius_key(radius)?;
        self.caches.dilated_holes_union.get_or_compute(key, || {
            let radius = key.radius(self.config.radius_quantum);
            let obstacles = self
                .metadata
                .local_excluded_contours
                .iter()
                .chain(self.temporary_holes.iter().flat_map(|h| h.polygons.iter()))
                .cloned();
            let tree = OffsetBuilder::new()
                .include(obstacles)
                .dilate(radius)
                .miter_limit(self.config.miter_limit)
                .execute()?;
            debug!(sector = self.id.0, radius, area = tree.area(), "dilated holes union");
            Ok(tree)
        })
    }

    /// Every crossover shrunk by `radius` at both ends, parallel to
    /// [`SectorSnapshot::crossovers`]. Portals no longer than `2 * radius`
    /// come back as `None`.
    pub fn eroded_crossover_segments(&self, radius: f64) -> Result<Arc<Vec<Option<Segment2<f64>>>>> {
        let key = self.radius_key(radius)?;
        self.caches.eroded_crossover_segments.get_or_compute(key, || {
            let radius = key.radius(self.config.radius_quantum);
            Ok(self
                .crossovers
                .iter()
                .map(|c| c.local_segment.eroded(radius))
                .collect())
        })
    }

    /// The sector's walkable region for an agent of `radius`, with portal
    /// corridors kept open and crossovers attached to their land nodes.
    ///
    /// Fails with [`crate::TerrainError::CrossoverInHole`] when a portal
    /// opens onto an obstacle.
    pub fn punched_land(&self, radius: f64) -> Result<Arc<PunchedLand>> {
        let key = self.radius_key(radius)?;
        self.caches.punched_land.get_or_compute(key, || {
            let radius = key.radius(self.config.radius_quantum);
            self.compute_punched_land(radius)
        })
    }

    fn compute_punched_land(&self, radius: f64) -> Result<PunchedLand> {
        let land = OffsetBuilder::new()
            .include(self.metadata.local_included_contours.iter().cloned())
            .erode(radius)
            .miter_limit(self.config.miter_limit)
            .execute()?;

        // Corridors through each portal: narrower portals are eroded harder,
        // and the strip is only as wide as the erosion left room for.
        let erosion = (2.0 * radius).ceil() as i64;
        let dilation = erosion / 2 + 2;
        let strips: Vec<Polygon<f64>> = self
            .eroded_crossover_segments(erosion as f64)?
            .iter()
            .flatten()
            .filter_map(|&segment| extrude_segment(segment, dilation as f64))
            .collect();

        let holes = self.dilated_holes_union(radius)?;
        let mut tree = PunchBuilder::new()
            .include(land.flatten_to_polygons())
            .include(strips)
            .exclude(holes.flatten_to_polygons())
            .execute()?;

        let pruned = tree.prune(self.config.prune_area_threshold);

        let labeling_radius = radius + self.config.crossover_pathing_dilation;
        let eroded = self.eroded_crossover_segments(labeling_radius)?;
        let labels = label_crossovers(self.id, &mut tree, &self.crossovers, &eroded)?;

        debug!(
            sector = self.id.0,
            radius,
            land_nodes = tree.land_nodes().len(),
            pruned,
            "compiled punched land"
        );
        Ok(PunchedLand { tree, labels })
    }

    /// Triangles covering [`SectorSnapshot::punched_land`] at `radius`.
    pub fn triangulation(&self, radius: f64) -> Result<Arc<Triangulation>> {
        let key = self.radius_key(radius)?;
        self.caches.triangulation.get_or_compute(key, || {
            let radius = key.radius(self.config.radius_quantum);
            let land = self.punched_land(radius)?;
            let triangulation = triangulate_tree(&land.tree)?;
            debug!(sector = self.id.0, radius, triangles = triangulation.len(), "triangulated");
            Ok(triangulation)
        })
    }

    /// What a point at `origin` (local frame) sees inside its own land node.
    ///
    /// `origin` is snapped to the radius quantum grid before computing, so
    /// the polygon's origin is the grid point, not the argument.
    ///
    /// An origin outside all land sees nothing: every direction stays
    /// infinitesimally near.
    pub fn line_of_sight(&self, radius: f64, origin: Point2<f64>) -> Result<Arc<VisibilityPolygon>> {
        let quantum = self.config.radius_quantum;
        let key = (
            self.radius_key(radius)?,
            PointKey::quantize(origin.x, origin.y, quantum),
        );
        self.caches.line_of_sight.get_or_compute(key, || {
            let radius = key.0.radius(quantum);
            let (x, y) = key.1.point(quantum);
            let origin = Point2::new(x, y);
            let land = self.punched_land(radius)?;
            let node = land.tree.pick_deepest(origin);

            let mut polygon = VisibilityPolygon::new(origin);
            if land.tree.node(node).is_hole {
                return Ok(polygon);
            }
            for barrier in land.tree.contour_and_child_hole_barriers(node) {
                if faces(&barrier, origin) {
                    polygon.insert(barrier);
                }
            }
            Ok(polygon)
        })
    }
}
