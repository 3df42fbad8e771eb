//! Visibility propagation across sector portals.
//!
//! Each visited sector gets its own [`VisibilityPolygon`]. The origin sector
//! starts out with nothing visible; a neighbor starts out fully visible but
//! only the angles that came in through its inbound portal windows may pass
//! on to further sectors.

use super::overlay::{PortalEdge, SectorGraph};
use super::polygon::{faces, RangeOwner, VisibilityPolygon};
use crate::config::PropagationConfig;
use crate::error::Result;
use crate::primitives::{Point2, Segment2, Vec2};
use crate::tolerance::line_line_intersection_t;
use ahash::{AHashMap, AHashSet};
use std::cmp::Ordering;
use tracing::{debug, info_span, trace, warn};

/// Parameter gap under which two visible stretches of a portal are merged.
const MERGE_EPS: f64 = 1e-9;

/// One sector as reached by the propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorVisibility<N> {
    pub sector: N,
    /// The viewer's position in this sector's frame.
    pub origin: Point2<f64>,
    pub polygon: VisibilityPolygon,
    /// Visible portal stretches the view entered through; empty for the
    /// origin sector.
    pub inbound: Vec<Segment2<f64>>,
}

#[derive(Debug, Clone)]
pub struct PropagationResult<N> {
    /// Every sector visit in traversal order.
    pub visits: Vec<SectorVisibility<N>>,
    /// Visible stretches of remote crossover segments, per reached sector,
    /// in that sector's frame. Stretches of one crossover reached along
    /// several paths are merged, so no part of it is listed twice.
    pub visible_segments: AHashMap<N, Vec<Segment2<f64>>>,
    /// Portal sub-ranges dropped because a ray ran parallel to the portal.
    pub skipped_intersections: usize,
}

impl<N> Default for PropagationResult<N> {
    fn default() -> Self {
        Self {
            visits: Vec::new(),
            visible_segments: AHashMap::new(),
            skipped_intersections: 0,
        }
    }
}

impl<N: Copy + Eq + std::hash::Hash> PropagationResult<N> {
    /// Visible crossover stretches in `sector`, empty if it was never reached.
    pub fn visible_in(&self, sector: N) -> &[Segment2<f64>] {
        self.visible_segments
            .get(&sector)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reached(&self, sector: N) -> bool {
        self.visible_segments.contains_key(&sector)
    }
}

/// Visible parameter intervals per destination crossover, in first-reached
/// order.
type ReachedStretches = Vec<(Segment2<f64>, Vec<(f64, f64)>)>;

struct WorkItem<N> {
    sector: N,
    origin: Point2<f64>,
    inbound: Vec<Segment2<f64>>,
    visited: AHashSet<N>,
}

/// Walks a [`SectorGraph`] outward from a viewer.
pub struct VisibilityPropagator<'g, G: SectorGraph> {
    graph: &'g G,
    config: PropagationConfig,
}

impl<'g, G: SectorGraph> VisibilityPropagator<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self::with_config(graph, PropagationConfig::default())
    }

    pub fn with_config(graph: &'g G, config: PropagationConfig) -> Self {
        Self { graph, config }
    }

    /// Computes what a viewer at `origin_point` (in `origin_sector`'s frame)
    /// sees, following portals into neighboring sectors.
    ///
    /// A sector is never re-entered along the path that led to it.
    pub fn propagate(
        &self,
        origin_sector: G::Node,
        origin_point: Point2<f64>,
    ) -> Result<PropagationResult<G::Node>> {
        let span = info_span!("propagate_visibility", sector = ?origin_sector);
        let _guard = span.enter();

        let mut result = PropagationResult::default();
        let mut reached_by: AHashMap<G::Node, ReachedStretches> = AHashMap::new();
        let mut stack = vec![WorkItem {
            sector: origin_sector,
            origin: origin_point,
            inbound: Vec::new(),
            visited: AHashSet::new(),
        }];

        while let Some(item) = stack.pop() {
            if let Some(limit) = self.config.max_sectors {
                if result.visits.len() >= limit {
                    debug!(limit, pending = stack.len() + 1, "sector visit limit reached");
                    break;
                }
            }
            self.visit(item, &mut stack, &mut result, &mut reached_by)?;
        }

        result.visible_segments = reached_by
            .into_iter()
            .map(|(sector, stretches)| {
                let segments = stretches
                    .into_iter()
                    .flat_map(|(destination, intervals)| {
                        merge_intervals(intervals)
                            .into_iter()
                            .map(move |(t0, t1)| destination.slice(t0, t1))
                    })
                    .collect();
                (sector, segments)
            })
            .collect();

        debug!(
            visits = result.visits.len(),
            reached = result.visible_segments.len(),
            skipped = result.skipped_intersections,
            "propagation finished"
        );
        Ok(result)
    }

    fn visit(
        &self,
        item: WorkItem<G::Node>,
        stack: &mut Vec<WorkItem<G::Node>>,
        result: &mut PropagationResult<G::Node>,
        reached_by: &mut AHashMap<G::Node, ReachedStretches>,
    ) -> Result<()> {
        let WorkItem {
            sector,
            origin,
            inbound,
            visited,
        } = item;

        let mut polygon = if inbound.is_empty() {
            VisibilityPolygon::new(origin)
        } else {
            let mut polygon = VisibilityPolygon::with_owner(origin, RangeOwner::InfinitelyFar);
            for segment in &inbound {
                polygon.clear_before(*segment);
            }
            polygon
        };

        let barriers = self.graph.barriers(sector)?;
        let mut inserted = 0usize;
        for barrier in barriers {
            if faces(&barrier, origin) {
                polygon.insert(barrier);
                inserted += 1;
            }
        }
        trace!(?sector, inserted, intervals = polygon.get().len(), "built visibility polygon");

        // Angles a neighbor may pass on; `None` means unrestricted.
        let windows: Option<Vec<(f64, f64)>> = (!inbound.is_empty()).then(|| {
            inbound
                .iter()
                .filter_map(|s| polygon.span_of(s))
                .flat_map(|span| span.pieces())
                .collect()
        });

        for group in self.graph.outbound_edge_groups(sector)? {
            let neighbor = group.neighbor;
            if neighbor == sector || visited.contains(&neighbor) {
                continue;
            }

            let mut reached = Vec::new();
            for edge in &group.edges {
                let stretches = self.visible_stretches(&polygon, edge, windows.as_deref(), result);
                if stretches.is_empty() {
                    continue;
                }
                let destination = edge.destination_segment;
                reached.extend(stretches.iter().map(|&(t0, t1)| destination.slice(t0, t1)));

                let known = reached_by.entry(neighbor).or_default();
                match known.iter_mut().find(|(segment, _)| *segment == destination) {
                    Some((_, intervals)) => intervals.extend(stretches),
                    None => known.push((destination, stretches)),
                }
            }
            if reached.is_empty() {
                continue;
            }

            let to_world = self.graph.world_transform(sector)?;
            let to_neighbor = self.graph.world_transform_inv(neighbor)?;
            let next_origin = to_neighbor.apply_point(to_world.apply_point(origin));

            let mut next_visited = visited.clone();
            next_visited.insert(sector);
            debug!(from = ?sector, to = ?neighbor, stretches = reached.len(), "view enters neighbor");
            stack.push(WorkItem {
                sector: neighbor,
                origin: next_origin,
                inbound: reached,
                visited: next_visited,
            });
        }

        result.visits.push(SectorVisibility {
            sector,
            origin,
            polygon,
            inbound,
        });
        Ok(())
    }

    /// Parameter intervals of `edge.source_segment` the polygon's origin can
    /// see, merged and sorted.
    fn visible_stretches(
        &self,
        polygon: &VisibilityPolygon,
        edge: &PortalEdge,
        windows: Option<&[(f64, f64)]>,
        result: &mut PropagationResult<G::Node>,
    ) -> Vec<(f64, f64)> {
        let crossover = edge.source_segment;
        let Some(span) = polygon.span_of(&crossover) else {
            return Vec::new();
        };
        let origin = polygon.origin();
        let portal = RangeOwner::Segment(crossover);

        let mut stretches = Vec::new();
        for ((plo, phi), (first, last)) in span.pieces().into_iter().zip(polygon.range_stab(&crossover)) {
            for range in &polygon.get()[first..=last] {
                let lo = range.theta_start.max(plo);
                let hi = range.theta_end.min(phi);
                if hi <= lo {
                    continue;
                }
                for (lo, hi) in clip_to_windows(lo, hi, windows) {
                    let mid = 0.5 * (lo + hi);
                    if polygon.compare_owners(&range.owner, &portal, mid) == Ordering::Less {
                        continue;
                    }

                    let t_at = |theta: f64| {
                        let direction = Vec2::from_radius_angle(1.0, theta);
                        line_line_intersection_t(
                            crossover.start,
                            crossover.end,
                            origin,
                            origin + direction,
                        )
                    };
                    let (Some(t0), Some(t1)) = (t_at(lo), t_at(hi)) else {
                        warn!(?crossover, lo, hi, "ray parallel to crossover, skipping sub-range");
                        result.skipped_intersections += 1;
                        continue;
                    };

                    let (t0, t1) = (t0.clamp(0.0, 1.0), t1.clamp(0.0, 1.0));
                    let (t0, t1) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
                    if t1 - t0 > self.config.min_visible_fraction {
                        stretches.push((t0, t1));
                    }
                }
            }
        }
        merge_intervals(stretches)
    }
}

/// Intersection of `(lo, hi)` with the window pieces.
fn clip_to_windows(lo: f64, hi: f64, windows: Option<&[(f64, f64)]>) -> Vec<(f64, f64)> {
    match windows {
        None => vec![(lo, hi)],
        Some(windows) => windows
            .iter()
            .map(|&(wlo, whi)| (lo.max(wlo), hi.min(whi)))
            .filter(|(a, b)| b > a)
            .collect(),
    }
}

fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (lo, hi) in intervals {
        match merged.last_mut() {
            Some(last) if lo <= last.1 + MERGE_EPS => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerrainError;
    use crate::primitives::Affine2;
    use crate::visibility::{EdgeGroup, SectorGraph};
    use approx::assert_relative_eq;

    /// Hand-built graph: unit-free rooms in one shared frame.
    struct Rooms {
        barriers: Vec<Vec<Segment2<f64>>>,
        links: Vec<(usize, usize, Segment2<f64>)>,
    }

    impl SectorGraph for Rooms {
        type Node = usize;

        fn barriers(&self, node: usize) -> Result<Vec<Segment2<f64>>> {
            self.barriers
                .get(node)
                .cloned()
                .ok_or(TerrainError::UnknownSector(crate::terrain::SectorId(node as u32)))
        }

        fn outbound_edge_groups(&self, node: usize) -> Result<Vec<EdgeGroup<usize>>> {
            Ok(self
                .links
                .iter()
                .filter(|(from, _, _)| *from == node)
                .map(|&(_, to, segment)| EdgeGroup {
                    neighbor: to,
                    edges: vec![PortalEdge {
                        source_segment: segment,
                        destination_segment: segment,
                    }],
                })
                .collect())
        }

        fn world_transform(&self, _: usize) -> Result<Affine2<f64>> {
            Ok(Affine2::identity())
        }

        fn world_transform_inv(&self, _: usize) -> Result<Affine2<f64>> {
            Ok(Affine2::identity())
        }
    }

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment2<f64> {
        Segment2::from_coords(x1, y1, x2, y2)
    }

    /// Counter-clockwise walls far around the viewer, so every direction of
    /// the origin room is bounded.
    fn backdrop() -> Vec<Segment2<f64>> {
        let corners = [(-50.0, -45.0), (50.0, -45.0), (50.0, 55.0), (-50.0, 55.0)];
        (0..4)
            .map(|i| {
                let (a, b) = (corners[i], corners[(i + 1) % 4]);
                seg(a.0, a.1, b.0, b.1)
            })
            .collect()
    }

    /// Two rooms joined by a doorway at x = 10, a pillar partly in front of it.
    fn two_rooms() -> Rooms {
        let door = seg(10.0, 0.0, 10.0, 10.0);
        let mut origin_room = backdrop();
        // Pillar's west face, seen from a viewer to its west.
        origin_room.push(seg(5.0, 0.0, 5.0, 4.0));
        Rooms {
            barriers: vec![origin_room, Vec::new()],
            links: vec![(0, 1, door), (1, 0, door)],
        }
    }

    #[test]
    fn test_unbounded_origin_room_sees_nothing() {
        let door = seg(10.0, 0.0, 10.0, 10.0);
        let rooms = Rooms {
            barriers: vec![Vec::new(), Vec::new()],
            links: vec![(0, 1, door)],
        };
        let result = VisibilityPropagator::new(&rooms)
            .propagate(0, Point2::new(0.0, 5.0))
            .unwrap();
        assert!(!result.reached(1));
    }

    #[test]
    fn test_pillar_occludes_part_of_door() {
        let rooms = two_rooms();
        let result = VisibilityPropagator::new(&rooms)
            .propagate(0, Point2::new(0.0, 5.0))
            .unwrap();

        let visible = result.visible_in(1);
        assert_eq!(visible.len(), 1);
        // The pillar top (5, 4) shadows the door below y = 3.
        assert_relative_eq!(visible[0].start.y, 3.0, epsilon = 1e-9);
        assert_relative_eq!(visible[0].end.y, 10.0, epsilon = 1e-9);
        assert!(!result.reached(0));
        assert_eq!(result.skipped_intersections, 0);
    }

    #[test]
    fn test_visits_each_sector_once_per_path() {
        let rooms = two_rooms();
        let result = VisibilityPropagator::new(&rooms)
            .propagate(0, Point2::new(0.0, 5.0))
            .unwrap();
        let sectors: Vec<usize> = result.visits.iter().map(|v| v.sector).collect();
        assert_eq!(sectors, vec![0, 1]);
        assert_eq!(result.visits[1].inbound.len(), 1);
        assert!(result.visits.iter().all(|v| v.polygon.is_partition()));
    }

    #[test]
    fn test_max_sectors_caps_traversal() {
        let rooms = two_rooms();
        let config = PropagationConfig {
            max_sectors: Some(1),
            ..PropagationConfig::default()
        };
        let result = VisibilityPropagator::with_config(&rooms, config)
            .propagate(0, Point2::new(0.0, 5.0))
            .unwrap();
        assert_eq!(result.visits.len(), 1);
    }

    #[test]
    fn test_windows_limit_onward_view() {
        // Room 1 has a second doorway at x = 20 that only the lower half of
        // the first doorway's window can see through.
        let first = seg(10.0, 0.0, 10.0, 10.0);
        let second = seg(20.0, -20.0, 20.0, -10.0);
        let rooms = Rooms {
            barriers: vec![backdrop(), Vec::new(), Vec::new()],
            links: vec![(0, 1, first), (1, 2, second)],
        };
        let result = VisibilityPropagator::new(&rooms)
            .propagate(0, Point2::new(0.0, 5.0))
            .unwrap();
        // Rays from (0, 5) through the first doorway reach x = 20 no lower
        // than y = -5, so the second doorway stays hidden.
        assert!(result.reached(1));
        assert!(!result.reached(2));
    }

    #[test]
    fn test_sector_reached_twice_lists_stretch_once() {
        // Rooms 1 and 2 both open onto room 3 through the same doorway, so
        // room 3 is entered along two paths with the same view.
        let first = seg(10.0, 0.0, 10.0, 10.0);
        let second = seg(20.0, 0.0, 20.0, 10.0);
        let rooms = Rooms {
            barriers: vec![backdrop(), Vec::new(), Vec::new(), Vec::new()],
            links: vec![(0, 1, first), (0, 2, first), (1, 3, second), (2, 3, second)],
        };
        let result = VisibilityPropagator::new(&rooms)
            .propagate(0, Point2::new(0.0, 5.0))
            .unwrap();

        let entries = result.visits.iter().filter(|v| v.sector == 3).count();
        assert_eq!(entries, 2);

        let visible = result.visible_in(3);
        assert_eq!(visible.len(), 1, "{visible:?}");
        assert_relative_eq!(visible[0].start.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(visible[0].end.y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_intervals() {
        let merged = merge_intervals(vec![(0.5, 0.7), (0.0, 0.2), (0.2, 0.4), (0.65, 0.9)]);
        assert_eq!(merged, vec![(0.0, 0.4), (0.5, 0.9)]);
    }

    #[test]
    fn test_clip_to_windows() {
        assert_eq!(clip_to_windows(1.0, 2.0, None), vec![(1.0, 2.0)]);
        let windows = [(0.0, 1.2), (1.5, 1.7), (3.0, 4.0)];
        assert_eq!(
            clip_to_windows(1.0, 2.0, Some(&windows)),
            vec![(1.0, 1.2), (1.5, 1.7)]
        );
    }
}
