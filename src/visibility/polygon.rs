//! Angular occlusion structure around a single origin.
//!
//! The full circle `[0, 2π)` is partitioned into half-open intervals, each
//! owned by the nearest known occluder in that direction or by one of two
//! sentinels. Segments are inserted one at a time; each insert only touches
//! the intervals its angular span overlaps.

use crate::primitives::{Point2, Ray2, Segment2};
use crate::tolerance::{orient2d, proper_crossing, Orientation};
use std::cmp::Ordering;
use std::f64::consts::TAU;
use tracing::trace;

/// Relative tolerance under which two ray distances count as equal.
const DISTANCE_EPS: f64 = 1e-9;
/// Cuts closer than this to an existing boundary reuse the boundary.
const ANGLE_EPS: f64 = 1e-12;

/// What blocks the view over an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeOwner {
    /// Nothing known yet; treated as closer than any segment.
    InfinitesimallyNear,
    /// Nothing blocks; farther than any segment.
    InfinitelyFar,
    Segment(Segment2<f64>),
}

impl RangeOwner {
    fn rank(&self) -> u8 {
        match self {
            RangeOwner::InfinitesimallyNear => 0,
            RangeOwner::Segment(_) => 1,
            RangeOwner::InfinitelyFar => 2,
        }
    }

    pub fn segment(&self) -> Option<Segment2<f64>> {
        match *self {
            RangeOwner::Segment(segment) => Some(segment),
            _ => None,
        }
    }
}

/// One interval of the partition, `theta_start < theta_end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalRange {
    pub theta_start: f64,
    pub theta_end: f64,
    pub owner: RangeOwner,
}

impl IntervalRange {
    #[inline]
    pub fn new(theta_start: f64, theta_end: f64, owner: RangeOwner) -> Self {
        Self {
            theta_start,
            theta_end,
            owner,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.theta_end - self.theta_start
    }
}

/// Angles subtended by a segment, counter-clockwise from `start` to `end`.
///
/// Both angles are in `[0, 2π)`. When `end < start` the span crosses the
/// seam at angle zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularSpan {
    pub start: f64,
    pub end: f64,
}

impl AngularSpan {
    /// True when the span crosses angle zero.
    #[inline]
    pub fn wraps(&self) -> bool {
        self.end <= self.start
    }

    /// The span as ascending, non-wrapping `(lo, hi)` pieces.
    pub fn pieces(&self) -> Vec<(f64, f64)> {
        if self.wraps() {
            [(0.0, self.end), (self.start, TAU)]
                .into_iter()
                .filter(|(lo, hi)| hi > lo)
                .collect()
        } else {
            vec![(self.start, self.end)]
        }
    }

    /// Pieces of the overlap between two spans.
    pub fn intersect(&self, other: &AngularSpan) -> Vec<(f64, f64)> {
        let theirs = other.pieces();
        let mut out = Vec::new();
        for (lo, hi) in self.pieces() {
            for &(olo, ohi) in &theirs {
                let (a, b) = (lo.max(olo), hi.min(ohi));
                if b > a {
                    out.push((a, b));
                }
            }
        }
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }
}

/// Normalizes an angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(theta: f64) -> f64 {
    let t = theta.rem_euclid(TAU);
    if t >= TAU {
        0.0
    } else {
        t
    }
}

/// Angular span of `segment` seen from `origin`.
///
/// Returns `None` when the origin is collinear with the segment: the
/// segment is seen edge-on and hides nothing.
pub fn angular_span(origin: Point2<f64>, segment: &Segment2<f64>) -> Option<AngularSpan> {
    let a = segment.start - origin;
    let b = segment.end - origin;
    let cross = a.cross(b);
    if cross.abs() <= 1e-12 * a.magnitude() * b.magnitude() {
        return None;
    }
    let (first, second) = if cross > 0.0 { (a, b) } else { (b, a) };
    Some(AngularSpan {
        start: normalize_angle(first.angle()),
        end: normalize_angle(second.angle()),
    })
}

/// True when `origin` lies strictly on the left of `barrier`, the side a
/// land-on-the-left barrier blocks the view from.
#[inline]
pub fn faces(barrier: &Segment2<f64>, origin: Point2<f64>) -> bool {
    orient2d(barrier.start, barrier.end, origin, 0.0) == Orientation::CounterClockwise
}

/// Nearest-occluder map around an origin.
///
/// # Example
///
/// ```
/// use sectorsight::primitives::{Point2, Segment2};
/// use sectorsight::visibility::{RangeOwner, VisibilityPolygon};
///
/// let mut polygon = VisibilityPolygon::new(Point2::new(0.0, 0.0));
/// let wall = Segment2::from_coords(10.0, -5.0, 10.0, 5.0);
/// polygon.insert(wall);
///
/// assert_eq!(polygon.owner_at(0.0), RangeOwner::Segment(wall));
/// assert_eq!(polygon.owner_at(3.0), RangeOwner::InfinitesimallyNear);
/// assert!(polygon.is_partition());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityPolygon {
    origin: Point2<f64>,
    ranges: Vec<IntervalRange>,
}

impl VisibilityPolygon {
    /// Full circle owned by [`RangeOwner::InfinitesimallyNear`].
    pub fn new(origin: Point2<f64>) -> Self {
        Self::with_owner(origin, RangeOwner::InfinitesimallyNear)
    }

    /// Full circle owned by `owner`.
    pub fn with_owner(origin: Point2<f64>, owner: RangeOwner) -> Self {
        Self {
            origin,
            ranges: vec![IntervalRange::new(0.0, TAU, owner)],
        }
    }

    /// Seeds with `owner` and inserts every barrier in turn.
    pub fn from_barriers(
        origin: Point2<f64>,
        owner: RangeOwner,
        barriers: impl IntoIterator<Item = Segment2<f64>>,
    ) -> Self {
        let mut polygon = Self::with_owner(origin, owner);
        for barrier in barriers {
            polygon.insert(barrier);
        }
        polygon
    }

    #[inline]
    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    /// The ordered partition.
    #[inline]
    pub fn get(&self) -> &[IntervalRange] {
        &self.ranges
    }

    /// Index of the interval containing `theta`.
    pub fn index_at(&self, theta: f64) -> usize {
        let theta = normalize_angle(theta);
        self.ranges
            .partition_point(|r| r.theta_end <= theta)
            .min(self.ranges.len() - 1)
    }

    pub fn owner_at(&self, theta: f64) -> RangeOwner {
        self.ranges[self.index_at(theta)].owner
    }

    /// Checks that the intervals tile `[0, 2π)` without gaps or overlaps.
    pub fn is_partition(&self) -> bool {
        let (Some(first), Some(last)) = (self.ranges.first(), self.ranges.last()) else {
            return false;
        };
        first.theta_start == 0.0
            && last.theta_end == TAU
            && self.ranges.iter().all(|r| r.theta_start < r.theta_end)
            && self
                .ranges
                .windows(2)
                .all(|w| w[0].theta_end == w[1].theta_start)
    }

    /// Angular span of `segment` from this origin.
    #[inline]
    pub fn span_of(&self, segment: &Segment2<f64>) -> Option<AngularSpan> {
        angular_span(self.origin, segment)
    }

    /// Inserts an occluder, taking over every part of its span where it is
    /// nearer than the current owner. Sentinels always yield.
    pub fn insert(&mut self, segment: Segment2<f64>) {
        let Some(span) = self.span_of(&segment) else {
            return;
        };
        trace!(?segment, start = span.start, end = span.end, "insert occluder");
        let origin = self.origin;
        for (lo, hi) in span.pieces() {
            self.rewrite_span(lo, hi, |start, end, owner, out| {
                let existing = match owner {
                    RangeOwner::Segment(existing) if existing != segment => existing,
                    RangeOwner::Segment(_) => {
                        out.push(IntervalRange::new(start, end, owner));
                        return;
                    }
                    _ => {
                        out.push(IntervalRange::new(start, end, RangeOwner::Segment(segment)));
                        return;
                    }
                };

                let mut cuts = vec![start];
                if let Some(theta) = crossing_angle(origin, segment, existing) {
                    if theta > start + ANGLE_EPS && theta < end - ANGLE_EPS {
                        cuts.push(theta);
                    }
                }
                cuts.push(end);

                for w in cuts.windows(2) {
                    let mid = 0.5 * (w[0] + w[1]);
                    let winner = if compare_at(origin, &segment, &existing, mid) == Ordering::Less {
                        segment
                    } else {
                        existing
                    };
                    out.push(IntervalRange::new(w[0], w[1], RangeOwner::Segment(winner)));
                }
            });
        }
    }

    /// Marks everything in the segment's span as unobstructed.
    pub fn clear_before(&mut self, segment: Segment2<f64>) {
        let Some(span) = self.span_of(&segment) else {
            return;
        };
        for (lo, hi) in span.pieces() {
            self.rewrite_span(lo, hi, |start, end, _, out| {
                out.push(IntervalRange::new(start, end, RangeOwner::InfinitelyFar));
            });
        }
    }

    /// Inclusive index ranges of the intervals overlapping the segment's
    /// span, one per piece of [`AngularSpan::pieces`] and in the same order.
    /// A span across the seam yields two ranges.
    pub fn range_stab(&self, segment: &Segment2<f64>) -> Vec<(usize, usize)> {
        let Some(span) = self.span_of(segment) else {
            return Vec::new();
        };
        span.pieces()
            .into_iter()
            .filter_map(|(lo, hi)| {
                let (first, last) = self.affected(lo, hi);
                (first < last).then(|| (first, last - 1))
            })
            .collect()
    }

    /// Ordering of two segments by nearness from this origin.
    pub fn compare_segments(&self, a: &Segment2<f64>, b: &Segment2<f64>) -> Ordering {
        compare_segments(self.origin, a, b)
    }

    /// Ordering of two segments by distance along the ray at `theta`.
    pub fn compare_at(&self, a: &Segment2<f64>, b: &Segment2<f64>, theta: f64) -> Ordering {
        compare_at(self.origin, a, b, theta)
    }

    /// Ordering of owners along the ray at `theta`, sentinels included.
    pub fn compare_owners(&self, a: &RangeOwner, b: &RangeOwner, theta: f64) -> Ordering {
        match (a, b) {
            (RangeOwner::Segment(a), RangeOwner::Segment(b)) => self.compare_at(a, b, theta),
            _ => a.rank().cmp(&b.rank()),
        }
    }

    /// Half-open index range `first..last` of intervals overlapping `(lo, hi)`.
    fn affected(&self, lo: f64, hi: f64) -> (usize, usize) {
        let first = self.ranges.partition_point(|r| r.theta_end <= lo);
        let last = self.ranges.partition_point(|r| r.theta_start < hi);
        (first, last.max(first))
    }

    /// Replaces the part of every interval inside `[lo, hi)` with whatever
    /// `rewrite` emits for it. Parts outside keep their owner.
    fn rewrite_span<R>(&mut self, lo: f64, hi: f64, mut rewrite: R)
    where
        R: FnMut(f64, f64, RangeOwner, &mut Vec<IntervalRange>),
    {
        if hi <= lo {
            return;
        }
        let (first, last) = self.affected(lo, hi);
        let mut replacement = Vec::with_capacity(last - first + 2);
        for range in &self.ranges[first..last] {
            if range.theta_start < lo {
                replacement.push(IntervalRange::new(range.theta_start, lo, range.owner));
            }
            let start = range.theta_start.max(lo);
            let end = range.theta_end.min(hi);
            if end > start {
                rewrite(start, end, range.owner, &mut replacement);
            }
            if range.theta_end > hi {
                replacement.push(IntervalRange::new(hi, range.theta_end, range.owner));
            }
        }
        self.ranges.splice(first..last, replacement);
        self.coalesce();
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<IntervalRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            if range.theta_end <= range.theta_start {
                continue;
            }
            match merged.last_mut() {
                Some(prev) if prev.owner == range.owner && prev.theta_end == range.theta_start => {
                    prev.theta_end = range.theta_end;
                }
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }
}

/// Strict total order on segments by distance along the ray at `theta`.
///
/// Distances within a relative tolerance fall back to lexicographic order of
/// the coordinates; only identical segments compare `Equal`.
pub fn compare_at(origin: Point2<f64>, a: &Segment2<f64>, b: &Segment2<f64>, theta: f64) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let ray = Ray2::from_angle(origin, theta);
    let da = ray.distance_to_segment_line(a);
    let db = ray.distance_to_segment_line(b);
    order_distances(da, db).then_with(|| a.lexicographic_cmp(b))
}

/// [`compare_at`] at the middle of the two spans' overlap. Segments whose
/// spans do not overlap are ordered by midpoint distance.
pub fn compare_segments(origin: Point2<f64>, a: &Segment2<f64>, b: &Segment2<f64>) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let overlap = match (angular_span(origin, a), angular_span(origin, b)) {
        (Some(sa), Some(sb)) => sa.intersect(&sb).into_iter().next(),
        _ => None,
    };
    match overlap {
        Some((lo, hi)) => compare_at(origin, a, b, 0.5 * (lo + hi)),
        None => order_distances(
            origin.distance(a.midpoint()),
            origin.distance(b.midpoint()),
        )
        .then_with(|| a.lexicographic_cmp(b)),
    }
}

/// Angle from `origin` of the point where `a` and `b` cross.
///
/// The pair is ordered lexicographically first, so the angle is bit-identical
/// for either argument order.
fn crossing_angle(origin: Point2<f64>, a: Segment2<f64>, b: Segment2<f64>) -> Option<f64> {
    let (first, second) = if a.lexicographic_cmp(&b) == Ordering::Less {
        (a, b)
    } else {
        (b, a)
    };
    let p = proper_crossing(first, second, 0.0)?;
    Some(normalize_angle((p - origin).angle()))
}

fn order_distances(da: f64, db: f64) -> Ordering {
    if da.is_infinite() && db.is_infinite() {
        return Ordering::Equal;
    }
    if (da - db).abs() <= DISTANCE_EPS * da.max(db).max(1.0) {
        Ordering::Equal
    } else {
        da.total_cmp(&db)
    }
}
