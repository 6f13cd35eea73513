//! Cross-lane curve routing.
//!
//! An action curve runs from the east side of its left endpoint to the west
//! side of its right endpoint. For every lane it crosses, the straight line
//! between both endpoints is intersected with the lane axis; when that point
//! falls too close to one of the lane's nodes, the curve is steered through
//! the gap between the two nodes straddling it instead.

use std::collections::HashMap;

use crate::geometry::{Anchor, Point, UNIT};
use crate::scene::{ArrowEnd, PathData};
use crate::tree::{RenderPass, TreeView};
use crate::types::Revision;

/// Minimum distance, in node radii, between a curve and a node it passes.
const CLEARANCE: f64 = 1.5;

/// Vertical positions taken by waypoints, per horizontal slot.
#[derive(Debug, Default)]
pub struct Occupancy {
    slots: HashMap<u64, Vec<f64>>,
}

impl Occupancy {
    /// Claim `point`, moving it vertically by alternating, growing steps of a
    /// third of a unit until its height is free on its horizontal slot.
    ///
    /// Only heights in `lo..=hi` are claimed; `None` once the steps in both
    /// directions have left that range.
    pub fn fixup(&mut self, point: Point, lo: f64, hi: f64) -> Option<Point> {
        let used = self.slots.entry(point.x.to_bits()).or_default();
        let fits = |y: f64| lo <= y && y <= hi;
        let third = UNIT / 3.0;
        let mut step: i32 = 0;
        loop {
            let y = point.y + f64::from(step) * third;
            if fits(y) && !used.contains(&y) {
                if step != 0 {
                    tracing::trace!(x = point.x, from = point.y, to = y, "waypoint nudged");
                }
                used.push(y);
                return Some(Point::new(point.x, y));
            }
            let reach = f64::from(step.abs()) * third;
            if step <= 0 && point.y + reach > hi && point.y - reach < lo {
                return None;
            }
            step = if step > 0 { -step } else { -step + 1 };
        }
    }

    /// Whether `point` has been claimed.
    pub fn contains(&self, point: Point) -> bool {
        self.slots
            .get(&point.x.to_bits())
            .is_some_and(|used| used.contains(&point.y))
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// A routed action curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Revision the action starts from, as requested.
    pub source: Revision,
    /// Revision the action ends at, as requested.
    pub dest: Revision,
    /// Whether the endpoints were swapped to run left to right; the arrow
    /// then sits at the start of the path.
    pub head: bool,
    /// East anchor of the left node.
    pub start: Point,
    /// West anchor of the right node.
    pub end: Point,
    /// Intermediate control points, left to right.
    pub waypoints: Vec<Point>,
    /// SVG path data.
    pub path: String,
}

impl Route {
    pub fn arrow_end(&self) -> ArrowEnd {
        if self.head { ArrowEnd::Head } else { ArrowEnd::Tail }
    }
}

/// Route `source -> dest`, or `None` when either revision is not displayed
/// or both sit on the same lane.
pub(crate) fn route(
    view: &TreeView<'_>,
    occupancy: &mut Occupancy,
    source: Revision,
    dest: Revision,
) -> Option<Route> {
    let (Some(mut left), Some(mut right)) = (view.changeset(source), view.changeset(dest)) else {
        tracing::debug!(source, dest, "skipping action: revision not displayed");
        return None;
    };
    if left.branch() == right.branch() {
        tracing::debug!(source, dest, "skipping action: same lane");
        return None;
    }

    let head = left.center().x > right.center().x;
    if head {
        std::mem::swap(&mut left, &mut right);
    }

    let (cl, cr) = (left.center(), right.center());
    let slope = (cr.y - cl.y) / (cr.x - cl.x);
    let intercept = cl.y - slope * cl.x;

    let mut waypoints = Vec::new();
    for lane in view.xbranches(left, right) {
        let x = lane.vaxis();
        let y = slope * x + intercept;
        let Some(straddle) = lane.straddle(y, view.scale) else {
            tracing::debug!(lane = lane.name(), y, "no straddling pair");
            continue;
        };
        let candidate = straddle.midpoint();
        if !too_close(candidate, slope, intercept, straddle.radius) {
            continue;
        }
        let (lo, hi) = straddle.clear_span(CLEARANCE * straddle.radius);
        let Some(waypoint) = occupancy.fixup(candidate, lo, hi) else {
            tracing::debug!(lane = lane.name(), "no room for waypoint");
            continue;
        };
        tracing::trace!(lane = lane.name(), x = waypoint.x, y = waypoint.y, "waypoint");
        waypoints.push(waypoint);
    }

    let start = left.position(Anchor::E);
    let end = right.position(Anchor::W);
    let path = curve(start, end, &waypoints, head);

    Some(Route {
        source,
        dest,
        head,
        start,
        end,
        waypoints,
        path,
    })
}

/// Whether the reference line `y = slope * x + intercept` passes within
/// [`CLEARANCE`] radii of `point`, measured along the perpendicular through it.
fn too_close(point: Point, slope: f64, intercept: f64, radius: f64) -> bool {
    if slope == 0.0 {
        return true;
    }
    let normal = -1.0 / slope;
    let normal_intercept = point.y - normal * point.x;
    let xl = (normal_intercept - intercept) / (slope - normal);
    let yl = normal * xl + normal_intercept;
    point.distance(Point::new(xl, yl)) < CLEARANCE * radius
}

/// Path data through `waypoints`. A straight stub of one unit sits at the
/// arrow end; between consecutive points two quadratic segments meet at
/// their midpoint.
fn curve(start: Point, end: Point, waypoints: &[Point], head: bool) -> String {
    let first = if head { start.offset(UNIT, 0.0) } else { start };
    let last = if head { end } else { end.offset(-UNIT, 0.0) };

    let mut d = PathData::default();
    d.move_to(start.x, start.y);
    if head {
        d.line_to(first.x, first.y);
    }

    let points: Vec<Point> = std::iter::once(first)
        .chain(waypoints.iter().copied())
        .chain(std::iter::once(last))
        .collect();
    for pair in points.windows(2) {
        let (l, r) = (pair[0], pair[1]);
        let mid = l.midpoint(r);
        d.quad_to(l.x + 2.0 * UNIT, l.y, mid.x, mid.y);
        d.quad_to(r.x - 2.0 * UNIT, r.y, r.x, r.y);
    }

    if !head {
        d.line_to(end.x, end.y);
    }
    d.finish()
}

impl RenderPass<'_> {
    /// Draw the action curve `source -> dest` in `color`: a wide transparent
    /// hit target first, then the visible stroke with its arrow.
    pub(crate) fn action(&mut self, source: Revision, dest: Revision, color: &str) {
        let Some(route) = route(&self.view, &mut *self.occupancy, source, dest) else {
            return;
        };
        let marker = self.markers.get(route.arrow_end(), color);
        let changesets = format!("{},{}", source, dest);

        for visible in [false, true] {
            let out = &mut *self.out;
            out.start_element("g");
            out.attribute("group", "arrow");
            out.attribute("changesets", &changesets);

            out.start_element("path");
            out.attribute("fill", "none");
            out.attribute("stroke", color);
            if visible {
                out.number("stroke-width", 4.0);
                let key = if route.head { "marker-start" } else { "marker-end" };
                out.attribute(key, &marker);
            } else {
                out.number("stroke-width", 20.0);
                out.number("stroke-opacity", 0.0);
            }
            out.attribute("d", &route.path);
            out.end_element();

            out.end_element();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LayoutContext;
    use crate::scene::{SceneEvent, elements};
    use crate::tree::Tree;
    use crate::types::{BranchDescriptor, RevisionDescriptor, RevisionGraph, Style};

    fn lane(name: &str, revs: &[RevisionDescriptor]) -> BranchDescriptor {
        revs.iter()
            .cloned()
            .fold(BranchDescriptor::new(name, format!("branches/{}", name)), |b, r| {
                b.with_revision(r)
            })
    }

    fn built(graph: &RevisionGraph) -> Tree {
        let mut tree = Tree::new(graph, LayoutContext::default()).unwrap();
        tree.build(1.0);
        tree
    }

    /// Three lanes; the line from rev 2 (left) to rev 12 (right) crosses
    /// the middle lane close to the center of the gap between 9 and 5.
    fn crossing() -> RevisionGraph {
        RevisionGraph::new(12)
            .with_branch(lane(
                "trunk",
                &[RevisionDescriptor::new(3), RevisionDescriptor::new(2)],
            ))
            .with_branch(lane(
                "middle",
                &[RevisionDescriptor::new(9), RevisionDescriptor::new(5)],
            ))
            .with_branch(lane(
                "feature",
                &[RevisionDescriptor::new(12).with_source(2).first()],
            ))
    }

    // ── Occupancy ──────────────────────────────────────────────────────

    const OPEN: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);

    #[test]
    fn test_fixup_free_point_unchanged() {
        let mut occ = Occupancy::default();
        let p = Point::new(10.0, 20.0);
        assert_eq!(occ.fixup(p, OPEN.0, OPEN.1), Some(p));
        assert!(occ.contains(p));
        assert_eq!(occ.len(), 1);
    }

    #[test]
    fn test_fixup_alternates_growing() {
        let mut occ = Occupancy::default();
        let p = Point::new(10.0, 100.0);
        let ys: Vec<f64> = (0..5)
            .map(|_| occ.fixup(p, OPEN.0, OPEN.1).unwrap().y)
            .collect();
        let third = UNIT / 3.0;
        assert_eq!(
            ys,
            vec![
                100.0,
                100.0 + third,
                100.0 - third,
                100.0 + 2.0 * third,
                100.0 - 2.0 * third
            ]
        );
    }

    #[test]
    fn test_fixup_keyed_by_x() {
        let mut occ = Occupancy::default();
        occ.fixup(Point::new(10.0, 100.0), OPEN.0, OPEN.1);
        assert_eq!(
            occ.fixup(Point::new(11.0, 100.0), OPEN.0, OPEN.1),
            Some(Point::new(11.0, 100.0))
        );
        occ.clear();
        assert!(occ.is_empty());
    }

    #[test]
    fn test_fixup_stays_in_range() {
        let mut occ = Occupancy::default();
        let p = Point::new(10.0, 100.0);
        let third = UNIT / 3.0;
        // room for the center and one step either way
        let (lo, hi) = (100.0 - 1.5 * third, 100.0 + 1.5 * third);
        let ys: Vec<f64> = (0..3).map(|_| occ.fixup(p, lo, hi).unwrap().y).collect();
        assert_eq!(ys, vec![100.0, 100.0 + third, 100.0 - third]);
        assert_eq!(occ.fixup(p, lo, hi), None);
        assert_eq!(occ.len(), 3);
    }

    #[test]
    fn test_fixup_empty_range() {
        let mut occ = Occupancy::default();
        assert_eq!(occ.fixup(Point::new(0.0, 50.0), 60.0, 40.0), None);
        assert!(occ.is_empty());
    }

    #[test]
    fn test_fixup_open_above() {
        let mut occ = Occupancy::default();
        let p = Point::new(0.0, 100.0);
        let third = UNIT / 3.0;
        occ.fixup(p, f64::NEG_INFINITY, 100.0);
        let ys: Vec<f64> = (0..3)
            .map(|_| occ.fixup(p, f64::NEG_INFINITY, 100.0).unwrap().y)
            .collect();
        assert_eq!(ys, vec![100.0 - third, 100.0 - 2.0 * third, 100.0 - 3.0 * third]);
    }

    // ── Geometry helpers ───────────────────────────────────────────────

    #[test]
    fn test_too_close_horizontal_line() {
        assert!(too_close(Point::new(0.0, 1000.0), 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_too_close_distance() {
        // line y = x; point (0, 2) lies sqrt(2) away
        assert!(too_close(Point::new(0.0, 2.0), 1.0, 0.0, 1.0));
        assert!(!too_close(Point::new(0.0, 2.0), 1.0, 0.0, 0.9));
    }

    #[test]
    fn test_curve_without_waypoints() {
        let d = curve(Point::new(0.0, 0.0), Point::new(200.0, 0.0), &[], false);
        assert_eq!(
            d,
            "M 0 0 Q 50,0 87.5,0 Q 125,0 175,0 L 200 0"
        );
        let d = curve(Point::new(0.0, 0.0), Point::new(200.0, 0.0), &[], true);
        assert_eq!(
            d,
            "M 0 0 L 25 0 Q 75,0 112.5,0 Q 150,0 200,0"
        );
    }

    // ── Routing ────────────────────────────────────────────────────────

    #[test]
    fn test_unresolved_and_same_lane_skipped() {
        let mut tree = built(&crossing());
        assert!(tree.route(2, 99).is_none());
        assert!(tree.route(99, 2).is_none());
        assert!(tree.route(3, 2).is_none());
    }

    #[test]
    fn test_route_before_build() {
        let mut tree = Tree::new(&crossing(), LayoutContext::default()).unwrap();
        assert!(tree.route(2, 12).is_none());
        assert!(tree.routes().is_empty());
    }

    #[test]
    fn test_end_to_end_two_lanes() {
        let graph = RevisionGraph::new(10)
            .with_branch(lane(
                "trunk",
                &[
                    RevisionDescriptor::new(3),
                    RevisionDescriptor::new(2),
                    RevisionDescriptor::new(1),
                ],
            ))
            .with_branch(lane(
                "feature",
                &[RevisionDescriptor::new(10).with_source(2)],
            ));
        let mut tree = built(&graph);
        assert_eq!(tree.changeset_count(), 4);

        let routes = tree.routes();
        assert_eq!(routes.len(), 1);
        let r = &routes[0];
        assert_eq!((r.source, r.dest), (2, 10));
        assert!(!r.head);
        assert!(r.waypoints.is_empty());
        assert_eq!(r.start, tree.changeset(2).unwrap().position(Anchor::E));
        assert_eq!(r.end, tree.changeset(10).unwrap().position(Anchor::W));
        assert!(r.path.ends_with(&format!("L {} {}", r.end.x, r.end.y)));

        let mut events: Vec<SceneEvent> = Vec::new();
        tree.render(&mut events).unwrap();
        let arrows: Vec<_> = elements(&events, "g")
            .into_iter()
            .filter(|g| g.get("group").is_some_and(|v| v == "arrow"))
            .collect();
        // hit target and visible stroke
        assert_eq!(arrows.len(), 2);
        assert!(arrows.iter().all(|g| g["changesets"] == "2,10"));
    }

    #[test]
    fn test_hit_target_underneath() {
        let mut tree = built(&crossing());
        let mut events: Vec<SceneEvent> = Vec::new();
        tree.render(&mut events).unwrap();
        let paths: Vec<_> = elements(&events, "path")
            .into_iter()
            .filter(|p| p.get("stroke").is_some_and(|s| s == "#5faf5f"))
            .collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0]["stroke-width"], "20");
        assert_eq!(paths[0]["stroke-opacity"], "0");
        assert_eq!(paths[1]["stroke-width"], "4");
        assert_eq!(paths[1]["marker-end"], "url(#arrow_tail__5faf5f)");
        assert_eq!(paths[0]["d"], paths[1]["d"]);
    }

    #[test]
    fn test_waypoint_inserted_for_crossed_lane() {
        let mut tree = built(&crossing());
        let route = tree.route(2, 12).unwrap();
        assert_eq!(route.waypoints.len(), 1);

        let middle = &tree.branches()[1];
        let wp = route.waypoints[0];
        assert_eq!(wp.x, middle.vaxis());
        let y9 = tree.changeset(9).unwrap().center().y;
        let y5 = tree.changeset(5).unwrap().center().y;
        assert!(y9 < wp.y && wp.y < y5);
    }

    #[test]
    fn test_waypoint_clearance() {
        let mut tree = built(&crossing());
        let route = tree.route(2, 12).unwrap();
        for wp in &route.waypoints {
            for cs in tree.branches()[1].changesets() {
                assert!(wp.distance(cs.center()) >= 1.5 * cs.radius());
            }
        }
    }

    #[test]
    fn test_waypoint_clearance_when_gap_is_shared() {
        // four curves leave rev 100 and cross the middle lane through the
        // gap between 50 and 40
        let graph = RevisionGraph::new(100)
            .with_branch(lane("trunk", &[RevisionDescriptor::new(100)]))
            .with_branch(lane(
                "middle",
                &[RevisionDescriptor::new(50), RevisionDescriptor::new(40)],
            ))
            .with_branch(lane(
                "feature",
                &[RevisionDescriptor::new(30)
                    .with_source(100)
                    .with_brings(100, 100)
                    .with_delivers(100, 100)],
            ))
            .with_branch(lane("other", &[RevisionDescriptor::new(20).with_source(100)]));
        let ctx = LayoutContext::default().with_style(Style::Compact);
        let mut tree = Tree::new(&graph, ctx).unwrap();
        tree.build(1.0);

        let routes = tree.routes();
        assert_eq!(routes.len(), 4);
        let waypoints: Vec<Point> = routes.iter().flat_map(|r| r.waypoints.clone()).collect();
        assert!(!waypoints.is_empty());

        for wp in &waypoints {
            let lane = tree
                .branches()
                .iter()
                .find(|b| b.vaxis() == wp.x)
                .unwrap();
            for cs in lane.changesets() {
                let d = wp.distance(cs.center());
                assert!(
                    d >= 1.5 * cs.radius(),
                    "waypoint {:?} at {:.3} radii from rev {}",
                    wp,
                    d / cs.radius(),
                    cs.revision()
                );
            }
        }

        let mut keys: Vec<(u64, u64)> = waypoints
            .iter()
            .map(|p| (p.x.to_bits(), p.y.to_bits()))
            .collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_no_waypoint_when_line_clears_lane() {
        // the gap between 10 and 1 is centered well below the line
        let graph = RevisionGraph::new(12)
            .with_branch(lane("trunk", &[RevisionDescriptor::new(2)]))
            .with_branch(lane(
                "middle",
                &[RevisionDescriptor::new(10), RevisionDescriptor::new(1)],
            ))
            .with_branch(lane("feature", &[RevisionDescriptor::new(12)]));
        let mut tree = built(&graph);
        let route = tree.route(2, 12).unwrap();
        assert!(route.waypoints.is_empty());
    }

    #[test]
    fn test_no_waypoint_below_lane() {
        let graph = RevisionGraph::new(12)
            .with_branch(lane("trunk", &[RevisionDescriptor::new(2)]))
            .with_branch(lane("middle", &[RevisionDescriptor::new(9)]))
            .with_branch(lane("feature", &[RevisionDescriptor::new(1)]));
        let mut tree = built(&graph);
        let route = tree.route(2, 1).unwrap();
        assert!(route.waypoints.is_empty());
    }

    #[test]
    fn test_direction_normalization() {
        let graph = crossing();
        let forward = built(&graph).route(2, 12).unwrap();
        let backward = built(&graph).route(12, 2).unwrap();
        assert!(!forward.head);
        assert!(backward.head);
        assert_eq!(forward.waypoints, backward.waypoints);
        assert_eq!(forward.start, backward.start);
        assert_eq!(forward.end, backward.end);
        assert_eq!(backward.arrow_end(), ArrowEnd::Head);
    }

    #[test]
    fn test_dedup_across_edges() {
        let mut tree = built(&crossing());
        let a = tree.route(2, 12).unwrap();
        let b = tree.route(2, 12).unwrap();
        assert_eq!(a.waypoints.len(), 1);
        assert_eq!(b.waypoints.len(), 1);
        assert_eq!(a.waypoints[0].x, b.waypoints[0].x);
        assert_ne!(a.waypoints[0].y, b.waypoints[0].y);
    }

    #[test]
    fn test_routes_unique_waypoints() {
        let graph = RevisionGraph::new(12)
            .with_branch(lane(
                "trunk",
                &[RevisionDescriptor::new(3), RevisionDescriptor::new(2)],
            ))
            .with_branch(lane(
                "middle",
                &[RevisionDescriptor::new(9), RevisionDescriptor::new(5)],
            ))
            .with_branch(lane(
                "feature",
                &[
                    RevisionDescriptor::new(12).with_source(2),
                    RevisionDescriptor::new(11).with_brings(3, 2),
                ],
            ));
        let mut tree = built(&graph);
        let routes = tree.routes();
        let mut all: Vec<(u64, u64)> = routes
            .iter()
            .flat_map(|r| r.waypoints.iter().map(|p| (p.x.to_bits(), p.y.to_bits())))
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
        assert!(total >= 2);
    }

    #[test]
    fn test_routes_deterministic_across_builds() {
        let mut tree = built(&crossing());
        let first = tree.routes();
        tree.build(1.0);
        assert_eq!(tree.routes(), first);
    }
}
