//! Changeset nodes and their tag stacks.

use crate::color::Rgb;
use crate::context::LayoutContext;
use crate::geometry::{Anchor, Extent, Point, UNIT};
use crate::metrics::TextMetrics;
use crate::scene::{Layer, SceneWriter};
use crate::tree::RenderPass;
use crate::types::{ActionKind, Revision, RevisionDescriptor, RevisionRange};

/// Index of a lane in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub usize);

/// Colors and size shared by every node of a lane.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeStyle {
    pub fill: Rgb,
    pub stroke: Rgb,
    pub radius: f64,
    pub text_height: f64,
}

/// A labeled box stacked to the upper right of a changeset.
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
    extent: Extent,
    position: Point,
}

impl Tag {
    fn new(name: &str, metrics: &TextMetrics) -> Self {
        Self {
            name: name.to_string(),
            extent: Extent::new(
                metrics.text_width(name) + UNIT,
                metrics.text_height() + UNIT / 4.0,
            ),
            position: Point::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Top-left corner.
    pub fn position(&self) -> Point {
        self.position
    }

    fn render(&self, out: &mut dyn SceneWriter, style: &NodeStyle, url: &str) {
        let Point { x, y } = self.position;
        let Extent { width, height } = self.extent;

        out.start_element("a");
        out.attribute("xlink:href", url);

        out.start_element("rect");
        out.attribute("fill", &style.fill.to_string());
        out.attribute("stroke", &style.stroke.to_string());
        out.number("stroke-width", 3.0);
        out.number("rx", 12.0);
        out.number("ry", 12.0);
        out.number("x", x);
        out.number("y", y);
        out.number("width", width);
        out.number("height", height);
        out.end_element();

        out.start_element("text");
        out.attribute("class", "changeset_text");
        out.number("x", x + width / 2.0);
        out.number("y", y + height / 2.0 + style.text_height / 4.0);
        out.attribute("text-anchor", "middle");
        out.text(&self.name);
        out.end_element();

        out.end_element();
    }
}

/// One revision node within a lane.
///
/// Edges to other revisions are kept as revision ids and resolved through
/// the tree registry when drawn, never as direct references.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    descriptor: RevisionDescriptor,
    branch: BranchId,
    head: bool,
    style: NodeStyle,
    url: String,
    tags: Vec<Tag>,
    position: Point,
    extent: Extent,
    tags_extent: Extent,
}

impl ChangeSet {
    pub(crate) fn new(
        branch: BranchId,
        descriptor: RevisionDescriptor,
        head: bool,
        style: NodeStyle,
        ctx: &LayoutContext,
    ) -> Self {
        let tags = descriptor
            .tags
            .iter()
            .map(|t| Tag::new(t, &ctx.metrics))
            .collect();
        let diameter = style.radius * 2.0;
        Self {
            url: ctx.changeset_url(descriptor.rev),
            descriptor,
            branch,
            head,
            style,
            tags,
            position: Point::default(),
            extent: Extent::new(diameter, diameter),
            tags_extent: Extent::default(),
        }
    }

    /// An invisible revision-0 node placed at `position`, standing in for a
    /// lane header when looking for gaps between nodes.
    pub(crate) fn stand_in(branch: BranchId, style: NodeStyle, position: Point) -> Self {
        let diameter = style.radius * 2.0;
        Self {
            descriptor: RevisionDescriptor::new(0),
            branch,
            head: false,
            style,
            url: String::new(),
            tags: Vec::new(),
            position,
            extent: Extent::new(diameter, diameter),
            tags_extent: Extent::default(),
        }
    }

    pub fn revision(&self) -> Revision {
        self.descriptor.rev
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn descriptor(&self) -> &RevisionDescriptor {
        &self.descriptor
    }

    pub fn radius(&self) -> f64 {
        self.style.radius
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Newest node of a lane whose tip is displayed.
    pub fn is_head(&self) -> bool {
        self.head
    }

    pub fn is_first(&self) -> bool {
        self.descriptor.firstrev
    }

    pub fn is_terminal(&self) -> bool {
        self.descriptor.lastrev
    }

    pub fn center(&self) -> Point {
        self.position
    }

    /// Point on the node's boundary circle at `anchor`.
    pub fn position(&self, anchor: Anchor) -> Point {
        let (dx, dy) = anchor.direction();
        self.position
            .offset(dx * self.style.radius, dy * self.style.radius)
    }

    /// Total footprint: the node's diameter plus its tag stack, measured
    /// horizontally from the lane origin.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn tags_extent(&self) -> Extent {
        self.tags_extent
    }

    /// Place the node at `slot` and stack its tags; returns the new extent.
    pub(crate) fn build(&mut self, slot: Point, lane_origin: Point) -> Extent {
        let radius = self.style.radius;
        self.position = slot;

        let mut cursor = slot.offset(radius + UNIT / 3.0, -radius);
        let mut tags_extent = Extent::default();
        for tag in &mut self.tags {
            tag.position = cursor;
            cursor.y += tag.extent.height + UNIT / 3.0;
            tags_extent.width = tags_extent.width.max(tag.extent.width);
            tags_extent.height += tag.extent.height;
        }
        self.tags_extent = tags_extent;

        let x = slot.x - lane_origin.x + radius;
        self.extent = Extent::new(
            (radius * 2.0).max(x + tags_extent.width),
            (radius * 2.0).max(tags_extent.height),
        );
        self.extent
    }

    pub(crate) fn render_layer(&self, layer: Layer, pass: &mut RenderPass<'_>) {
        match layer {
            Layer::Backgrounds => self.render_backgrounds(pass),
            Layer::Edges => self.render_actions(pass),
            Layer::Nodes => self.render_node(pass.out),
        }
    }

    fn render_backgrounds(&self, pass: &mut RenderPass<'_>) {
        if let Some(range) = self.descriptor.brings {
            range_background(pass, range, ActionKind::Bring);
        }
        if let Some(range) = self.descriptor.delivers {
            range_background(pass, range, ActionKind::Deliver);
        }
    }

    fn render_actions(&self, pass: &mut RenderPass<'_>) {
        for (kind, origin) in self.descriptor.actions() {
            pass.action(origin, self.revision(), kind.color());
        }
    }

    fn render_node(&self, out: &mut dyn SceneWriter) {
        let Point { x, y } = self.position;
        let mut fill = self.style.fill.to_string();
        let mut stroke = self.style.stroke.to_string();
        let mut text_color = "black".to_string();

        if self.is_terminal() {
            text_color = "#FFFFFF".to_string();
            fill = "#000000".to_string();
        }
        if self.is_first() {
            text_color = "#FFFFFF".to_string();
            fill = self.style.stroke.to_string();
            stroke = self.style.fill.to_string();
        }

        for tag in &self.tags {
            tag.render(out, &self.style, &self.url);
        }

        out.start_element("a");
        out.attribute("xlink:href", &self.url);
        if let Some(clause) = &self.descriptor.clause {
            out.start_element("title");
            out.text(clause);
            out.end_element();
        }

        out.start_element("circle");
        out.attribute("changeset", &self.revision().to_string());
        out.attribute("fill", &fill);
        out.attribute("stroke", &stroke);
        out.number("r", self.style.radius);
        out.number("cx", x);
        out.number("cy", y);
        out.number("stroke-width", if self.head { 5.0 } else { 3.0 });
        out.end_element();

        out.start_element("text");
        out.attribute("class", "changeset_text");
        out.attribute("text-anchor", "middle");
        out.number("x", x);
        out.number("y", y + self.style.text_height / 4.0);
        out.attribute("fill", &text_color);
        out.text(&self.revision().to_string());
        out.end_element();

        out.end_element();
    }
}

/// Translucent rounded box spanning the nodes of a bring/deliver range.
fn range_background(pass: &mut RenderPass<'_>, range: RevisionRange, kind: ActionKind) {
    let view = &pass.view;
    let (Some(first), Some(last)) = (view.changeset(range.first), view.changeset(range.last))
    else {
        tracing::debug!(
            first = range.first,
            last = range.last,
            "skipping {} background: range not displayed",
            kind.as_str()
        );
        return;
    };
    let Some(lane) = view.branch(first.branch()) else {
        return;
    };

    let (p1, p2) = (first.center(), last.center());
    let top = p1.y.min(p2.y);
    let width = first.radius().max(last.radius()) * 2.0 + 30.0;
    let height = (p2.y - p1.y).abs() + width;

    let out = &mut *pass.out;
    out.start_element("rect");
    out.attribute("group2", lane.name());
    out.attribute("group", lane.name());
    out.attribute("class", kind.as_str());
    out.attribute("fill", "#fffbdb");
    out.attribute("stroke", "#aaa161");
    out.number("stroke-width", 3.0);
    out.number("rx", 12.0);
    out.number("ry", 12.0);
    out.number("x", p1.x - width / 2.0);
    out.number("y", top - width / 2.0 - 5.0);
    out.number("width", width);
    out.number("height", height + 10.0);
    out.number("opacity", 0.5);
    out.end_element();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneEvent, elements};

    fn style() -> NodeStyle {
        NodeStyle {
            fill: Rgb(200, 200, 200),
            stroke: Rgb(100, 100, 100),
            radius: 20.0,
            text_height: 16.0,
        }
    }

    fn changeset(desc: RevisionDescriptor, head: bool) -> ChangeSet {
        let ctx = LayoutContext::default()
            .with_base_url("/trac")
            .with_font_size(10.0);
        ChangeSet::new(BranchId(0), desc, head, style(), &ctx)
    }

    // ── Geometry ───────────────────────────────────────────────────────

    #[test]
    fn test_position_anchors() {
        let mut cs = changeset(RevisionDescriptor::new(5), false);
        cs.build(Point::new(100.0, 200.0), Point::new(50.0, 25.0));
        assert_eq!(cs.position(Anchor::Center), Point::new(100.0, 200.0));
        assert_eq!(cs.position(Anchor::N), Point::new(100.0, 180.0));
        assert_eq!(cs.position(Anchor::S), Point::new(100.0, 220.0));
        assert_eq!(cs.position(Anchor::E), Point::new(120.0, 200.0));
        assert_eq!(cs.position(Anchor::W), Point::new(80.0, 200.0));
        let ne = cs.position(Anchor::NE);
        assert!((ne.distance(cs.center()) - 20.0).abs() < 1e-9);
        assert!(ne.x > 100.0 && ne.y < 200.0);
    }

    #[test]
    fn test_extent_without_tags() {
        let mut cs = changeset(RevisionDescriptor::new(5), false);
        let extent = cs.build(Point::new(60.0, 200.0), Point::new(50.0, 25.0));
        // x offset from lane origin (10) + radius (20) < diameter
        assert_eq!(extent, Extent::new(40.0, 40.0));
        assert_eq!(cs.tags_extent(), Extent::default());
    }

    #[test]
    fn test_tags_stack_without_overlap() {
        let desc = RevisionDescriptor::new(5)
            .with_tag("v1.0")
            .with_tag("release-candidate");
        let mut cs = changeset(desc, false);
        let extent = cs.build(Point::new(100.0, 200.0), Point::new(50.0, 25.0));

        let tags = cs.tags();
        assert_eq!(tags.len(), 2);
        // first tag at the upper right of the node
        assert_eq!(
            tags[0].position(),
            Point::new(100.0 + 20.0 + UNIT / 3.0, 180.0)
        );
        // second tag below the first
        let bottom_of_first = tags[0].position().y + tags[0].extent().height;
        assert!(tags[1].position().y > bottom_of_first);
        assert_eq!(tags[1].position().x, tags[0].position().x);

        // extent covers the widest tag
        let widest = tags[1].extent().width;
        assert!((extent.width - (50.0 + 20.0 + widest)).abs() < 1e-9);
        assert!(
            (cs.tags_extent().height - (tags[0].extent().height + tags[1].extent().height)).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_rebuild_does_not_accumulate_tags() {
        let desc = RevisionDescriptor::new(5).with_tag("t");
        let mut cs = changeset(desc, false);
        let first = cs.build(Point::new(100.0, 200.0), Point::new(50.0, 25.0));
        let second = cs.build(Point::new(100.0, 200.0), Point::new(50.0, 25.0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_url() {
        let cs = changeset(RevisionDescriptor::new(77), false);
        assert_eq!(cs.url(), "/trac/changeset/77");
    }

    #[test]
    fn test_stand_in() {
        let cs = ChangeSet::stand_in(BranchId(3), style(), Point::new(1.0, 2.0));
        assert_eq!(cs.revision(), 0);
        assert_eq!(cs.branch(), BranchId(3));
        assert_eq!(cs.center(), Point::new(1.0, 2.0));
    }

    // ── Node rendering ─────────────────────────────────────────────────

    fn render(cs: &ChangeSet) -> Vec<SceneEvent> {
        let mut out: Vec<SceneEvent> = Vec::new();
        cs.render_node(&mut out);
        out
    }

    #[test]
    fn test_render_node_plain() {
        let mut cs = changeset(RevisionDescriptor::new(12), false);
        cs.build(Point::new(10.0, 20.0), Point::default());
        let out = render(&cs);
        let circles = elements(&out, "circle");
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0]["changeset"], "12");
        assert_eq!(circles[0]["stroke-width"], "3");
        assert_eq!(circles[0]["fill"], "rgb(200,200,200)");
        assert_eq!(elements(&out, "a")[0]["xlink:href"], "/trac/changeset/12");
        assert!(out.contains(&SceneEvent::Text("12".into())));
    }

    #[test]
    fn test_render_head_is_bold() {
        let cs = changeset(RevisionDescriptor::new(12), true);
        assert_eq!(elements(&render(&cs), "circle")[0]["stroke-width"], "5");
    }

    #[test]
    fn test_render_terminal_is_black() {
        let cs = changeset(RevisionDescriptor::new(12).terminal(), false);
        let out = render(&cs);
        assert_eq!(elements(&out, "circle")[0]["fill"], "#000000");
        assert_eq!(elements(&out, "text")[0]["fill"], "#FFFFFF");
    }

    #[test]
    fn test_render_first_is_inverted() {
        let cs = changeset(RevisionDescriptor::new(12).first(), false);
        let circle = &elements(&render(&cs), "circle")[0];
        assert_eq!(circle["fill"], "rgb(100,100,100)");
        assert_eq!(circle["stroke"], "rgb(200,200,200)");
    }

    #[test]
    fn test_render_tags_and_clause() {
        let desc = RevisionDescriptor::new(12)
            .with_tag("v2")
            .with_clause("ticket #4");
        let mut cs = changeset(desc, false);
        cs.build(Point::new(10.0, 20.0), Point::default());
        let out = render(&cs);
        assert_eq!(elements(&out, "rect").len(), 1);
        assert!(out.contains(&SceneEvent::Text("v2".into())));
        assert!(out.contains(&SceneEvent::Text("ticket #4".into())));
    }
}
