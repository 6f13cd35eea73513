//! Lanes: header, slot generator, and extent aggregation.

use crate::changeset::{BranchId, ChangeSet, NodeStyle};
use crate::context::LayoutContext;
use crate::error::{Result, RevtreeError};
use crate::geometry::{Anchor, Extent, Point, UNIT};
use crate::scene::{ArrowEnd, Layer, SceneWriter};
use crate::tree::RenderPass;
use crate::types::{BranchDescriptor, Revision, Style};

/// Linked title box at the top of a lane.
#[derive(Debug, Clone)]
pub struct BranchHeader {
    title: String,
    url: String,
    extent: Extent,
    position: Point,
}

impl BranchHeader {
    fn new(title: &str, path: &str, newest: Revision, ctx: &LayoutContext) -> Self {
        Self {
            title: title.to_string(),
            url: ctx.browser_url(path, newest),
            extent: Extent::new(
                ctx.metrics.text_width(title) + UNIT,
                ctx.metrics.text_height() + UNIT,
            ),
            position: Point::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Horizontally centered on the box; southern anchors give the bottom
    /// edge, every other anchor the top edge.
    pub fn position(&self, anchor: Anchor) -> Point {
        let x = self.position.x + self.extent.width / 2.0;
        match anchor {
            Anchor::S | Anchor::SE | Anchor::SW => Point::new(x, self.position.y + self.extent.height),
            _ => Point::new(x, self.position.y),
        }
    }

    fn render(&self, out: &mut dyn SceneWriter, style: &NodeStyle) {
        let Point { x, y } = self.position;
        let Extent { width, height } = self.extent;

        out.start_element("a");
        out.attribute("xlink:href", &self.url);

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
        out.text(&self.title);
        out.end_element();

        out.end_element();
    }
}

/// Inputs of the slot generator that come from the whole tree.
#[derive(Debug, Clone, Copy)]
pub struct SlotParams {
    pub scale: f64,
    /// Highest revision registered anywhere in the tree.
    pub newest: Revision,
    pub style: Style,
}

/// The two nodes of a lane immediately above and below a height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Straddle {
    pub x: f64,
    pub above: f64,
    pub below: f64,
    pub radius: f64,
    /// `above` is the header stand-in rather than a drawn node.
    pub stand_in: bool,
}

impl Straddle {
    /// Point on the lane axis halfway between both nodes.
    pub fn midpoint(&self) -> Point {
        Point::new(self.x, (self.above + self.below) / 2.0)
    }

    /// Heights on the lane axis at least `margin` away from both drawn
    /// nodes. Unbounded above when the upper node is the stand-in; empty
    /// (`lo > hi`) when the gap is too narrow.
    pub fn clear_span(&self, margin: f64) -> (f64, f64) {
        let lo = if self.stand_in {
            f64::NEG_INFINITY
        } else {
            self.above + margin
        };
        (lo, self.below - margin)
    }
}

/// One lane of the diagram.
#[derive(Debug, Clone)]
pub struct Branch {
    id: BranchId,
    name: String,
    path: String,
    lastrev: bool,
    header: BranchHeader,
    changesets: Vec<ChangeSet>,
    style: NodeStyle,
    diameter: f64,
    max_extent: Extent,
    extent: Extent,
    pass_extent: Extent,
    slot: Point,
    origin: Point,
}

impl Branch {
    pub(crate) fn new(
        id: BranchId,
        desc: &BranchDescriptor,
        max_rev: Revision,
        ctx: &LayoutContext,
    ) -> Result<Self> {
        let newest = desc
            .revisions
            .first()
            .ok_or_else(|| RevtreeError::EmptyBranch(desc.name.clone()))?
            .rev;

        let (fill, stroke) = ctx.lane_colors(&desc.name);
        let label_width = ctx.metrics.text_width(&max_rev.to_string());
        let radius = label_width / 2.0 + UNIT / 3.0;
        let diameter = radius * 2.0;
        let style = NodeStyle {
            fill,
            stroke,
            radius,
            text_height: ctx.metrics.text_height(),
        };

        let changesets = desc
            .revisions
            .iter()
            .enumerate()
            .map(|(idx, rev)| ChangeSet::new(id, rev.clone(), idx == 0 && desc.lastrev, style, ctx))
            .collect();

        Ok(Self {
            id,
            name: desc.name.clone(),
            path: desc.path.clone(),
            lastrev: desc.lastrev,
            header: BranchHeader::new(&desc.name, &desc.path, newest, ctx),
            changesets,
            style,
            diameter,
            max_extent: Extent::new(diameter, diameter),
            extent: Extent::default(),
            pass_extent: Extent::default(),
            slot: Point::default(),
            origin: Point::default(),
        })
    }

    pub fn id(&self) -> BranchId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the lane's newest node is the branch tip. When it is not,
    /// a "more revisions" indicator is drawn under the header.
    pub fn is_complete(&self) -> bool {
        self.lastrev
    }

    pub fn header(&self) -> &BranchHeader {
        &self.header
    }

    /// Changesets, newest first.
    pub fn changesets(&self) -> &[ChangeSet] {
        &self.changesets
    }

    pub(crate) fn changeset_at(&self, index: usize) -> Option<&ChangeSet> {
        self.changesets.get(index)
    }

    pub fn radius(&self) -> f64 {
        self.style.radius
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    /// Per-slot allowance: `(widest child, current height allowance)`.
    pub fn max_extent(&self) -> Extent {
        self.max_extent
    }

    /// Accumulated footprint of header, nodes and tags. Never shrinks.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Top-left corner of the lane.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Horizontal position of the lane axis.
    pub fn vaxis(&self) -> f64 {
        self.header.position(Anchor::S).x
    }

    pub(crate) fn update_extent(&mut self, child: Extent) {
        let diameter = self.diameter;
        self.max_extent.width = self.max_extent.width.max(child.width);

        // Enlarge the slot allowance to a whole multiple of the diameter only
        // for a child taller by more than a radius; otherwise fall back.
        self.max_extent.height = if self.max_extent.height < child.height
            && child.height - self.max_extent.height > diameter / 2.0
        {
            let factor = (child.height / (diameter * 3.0)).ceil();
            diameter * (factor + 1.0)
        } else {
            diameter
        };

        self.pass_extent.width = self.pass_extent.width.max(child.width);
        self.pass_extent.height += child.height;

        self.extent.width = self.extent.width.max(self.pass_extent.width);
        self.extent.height = self.extent.height.max(self.pass_extent.height);
    }

    /// Lay out the header at `origin` and every changeset below it.
    pub(crate) fn build(&mut self, origin: Point, params: &SlotParams) {
        self.origin = origin;
        self.header.position = origin;
        self.pass_extent = Extent::default();

        let header = self.header.extent;
        self.update_extent(Extent::new(header.width, self.diameter));

        self.slot = Point::new(
            origin.x + header.width / 2.0,
            origin.y + 2.0 * self.max_extent.height,
        );

        for idx in 0..self.changesets.len() {
            let revision = self.changesets[idx].revision();
            let slot = self.get_slot(revision, params);
            let extent = self.changesets[idx].build(slot, origin);
            self.update_extent(extent);
        }
    }

    /// Next node position, advancing the slot cursor.
    ///
    /// Compact lanes stack nodes at a uniform pitch. Timeline lanes place a
    /// revision in proportion to its distance from the newest revision of
    /// the tree, so equal revisions line up across lanes. Revision 0 asks
    /// for the slot just past the last node.
    pub fn get_slot(&mut self, revision: Revision, params: &SlotParams) -> Point {
        let slot = self.peek_slot(revision, params);
        self.slot.y = slot.y;
        slot
    }

    /// The slot [`Branch::get_slot`] would return, without advancing.
    pub fn peek_slot(&self, revision: Revision, params: &SlotParams) -> Point {
        let pitch = 3.0 * params.scale;
        let y = match params.style {
            Style::Compact => self.slot.y + pitch * self.max_extent.height,
            Style::Timeline if revision == 0 => self.slot.y + pitch * self.diameter,
            Style::Timeline => {
                let offset = params.newest.saturating_sub(revision) as f64;
                (offset + 2.0) * pitch * self.diameter
            }
        };
        Point::new(self.slot.x, y)
    }

    /// The nodes immediately above and below height `y` on this lane.
    ///
    /// An invisible stand-in placed under the header takes part in the scan
    /// so a height just under the header pairs with the newest node. Heights
    /// above the stand-in or below the oldest node have no straddling pair.
    pub fn straddle(&self, y: f64, scale: f64) -> Option<Straddle> {
        let stand_in = self
            .header
            .position(Anchor::Center)
            .offset(0.0, 3.0 * scale * self.diameter);
        let stand_in = ChangeSet::stand_in(self.id, self.style, stand_in);

        let mut above: Option<(f64, bool)> = None;
        for (idx, node) in std::iter::once(&stand_in)
            .chain(self.changesets.iter())
            .enumerate()
        {
            let yc = node.center().y;
            if yc >= y {
                return above.map(|(above, stand_in)| Straddle {
                    x: self.vaxis(),
                    above,
                    below: yc,
                    radius: self.style.radius,
                    stand_in,
                });
            }
            above = Some((yc, idx == 0));
        }
        None
    }

    pub(crate) fn render_layer(&self, layer: Layer, pass: &mut RenderPass<'_>) {
        for changeset in &self.changesets {
            changeset.render_layer(layer, pass);
        }
        match layer {
            Layer::Backgrounds => {}
            Layer::Edges => self.header.render(pass.out, &self.style),
            Layer::Nodes => {
                self.render_connectors(pass);
                if !self.lastrev {
                    self.render_more_revisions(pass.out);
                }
            }
        }
    }

    fn render_connectors(&self, pass: &mut RenderPass<'_>) {
        for pair in self.changesets.windows(2) {
            let (newer, older) = (&pair[0], &pair[1]);
            let marker = pass.markers.get(ArrowEnd::Tail, "gray");
            let from = older.position(Anchor::N);
            let to = newer.position(Anchor::S);

            let out = &mut *pass.out;
            out.start_element("line");
            out.attribute("stroke", "gray");
            out.number("stroke-width", 3.0);
            out.attribute("marker-end", &marker);
            out.number("x2", to.x);
            out.number("y2", to.y + 1.0);
            out.number("x1", from.x);
            out.number("y1", from.y - 1.0);
            out.end_element();
        }

        let Some(newest) = self.changesets.first() else {
            return;
        };
        let from = newest.position(Anchor::N);
        let to = self.header.position(Anchor::S);
        let out = &mut *pass.out;
        out.start_element("line");
        out.attribute("stroke", "gray");
        out.number("stroke-width", 3.0);
        out.attribute("stroke-dasharray", "4, 4");
        out.number("x2", to.x);
        out.number("y2", to.y + 1.0);
        out.number("x1", from.x);
        out.number("y1", from.y - 1.0);
        out.end_element();
    }

    fn render_more_revisions(&self, out: &mut dyn SceneWriter) {
        let bottom = self.header.position(Anchor::S);
        let x = bottom.x;
        let y = bottom.y + 10.0;

        out.start_element("g");
        out.attribute("class", "more-revisions");
        out.attribute("stroke", "#E80000");
        out.attribute("fill", "#E80000");

        out.start_element("line");
        out.attribute("stroke", "white");
        out.number("stroke-width", 4.0);
        out.number("x2", x);
        out.number("y2", y + 40.0);
        out.number("x1", x);
        out.number("y1", y - 3.0);
        out.end_element();

        for y in [y, y + 20.0] {
            out.start_element("polygon");
            out.attribute(
                "points",
                &format!("{},{} {},{} {},{}", x, y, x - 8.0, y + 15.0, x + 8.0, y + 15.0),
            );
            out.end_element();
        }

        out.end_element();
    }
}
