//! The root aggregate: lanes, the revision registry, and the build/render
//! passes.

use std::collections::HashMap;

use crate::branch::{Branch, SlotParams};
use crate::changeset::{BranchId, ChangeSet};
use crate::context::LayoutContext;
use crate::error::{Result, RevtreeError};
use crate::geometry::{Extent, Point, UNIT};
use crate::route::{self, Occupancy, Route};
use crate::scene::{ArrowCache, ArrowEnd, Layer, SceneEvent, SceneWriter, replay};
use crate::types::{Document, Revision, RevisionGraph};

/// Ratio between layout units and canvas pixels.
const DISPLAY_FACTOR: f64 = 0.6;

/// Where a revision lives: lane index and position within the lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeSetId {
    pub branch: BranchId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    /// Constructed, no geometry yet.
    Unbuilt,
    /// Geometry valid, scene stale.
    Built,
    /// Scene matches the current geometry.
    Rendered,
}

/// A laid-out revision graph.
///
/// ```
/// use revtree::v1::{BranchDescriptor, LayoutContext, RevisionDescriptor, RevisionGraph, Tree};
///
/// let graph = RevisionGraph::new(3)
///     .with_branch(
///         BranchDescriptor::new("trunk", "trunk")
///             .with_revision(RevisionDescriptor::new(3))
///             .with_revision(RevisionDescriptor::new(1)),
///     )
///     .with_branch(
///         BranchDescriptor::new("feature", "branches/feature")
///             .with_revision(RevisionDescriptor::new(2).with_source(1).first()),
///     );
///
/// let mut tree = Tree::new(&graph, LayoutContext::default()).unwrap();
/// tree.build(1.0);
///
/// let mut events: Vec<revtree::v1::SceneEvent> = Vec::new();
/// tree.render(&mut events).unwrap();
/// assert!(!events.is_empty());
/// ```
#[derive(Debug)]
pub struct Tree {
    branches: Vec<Branch>,
    registry: HashMap<Revision, ChangeSetId>,
    ctx: LayoutContext,
    newest: Revision,
    scale: f64,
    zoom: f64,
    extent: Extent,
    state: TreeState,
    markers: ArrowCache,
    occupancy: Occupancy,
}

impl Tree {
    /// Build the object graph. Fails on a lane without revisions or a
    /// revision that appears twice.
    pub fn new(graph: &RevisionGraph, ctx: LayoutContext) -> Result<Self> {
        let mut branches = Vec::with_capacity(graph.brc.len());
        let mut registry = HashMap::new();

        for (idx, desc) in graph.brc.iter().enumerate() {
            let id = BranchId(idx);
            let branch = Branch::new(id, desc, graph.max_rev, &ctx)?;
            for (index, changeset) in branch.changesets().iter().enumerate() {
                let revision = changeset.revision();
                if registry
                    .insert(revision, ChangeSetId { branch: id, index })
                    .is_some()
                {
                    return Err(RevtreeError::DuplicateRevision(revision));
                }
            }
            branches.push(branch);
        }

        let newest = registry.keys().copied().max().unwrap_or(0);
        tracing::debug!(
            lanes = branches.len(),
            changesets = registry.len(),
            newest,
            "revision tree created"
        );

        Ok(Self {
            branches,
            registry,
            ctx,
            newest,
            scale: 1.0,
            zoom: 1.0,
            extent: Extent::default(),
            state: TreeState::Unbuilt,
            markers: ArrowCache::default(),
            occupancy: Occupancy::default(),
        })
    }

    /// Build from a document, with a context derived from its URL, style,
    /// and font.
    pub fn from_document(doc: &Document) -> Result<Self> {
        Self::new(&doc.tree, LayoutContext::from_document(doc))
    }

    fn view(&self) -> TreeView<'_> {
        TreeView {
            branches: &self.branches,
            registry: &self.registry,
            scale: self.scale,
        }
    }

    pub fn context(&self) -> &LayoutContext {
        &self.ctx
    }

    pub fn state(&self) -> TreeState {
        self.state
    }

    /// Cumulative layout scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Cumulative display zoom.
    pub fn zoom_ratio(&self) -> f64 {
        self.zoom
    }

    /// Canvas size in pixels, before zoom.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Highest registered revision.
    pub fn newest(&self) -> Revision {
        self.newest
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(id.0)
    }

    pub fn changeset(&self, revision: Revision) -> Option<&ChangeSet> {
        self.view().changeset(revision)
    }

    pub fn changeset_count(&self) -> usize {
        self.registry.len()
    }

    /// Lanes whose axis lies strictly between the lanes of `a` and `b`.
    pub fn xbranches(&self, a: &ChangeSet, b: &ChangeSet) -> Vec<&Branch> {
        self.view().xbranches(a, b)
    }

    /// Multiply the layout scale by `ratio` and recompute every position.
    pub fn build(&mut self, ratio: f64) {
        self.scale *= ratio;
        let _span = tracing::debug_span!("build", scale = self.scale).entered();

        self.occupancy.clear();
        let params = SlotParams {
            scale: self.scale,
            newest: self.newest,
            style: self.ctx.style,
        };

        let mut x = UNIT;
        let mut height: f64 = 0.0;
        for branch in &mut self.branches {
            branch.build(Point::new(x, UNIT), &params);
            x += branch.extent().width + 4.0 * UNIT;
            height = height.max(branch.peek_slot(0, &params).y);
        }

        self.extent = Extent::new(x * DISPLAY_FACTOR, height * DISPLAY_FACTOR);
        self.state = TreeState::Built;
        tracing::debug!(
            width = self.extent.width,
            height = self.extent.height,
            "layout complete"
        );
    }

    /// Multiply the display zoom by `ratio`. Only the emitted canvas size
    /// changes; the layout is kept.
    pub fn zoom(&mut self, ratio: f64) {
        self.zoom *= ratio;
    }

    /// Arrow marker reference for `end` in `color`, defined on first use.
    pub fn get_arrow(&mut self, end: ArrowEnd, color: &str) -> String {
        self.markers.get(end, color)
    }

    /// Route one cross-lane edge against the current geometry, registering
    /// its waypoints the way rendering does.
    pub fn route(&mut self, source: Revision, dest: Revision) -> Option<Route> {
        if self.state == TreeState::Unbuilt {
            return None;
        }
        let view = TreeView {
            branches: &self.branches,
            registry: &self.registry,
            scale: self.scale,
        };
        route::route(&view, &mut self.occupancy, source, dest)
    }

    /// Every drawable edge, routed in rendering order from a clean
    /// occupancy registry.
    pub fn routes(&mut self) -> Vec<Route> {
        if self.state == TreeState::Unbuilt {
            return Vec::new();
        }
        self.occupancy.clear();
        let view = TreeView {
            branches: &self.branches,
            registry: &self.registry,
            scale: self.scale,
        };
        let mut routes = Vec::new();
        for branch in &self.branches {
            for changeset in branch.changesets() {
                for (_, origin) in changeset.descriptor().actions() {
                    if let Some(r) =
                        route::route(&view, &mut self.occupancy, origin, changeset.revision())
                    {
                        routes.push(r);
                    }
                }
            }
        }
        routes
    }

    /// Emit the scene for the current geometry.
    pub fn render(&mut self, out: &mut dyn SceneWriter) -> Result<()> {
        if self.state == TreeState::Unbuilt {
            return Err(RevtreeError::NotBuilt);
        }
        let _span = tracing::debug_span!("render", lanes = self.branches.len()).entered();

        self.markers.clear();
        self.occupancy.clear();

        let mut body: Vec<SceneEvent> = Vec::new();
        let mut pass = RenderPass {
            out: &mut body,
            markers: &mut self.markers,
            occupancy: &mut self.occupancy,
            view: TreeView {
                branches: &self.branches,
                registry: &self.registry,
                scale: self.scale,
            },
        };
        for layer in Layer::ALL {
            for branch in &self.branches {
                pass.out.start_element("g");
                pass.out.attribute("group", branch.name());
                branch.render_layer(layer, &mut pass);
                pass.out.end_element();
            }
        }

        let width = format!("{:.1}", self.extent.width);
        let height = format!("{:.1}", self.extent.height);

        out.start_element("svg");
        out.attribute("xmlns", "http://www.w3.org/2000/svg");
        out.attribute("xmlns:xlink", "http://www.w3.org/1999/xlink");
        out.attribute("version", "1.1");
        out.attribute("width", &format!("{:.1}", self.extent.width * self.zoom));
        out.attribute("height", &format!("{:.1}", self.extent.height * self.zoom));
        out.attribute("viewBox", &format!("0 0 {} {}", width, height));
        out.attribute("id", "svgview");

        out.start_element("defs");
        self.markers.write_definitions(out);
        out.end_element();

        out.start_element("g");
        out.attribute("font-size", &format!("{}px", self.ctx.font_size));
        out.attribute("font-family", &self.ctx.font_family);
        out.attribute("transform", &format!("scale({})", DISPLAY_FACTOR));
        replay(&body, out);
        out.end_element();

        out.end_element();

        self.state = TreeState::Rendered;
        tracing::debug!(
            events = body.len(),
            markers = self.markers.len(),
            "scene emitted"
        );
        Ok(())
    }
}

/// Read-only view of the laid-out lanes, used while the rest of the tree
/// is mutably borrowed by a render pass.
pub(crate) struct TreeView<'a> {
    pub branches: &'a [Branch],
    pub registry: &'a HashMap<Revision, ChangeSetId>,
    pub scale: f64,
}

impl<'a> TreeView<'a> {
    pub fn branch(&self, id: BranchId) -> Option<&'a Branch> {
        self.branches.get(id.0)
    }

    pub fn changeset(&self, revision: Revision) -> Option<&'a ChangeSet> {
        let id = self.registry.get(&revision)?;
        self.branch(id.branch)?.changeset_at(id.index)
    }

    pub fn xbranches(&self, a: &ChangeSet, b: &ChangeSet) -> Vec<&'a Branch> {
        let (Some(la), Some(lb)) = (self.branch(a.branch()), self.branch(b.branch())) else {
            return Vec::new();
        };
        let (lo, hi) = if la.vaxis() <= lb.vaxis() {
            (la.vaxis(), lb.vaxis())
        } else {
            (lb.vaxis(), la.vaxis())
        };
        self.branches
            .iter()
            .filter(|br| lo < br.vaxis() && br.vaxis() < hi)
            .collect()
    }
}

/// State threaded through one render pass.
pub(crate) struct RenderPass<'a> {
    pub out: &'a mut dyn SceneWriter,
    pub markers: &'a mut ArrowCache,
    pub occupancy: &'a mut Occupancy,
    pub view: TreeView<'a>,
}
