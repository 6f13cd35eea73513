//! Read-only queries over a revision tree.

use serde::Serialize;

use crate::tree::Tree;
use crate::types::{ActionKind, Revision};

/// One declared cross-lane action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRef {
    pub kind: ActionKind,
    pub source: Revision,
    pub dest: Revision,
    pub color: &'static str,
    /// Whether both endpoints are displayed on different lanes, i.e. the
    /// action is drawn.
    pub drawn: bool,
}

/// Per-lane overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneSummary {
    pub name: String,
    pub path: String,
    pub changesets: usize,
    pub newest: Revision,
    pub oldest: Revision,
    /// Newer revisions exist beyond the displayed ones.
    pub truncated: bool,
}

/// Where a revision is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub revision: Revision,
    pub lane: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub url: String,
}

/// Name of the lane holding `revision`.
///
/// # Examples
///
/// ```
/// use revtree::v1::{BranchDescriptor, LayoutContext, RevisionDescriptor, RevisionGraph, Tree, query};
///
/// let graph = RevisionGraph::new(4).with_branch(
///     BranchDescriptor::new("trunk", "trunk").with_revision(RevisionDescriptor::new(4)),
/// );
/// let tree = Tree::new(&graph, LayoutContext::default()).unwrap();
/// assert_eq!(query::lane_of(&tree, 4), Some("trunk"));
/// assert_eq!(query::lane_of(&tree, 5), None);
/// ```
pub fn lane_of(tree: &Tree, revision: Revision) -> Option<&str> {
    let changeset = tree.changeset(revision)?;
    tree.branch(changeset.branch()).map(|b| b.name())
}

/// Every action declared by the displayed changesets, in lane order.
pub fn actions(tree: &Tree) -> Vec<ActionRef> {
    let mut found = Vec::new();
    for branch in tree.branches() {
        for changeset in branch.changesets() {
            for (kind, source) in changeset.descriptor().actions() {
                let drawn = tree
                    .changeset(source)
                    .is_some_and(|origin| origin.branch() != changeset.branch());
                found.push(ActionRef {
                    kind,
                    source,
                    dest: changeset.revision(),
                    color: kind.color(),
                    drawn,
                });
            }
        }
    }
    found
}

pub fn summary(tree: &Tree) -> Vec<LaneSummary> {
    tree.branches()
        .iter()
        .map(|branch| {
            let revs = branch.changesets().iter().map(|c| c.revision());
            LaneSummary {
                name: branch.name().to_string(),
                path: branch.path().to_string(),
                changesets: branch.changesets().len(),
                newest: revs.clone().max().unwrap_or(0),
                oldest: revs.min().unwrap_or(0),
                truncated: !branch.is_complete(),
            }
        })
        .collect()
}

/// Position of `revision` in the current layout.
pub fn locate(tree: &Tree, revision: Revision) -> Option<Location> {
    let changeset = tree.changeset(revision)?;
    let center = changeset.center();
    Some(Location {
        revision,
        lane: lane_of(tree, revision)?.to_string(),
        x: center.x,
        y: center.y,
        radius: changeset.radius(),
        url: changeset.url().to_string(),
    })
}
