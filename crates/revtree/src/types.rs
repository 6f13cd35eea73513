use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RevtreeError};

/// A repository revision number. Revisions are unique across the whole graph.
pub type Revision = u64;

/// A revision-graph document, as produced by the graph server.
///
/// Besides the graph itself the document carries the repository base URL
/// (used to build changeset and browser links), the layout style chosen by
/// the user, and optionally the font the diagram is drawn with.
///
/// # JSON shape
///
/// ```json
/// {
///   "tree": {
///     "max_rev": 12,
///     "brc": [
///       { "name": "trunk", "path": "trunk", "lastrev": true,
///         "revisions": [ { "rev": 12 }, { "rev": 3, "tags": ["v1.0"] } ] },
///       { "name": "feature", "path": "branches/feature", "lastrev": true,
///         "revisions": [ { "rev": 10, "src": 3, "firstrev": true } ] }
///     ]
///   },
///   "url": "/trac/project",
///   "style": "compact"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub tree: RevisionGraph,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fontfamily: Option<String>,
    /// Font size in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fontsize: Option<f64>,
}

/// The branch/revision graph: lanes in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionGraph {
    /// Highest revision id; only used to size revision labels.
    pub max_rev: Revision,
    /// Branch descriptors, in lane order (left to right).
    pub brc: Vec<BranchDescriptor>,
}

/// One branch lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchDescriptor {
    pub name: String,
    pub path: String,
    /// `true` when the newest revision listed is the branch tip. `false`
    /// means more recent revisions exist but were filtered out.
    #[serde(default)]
    pub lastrev: bool,
    /// Revisions, newest first.
    pub revisions: Vec<RevisionDescriptor>,
}

/// One revision of a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionDescriptor {
    pub rev: Revision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause: Option<String>,
    /// First revision of the branch (the copy that created it)
    #[serde(default, skip_serializing_if = "is_false")]
    pub firstrev: bool,
    /// Terminal revision of the branch (the branch was deleted after it)
    #[serde(default, skip_serializing_if = "is_false")]
    pub lastrev: bool,
    /// Revision this branch was created from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<Revision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brings: Option<RevisionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivers: Option<RevisionRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A pair of revisions bounding a bring or deliver operation.
///
/// Serialized as a two-element array; any other length is rejected at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[Revision; 2]", into = "[Revision; 2]")]
pub struct RevisionRange {
    pub first: Revision,
    pub last: Revision,
}

impl From<[Revision; 2]> for RevisionRange {
    fn from([first, last]: [Revision; 2]) -> Self {
        Self { first, last }
    }
}

impl From<RevisionRange> for [Revision; 2] {
    fn from(range: RevisionRange) -> Self {
        [range.first, range.last]
    }
}

/// Slot assignment style.
///
/// `Timeline` spaces changesets proportionally to their revision distance,
/// so every lane shares one vertical time axis. `Compact` stacks the
/// changesets of a lane at a uniform pitch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Style {
    #[default]
    Timeline,
    Compact,
}

impl From<String> for Style {
    fn from(s: String) -> Self {
        match s.as_str() {
            "compact" => Style::Compact,
            _ => Style::Timeline,
        }
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        match style {
            Style::Timeline => "timeline".to_string(),
            Style::Compact => "compact".to_string(),
        }
    }
}

/// The kind of a cross-branch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Source,
    Bring,
    Deliver,
}

impl ActionKind {
    /// Stroke color for curves of this kind.
    pub fn color(self) -> &'static str {
        match self {
            ActionKind::Source => "#5faf5f",
            ActionKind::Bring => "blue",
            ActionKind::Deliver => "orange",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Source => "source",
            ActionKind::Bring => "bring",
            ActionKind::Deliver => "deliver",
        }
    }
}

// ============================================================================
// Convenience methods
// ============================================================================

impl Document {
    /// Wrap a graph with an empty base URL and the default style.
    pub fn new(tree: RevisionGraph) -> Self {
        Self {
            tree,
            url: String::new(),
            style: Style::default(),
            fontfamily: None,
            fontsize: None,
        }
    }

    /// Parse a document from JSON
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read and parse a document from a file.
    ///
    /// A missing file is reported as [`RevtreeError::NotFound`], distinct
    /// from read and parse failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RevtreeError::NotFound(path.to_path_buf())
            } else {
                RevtreeError::Io(e)
            }
        })?;
        Ok(Self::from_json(&content)?)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl RevisionGraph {
    /// Create an empty graph whose labels are sized for `max_rev`.
    pub fn new(max_rev: Revision) -> Self {
        Self {
            max_rev,
            brc: Vec::new(),
        }
    }

    pub fn with_branch(mut self, branch: BranchDescriptor) -> Self {
        self.brc.push(branch);
        self
    }
}

impl BranchDescriptor {
    /// Create a branch lane whose newest revision is the branch tip.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            lastrev: true,
            revisions: Vec::new(),
        }
    }

    /// Mark the lane as truncated: more recent revisions exist.
    pub fn truncated(mut self) -> Self {
        self.lastrev = false;
        self
    }

    /// Append a revision. Revisions must be appended newest first.
    pub fn with_revision(mut self, revision: RevisionDescriptor) -> Self {
        self.revisions.push(revision);
        self
    }
}

impl RevisionDescriptor {
    pub fn new(rev: Revision) -> Self {
        Self {
            rev,
            clause: None,
            firstrev: false,
            lastrev: false,
            src: None,
            brings: None,
            delivers: None,
            tags: Vec::new(),
        }
    }

    pub fn with_source(mut self, src: Revision) -> Self {
        self.src = Some(src);
        self
    }

    pub fn with_brings(mut self, first: Revision, last: Revision) -> Self {
        self.brings = Some(RevisionRange { first, last });
        self
    }

    pub fn with_delivers(mut self, first: Revision, last: Revision) -> Self {
        self.delivers = Some(RevisionRange { first, last });
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_clause(mut self, clause: impl Into<String>) -> Self {
        self.clause = Some(clause.into());
        self
    }

    /// Mark as the first revision of its branch.
    pub fn first(mut self) -> Self {
        self.firstrev = true;
        self
    }

    /// Mark as the terminal revision of its branch.
    pub fn terminal(mut self) -> Self {
        self.lastrev = true;
        self
    }

    /// Cross-lane actions ending at this revision, as `(kind, origin)` pairs.
    ///
    /// Brings and delivers are drawn from the first revision of their range.
    pub fn actions(&self) -> impl Iterator<Item = (ActionKind, Revision)> + '_ {
        let source = self.src.map(|src| (ActionKind::Source, src));
        let brings = self.brings.map(|r| (ActionKind::Bring, r.first));
        let delivers = self.delivers.map(|r| (ActionKind::Deliver, r.first));
        source.into_iter().chain(brings).chain(delivers)
    }
}
