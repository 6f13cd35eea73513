#![doc = include_str!("../README.md")]

mod branch;
mod changeset;
mod color;
mod context;
mod error;
mod geometry;
mod metrics;
mod query;
mod route;
mod scene;
mod tree;
mod types;

pub mod v1 {
    //! Versioned public API for revision tree layout.
    //!
    //! # Input
    //!
    //! - [`Document`]: a graph plus base URL, style and font
    //! - [`RevisionGraph`], [`BranchDescriptor`], [`RevisionDescriptor`]
    //!
    //! # Layout
    //!
    //! - [`Tree`]: owns the lanes and drives `build`/`render`
    //! - [`Branch`], [`ChangeSet`], [`Tag`]: laid-out lanes and nodes
    //! - [`LayoutContext`]: metrics, links, style and colors for one graph
    //! - [`Route`]: a routed cross-lane curve
    //!
    //! # Output
    //!
    //! - [`SceneWriter`]: the element writer a tree renders into
    //! - [`SceneEvent`]: a recorded writer call
    //!
    //! # Example
    //!
    //! ```
    //! use revtree::v1::*;
    //!
    //! let doc = Document::from_json(r#"{
    //!     "tree": {
    //!         "max_rev": 10,
    //!         "brc": [
    //!             { "name": "trunk", "path": "trunk", "lastrev": true,
    //!               "revisions": [ { "rev": 3 }, { "rev": 2 }, { "rev": 1 } ] },
    //!             { "name": "feature", "path": "branches/feature", "lastrev": true,
    //!               "revisions": [ { "rev": 10, "src": 2 } ] }
    //!         ]
    //!     },
    //!     "url": "/trac/project"
    //! }"#).unwrap();
    //!
    //! let mut tree = Tree::from_document(&doc).unwrap();
    //! tree.build(1.0);
    //!
    //! let routes = tree.routes();
    //! assert_eq!(routes.len(), 1);
    //! assert!(routes[0].waypoints.is_empty());
    //! ```

    pub mod query {
        pub use crate::query::{ActionRef, LaneSummary, Location, actions, lane_of, locate, summary};
    }

    pub use crate::branch::{Branch, BranchHeader, SlotParams, Straddle};
    pub use crate::changeset::{BranchId, ChangeSet, Tag};
    pub use crate::color::Rgb;
    pub use crate::context::LayoutContext;
    pub use crate::error::{Result, RevtreeError};
    pub use crate::geometry::{Anchor, Extent, Point, UNIT};
    pub use crate::metrics::TextMetrics;
    pub use crate::route::{Occupancy, Route};
    pub use crate::scene::{
        ArrowCache, ArrowEnd, ArrowKey, Layer, SceneEvent, SceneWriter, replay,
    };
    pub use crate::tree::{ChangeSetId, Tree, TreeState};
    pub use crate::types::{
        ActionKind, BranchDescriptor, Document, Revision, RevisionDescriptor, RevisionGraph,
        RevisionRange, Style,
    };
}
