//! Generate SVG revision tree diagrams from revtree documents.
//!
//! [`SvgWriter`] is a [`SceneWriter`] producing an XML string, and
//! [`render`] runs a whole document through layout and rendering in one
//! call. Lanes become columns of linked circles under a titled header;
//! source, bring and deliver actions become green, blue and orange curves.
//!
//! # Example
//!
//! ```
//! use revtree::v1::{BranchDescriptor, Document, RevisionDescriptor, RevisionGraph};
//! use revtree_svg::{render, RenderOptions};
//!
//! let graph = RevisionGraph::new(10)
//!     .with_branch(
//!         BranchDescriptor::new("trunk", "trunk")
//!             .with_revision(RevisionDescriptor::new(2))
//!             .with_revision(RevisionDescriptor::new(1)),
//!     )
//!     .with_branch(
//!         BranchDescriptor::new("feature", "branches/feature")
//!             .with_revision(RevisionDescriptor::new(10).with_source(2)),
//!     );
//!
//! let svg = render(&Document::new(graph), &RenderOptions::default()).unwrap();
//! assert!(svg.starts_with("<?xml"));
//! assert!(svg.contains("<svg "));
//! ```
//!
//! From the command line:
//!
//! ```bash
//! revtree render svg -i graph.json -o graph.svg
//! ```

use revtree::v1::{Document, LayoutContext, Result, Rgb, SceneWriter, Style, Tree};

/// Options controlling layout and output. Unset options fall back to the
/// values carried by the document.
pub struct RenderOptions {
    /// Layout scale applied by the build pass.
    pub scale: f64,
    /// Display zoom applied to the canvas size.
    pub zoom: f64,
    /// Slot style, overriding the document's.
    pub style: Option<Style>,
    /// Base URL for changeset and browser links, overriding the document's.
    pub base_url: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    /// Lanes drawn with the fixed trunk color. Empty keeps the default.
    pub trunks: Vec<String>,
    /// Fill of the trunk lanes.
    pub trunk_color: Option<Rgb>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zoom: 1.0,
            style: None,
            base_url: None,
            font_size: None,
            font_family: None,
            trunks: Vec::new(),
            trunk_color: None,
        }
    }
}

impl RenderOptions {
    /// Layout context for `doc` with these overrides applied.
    pub fn context(&self, doc: &Document) -> LayoutContext {
        let mut ctx = LayoutContext::from_document(doc);
        if let Some(style) = self.style {
            ctx = ctx.with_style(style);
        }
        if let Some(url) = &self.base_url {
            ctx = ctx.with_base_url(url.clone());
        }
        if let Some(size) = self.font_size {
            ctx = ctx.with_font_size(size);
        }
        if let Some(family) = &self.font_family {
            ctx = ctx.with_font_family(family.clone());
        }
        if !self.trunks.is_empty() {
            ctx = ctx.with_trunks(self.trunks.clone());
        }
        if let Some(color) = self.trunk_color {
            ctx = ctx.with_trunk_color(color);
        }
        ctx
    }
}

/// Lay out and render `doc` to an SVG document string.
pub fn render(doc: &Document, options: &RenderOptions) -> Result<String> {
    let mut tree = Tree::new(&doc.tree, options.context(doc))?;
    tree.build(options.scale);
    tree.zoom(options.zoom);

    let mut writer = SvgWriter::new();
    tree.render(&mut writer)?;
    Ok(writer.finish())
}

struct OpenElement {
    name: String,
    has_children: bool,
}

/// Streaming SVG/XML writer.
///
/// Elements are indented by nesting depth; text is written inline so that
/// `<text>` content carries no extra whitespace. Elements without content
/// are self-closed.
#[derive(Default)]
pub struct SvgWriter {
    buf: String,
    stack: Vec<OpenElement>,
    tag_open: bool,
}

impl SvgWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn close_tag(&mut self) {
        if self.tag_open {
            self.buf.push('>');
            self.tag_open = false;
        }
    }

    fn newline(&mut self, depth: usize) {
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        for _ in 0..depth {
            self.buf.push_str("  ");
        }
    }

    /// Close every open element and return the document.
    pub fn finish(mut self) -> String {
        while !self.stack.is_empty() {
            self.end_element();
        }
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n", self.buf)
    }
}

impl SceneWriter for SvgWriter {
    fn start_element(&mut self, name: &str) {
        self.close_tag();
        if let Some(parent) = self.stack.last_mut() {
            parent.has_children = true;
        }
        self.newline(self.stack.len());
        self.buf.push('<');
        self.buf.push_str(name);
        self.stack.push(OpenElement {
            name: name.to_string(),
            has_children: false,
        });
        self.tag_open = true;
    }

    fn attribute(&mut self, key: &str, value: &str) {
        if !self.tag_open {
            return;
        }
        self.buf.push(' ');
        self.buf.push_str(key);
        self.buf.push_str("=\"");
        self.buf.push_str(&escape_xml(value));
        self.buf.push('"');
    }

    fn text(&mut self, text: &str) {
        self.close_tag();
        self.buf.push_str(&escape_xml(text));
    }

    fn end_element(&mut self) {
        let Some(element) = self.stack.pop() else {
            return;
        };
        if self.tag_open {
            self.buf.push_str("/>");
            self.tag_open = false;
            return;
        }
        if element.has_children {
            self.newline(self.stack.len());
        }
        self.buf.push_str("</");
        self.buf.push_str(&element.name);
        self.buf.push('>');
    }
}

/// Escape a string for XML text and attribute values.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use revtree::v1::{BranchDescriptor, RevisionDescriptor, RevisionGraph};

    fn two_lanes() -> Document {
        let graph = RevisionGraph::new(10)
            .with_branch(
                BranchDescriptor::new("trunk", "trunk")
                    .with_revision(RevisionDescriptor::new(3))
                    .with_revision(RevisionDescriptor::new(2).with_tag("v1.0"))
                    .with_revision(RevisionDescriptor::new(1)),
            )
            .with_branch(
                BranchDescriptor::new("feature", "branches/feature")
                    .truncated()
                    .with_revision(RevisionDescriptor::new(10).with_source(2).first()),
            );
        Document::new(graph).with_url("/trac/proj")
    }

    // ── escape_xml ─────────────────────────────────────────────────────

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<g>"), "&lt;g&gt;");
        assert_eq!(escape_xml(r#"say "hi""#), "say &quot;hi&quot;");
    }

    // ── SvgWriter ──────────────────────────────────────────────────────

    #[test]
    fn test_writer_self_closes_empty_elements() {
        let mut w = SvgWriter::new();
        w.start_element("circle");
        w.number("r", 5.0);
        w.end_element();
        assert_eq!(w.finish(), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<circle r=\"5\"/>\n");
    }

    #[test]
    fn test_writer_nests_and_indents() {
        let mut w = SvgWriter::new();
        w.start_element("g");
        w.attribute("group", "trunk");
        w.start_element("text");
        w.text("12");
        w.end_element();
        w.end_element();
        let out = w.finish();
        assert!(out.contains("<g group=\"trunk\">\n  <text>12</text>\n</g>"), "{}", out);
    }

    #[test]
    fn test_writer_escapes() {
        let mut w = SvgWriter::new();
        w.start_element("a");
        w.attribute("xlink:href", "/browser/x?rev=1&y=2");
        w.text("a<b");
        w.end_element();
        let out = w.finish();
        assert!(out.contains("xlink:href=\"/browser/x?rev=1&amp;y=2\""));
        assert!(out.contains(">a&lt;b</a>"));
    }

    #[test]
    fn test_finish_closes_open_elements() {
        let mut w = SvgWriter::new();
        w.start_element("svg");
        w.start_element("g");
        w.text("x");
        let out = w.finish();
        assert!(out.trim_end().ends_with("</g>\n</svg>"), "{}", out);
    }

    // ── render ─────────────────────────────────────────────────────────

    #[test]
    fn test_render_document() {
        let svg = render(&two_lanes(), &RenderOptions::default()).unwrap();
        assert!(svg.contains("id=\"svgview\""));
        assert!(svg.contains("xmlns=\"http://www.w3.org/2000/svg\""));
        assert_eq!(svg.matches("<circle ").count(), 4);
        assert!(svg.contains("xlink:href=\"/trac/proj/changeset/10\""));
        assert!(svg.contains("xlink:href=\"/trac/proj/browser/branches/feature?rev=10\""));
        assert!(svg.contains(">v1.0</text>"));
        assert!(svg.contains("changesets=\"2,10\""));
        assert!(svg.contains("class=\"more-revisions\""));
        assert!(svg.contains("<marker id=\"arrow_tail__5faf5f\""));
    }

    #[test]
    fn test_render_is_deterministic() {
        let doc = two_lanes();
        let a = render(&doc, &RenderOptions::default()).unwrap();
        let b = render(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_options_override_document() {
        let options = RenderOptions {
            base_url: Some("/other".to_string()),
            font_family: Some("Courier".to_string()),
            ..Default::default()
        };
        let svg = render(&two_lanes(), &options).unwrap();
        assert!(svg.contains("/other/changeset/3"));
        assert!(!svg.contains("/trac/proj"));
        assert!(svg.contains("font-family=\"Courier\""));
    }

    #[test]
    fn test_render_zoom() {
        let doc = two_lanes();
        let plain = render(&doc, &RenderOptions::default()).unwrap();
        let zoomed = render(
            &doc,
            &RenderOptions {
                zoom: 2.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_ne!(plain, zoomed);
        // the body is unchanged, only the canvas size
        let body = |s: &str| s[s.find("<defs").unwrap()..].to_string();
        assert_eq!(body(&plain), body(&zoomed));
    }

    #[test]
    fn test_render_compact_and_trunks() {
        let options = RenderOptions {
            style: Some(Style::Compact),
            trunks: vec!["feature".to_string()],
            ..Default::default()
        };
        let ctx = options.context(&two_lanes());
        assert_eq!(ctx.style, Style::Compact);
        assert_eq!(ctx.trunks, vec!["feature".to_string()]);
        assert_eq!(ctx.trunk_color, LayoutContext::default().trunk_color);
        assert!(render(&two_lanes(), &options).is_ok());
    }

    #[test]
    fn test_render_trunk_color() {
        let options = RenderOptions {
            trunk_color: Some(Rgb(0x8e, 0xb8, 0xe2)),
            ..Default::default()
        };
        let svg = render(&two_lanes(), &options).unwrap();
        assert!(svg.contains("fill=\"rgb(142,184,226)\""));
    }

    #[test]
    fn test_render_rejects_duplicate_revisions() {
        let graph = RevisionGraph::new(2)
            .with_branch(BranchDescriptor::new("a", "a").with_revision(RevisionDescriptor::new(2)))
            .with_branch(BranchDescriptor::new("b", "b").with_revision(RevisionDescriptor::new(2)));
        assert!(render(&Document::new(graph), &RenderOptions::default()).is_err());
    }
}
