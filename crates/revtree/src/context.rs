//! Per-graph layout context.
//!
//! One [`LayoutContext`] is created for each graph build and handed to
//! [`Tree::new`](crate::v1::Tree::new), which owns it for the lifetime of the
//! object graph. It carries everything lanes and changesets need besides
//! their own descriptors: text metrics, link base URL, slot style, and the
//! lane color policy.

use crate::color::Rgb;
use crate::metrics::TextMetrics;
use crate::types::{Document, Revision, Style};

const TRUNK_FILL: Rgb = Rgb(0xcd, 0xc9, 0xc9);

#[derive(Debug, Clone)]
pub struct LayoutContext {
    pub metrics: TextMetrics,
    pub base_url: String,
    pub style: Style,
    /// Lane names drawn with `trunk_color`.
    pub trunks: Vec<String>,
    pub trunk_color: Rgb,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            base_url: String::new(),
            style: Style::default(),
            trunks: vec!["trunk".to_string()],
            trunk_color: TRUNK_FILL,
            font_family: "Helvetica".to_string(),
            font_size: TextMetrics::DEFAULT_FONT_SIZE,
        }
    }
}

impl LayoutContext {
    /// Context for a document: its base URL, style, and font.
    pub fn from_document(doc: &Document) -> Self {
        let ctx = Self {
            base_url: doc.url.clone(),
            style: doc.style,
            ..Self::default()
        };
        let ctx = match &doc.fontfamily {
            Some(family) => ctx.with_font_family(family.clone()),
            None => ctx,
        };
        match doc.fontsize {
            Some(size) => ctx.with_font_size(size),
            None => ctx,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self.metrics = TextMetrics::for_font_size(size);
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_trunks(mut self, trunks: Vec<String>) -> Self {
        self.trunks = trunks;
        self
    }

    pub fn with_trunk_color(mut self, color: Rgb) -> Self {
        self.trunk_color = color;
        self
    }

    /// Fill and stroke colors of a lane.
    pub fn lane_colors(&self, name: &str) -> (Rgb, Rgb) {
        let fill = if self.trunks.iter().any(|t| t == name) {
            self.trunk_color
        } else {
            Rgb::from_name(name)
        };
        (fill, fill.darker(1.5))
    }

    pub fn changeset_url(&self, revision: Revision) -> String {
        format!("{}/changeset/{}", self.base_url, revision)
    }

    pub fn browser_url(&self, path: &str, revision: Revision) -> String {
        format!("{}/browser/{}?rev={}", self.base_url, path, revision)
    }
}
