//! Scene emission: the narrow element-writer contract the layout engine
//! draws through, render layers, and arrow markers.

use std::collections::HashMap;
#[cfg(test)]
use std::collections::BTreeMap;

/// Receiver of a vector scene, one call at a time.
///
/// The engine only ever nests `start_element`/`end_element` pairs, sets
/// attributes on the most recently started element before any child or
/// text, and writes text into leaf elements.
pub trait SceneWriter {
    fn start_element(&mut self, name: &str);
    fn attribute(&mut self, key: &str, value: &str);
    fn text(&mut self, text: &str);
    fn end_element(&mut self);

    /// Set a numeric attribute.
    fn number(&mut self, key: &str, value: f64) {
        self.attribute(key, &value.to_string());
    }
}

/// One recorded [`SceneWriter`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Start(String),
    Attribute(String, String),
    Text(String),
    End,
}

impl SceneWriter for Vec<SceneEvent> {
    fn start_element(&mut self, name: &str) {
        self.push(SceneEvent::Start(name.to_string()));
    }

    fn attribute(&mut self, key: &str, value: &str) {
        self.push(SceneEvent::Attribute(key.to_string(), value.to_string()));
    }

    fn text(&mut self, text: &str) {
        self.push(SceneEvent::Text(text.to_string()));
    }

    fn end_element(&mut self) {
        self.push(SceneEvent::End);
    }
}

/// Forward recorded calls to another writer.
pub fn replay(events: &[SceneEvent], out: &mut dyn SceneWriter) {
    for event in events {
        match event {
            SceneEvent::Start(name) => out.start_element(name),
            SceneEvent::Attribute(key, value) => out.attribute(key, value),
            SceneEvent::Text(text) => out.text(text),
            SceneEvent::End => out.end_element(),
        }
    }
}

/// Attributes of every element named `name`, in emission order.
#[cfg(test)]
pub(crate) fn elements(events: &[SceneEvent], name: &str) -> Vec<BTreeMap<String, String>> {
    let mut found = Vec::new();
    let mut current: Option<BTreeMap<String, String>> = None;
    for event in events {
        match event {
            SceneEvent::Attribute(key, value) => {
                if let Some(attrs) = current.as_mut() {
                    attrs.insert(key.clone(), value.clone());
                }
            }
            other => {
                if let Some(attrs) = current.take() {
                    found.push(attrs);
                }
                if let SceneEvent::Start(n) = other
                    && n == name
                {
                    current = Some(BTreeMap::new());
                }
            }
        }
    }
    if let Some(attrs) = current {
        found.push(attrs);
    }
    found
}

/// Render layers, in painting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Bring/deliver range backgrounds.
    Backgrounds,
    /// Cross-lane action curves and lane headers.
    Edges,
    /// Changeset nodes, tags, and intra-lane connectors.
    Nodes,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Backgrounds, Layer::Edges, Layer::Nodes];
}

/// Which end of a path an arrow marker decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowEnd {
    /// `marker-start`, pointing back toward the path origin.
    Head,
    /// `marker-end`, pointing along the path.
    Tail,
}

/// Marker cache key. Two keys are equal when both the end and the exact
/// color string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrowKey {
    pub end: ArrowEnd,
    pub color: String,
}

impl ArrowKey {
    pub fn new(end: ArrowEnd, color: impl Into<String>) -> Self {
        Self {
            end,
            color: color.into(),
        }
    }

    /// Element id of the marker, e.g. `arrow_tail_gray`.
    pub fn marker_id(&self) -> String {
        let end = match self.end {
            ArrowEnd::Head => "head",
            ArrowEnd::Tail => "tail",
        };
        let color: String = self
            .color
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("arrow_{}_{}", end, color)
    }

    fn write(&self, out: &mut dyn SceneWriter) {
        let (ref_x, d) = match self.end {
            ArrowEnd::Tail => (7.0, "M0,0 L6,3 L0,6 L0,0"),
            ArrowEnd::Head => (-1.0, "M6,6 L0,3 L6,0 L6,6"),
        };
        out.start_element("marker");
        out.attribute("id", &self.marker_id());
        out.number("refX", ref_x);
        out.number("refY", 3.0);
        out.number("markerWidth", 4.6);
        out.number("markerHeight", 5.6);
        out.attribute("orient", "auto");
        out.attribute("stroke", &self.color);
        out.attribute("fill", &self.color);
        out.attribute("viewBox", "0 0 6 6");
        out.start_element("path");
        out.attribute("d", d);
        out.end_element();
        out.end_element();
    }
}

/// Memoized arrow markers for one render pass.
#[derive(Debug, Default)]
pub struct ArrowCache {
    refs: HashMap<ArrowKey, String>,
    order: Vec<ArrowKey>,
}

impl ArrowCache {
    /// The `url(#...)` reference for a marker, defining it on first use.
    pub fn get(&mut self, end: ArrowEnd, color: &str) -> String {
        let key = ArrowKey::new(end, color);
        if let Some(r) = self.refs.get(&key) {
            return r.clone();
        }
        let r = format!("url(#{})", key.marker_id());
        self.refs.insert(key.clone(), r.clone());
        self.order.push(key);
        r
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.refs.clear();
        self.order.clear();
    }

    /// Emit the marker definitions, in first-use order.
    pub fn write_definitions(&self, out: &mut dyn SceneWriter) {
        for key in &self.order {
            key.write(out);
        }
    }
}

/// Builder for SVG path data.
#[derive(Debug, Default)]
pub(crate) struct PathData {
    d: Vec<String>,
}

impl PathData {
    pub(crate) fn move_to(&mut self, x: f64, y: f64) {
        self.d.push(format!("M {} {}", x, y));
    }

    pub(crate) fn line_to(&mut self, x: f64, y: f64) {
        self.d.push(format!("L {} {}", x, y));
    }

    pub(crate) fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.d.push(format!("Q {},{} {},{}", cx, cy, x, y));
    }

    pub(crate) fn finish(self) -> String {
        self.d.join(" ")
    }
}
