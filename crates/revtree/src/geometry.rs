//! Points, extents, and compass anchors.

/// Layout unit: the base spacing every other dimension derives from.
pub const UNIT: f64 = 25.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Compass anchor on a node's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Anchor {
    /// Unit direction from the node center toward this anchor.
    pub fn direction(self) -> (f64, f64) {
        let d = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            Anchor::Center => (0.0, 0.0),
            Anchor::N => (0.0, -1.0),
            Anchor::S => (0.0, 1.0),
            Anchor::E => (1.0, 0.0),
            Anchor::W => (-1.0, 0.0),
            Anchor::NE => (d, -d),
            Anchor::NW => (-d, -d),
            Anchor::SE => (d, d),
            Anchor::SW => (-d, d),
        }
    }
}
