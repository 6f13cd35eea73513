//! Text measurement used to size revision labels, tags, and lane headers.

/// Fixed-advance text metrics derived from a font size.
///
/// Every glyph is assumed to be `char_width` wide, which is close enough
/// for revision numbers and branch names and keeps layout deterministic
/// without access to real font data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub char_width: f64,
    pub char_height: f64,
}

impl TextMetrics {
    pub const DEFAULT_FONT_SIZE: f64 = 14.0;

    const CHAR_WIDTH_FACTOR: f64 = 0.6;
    const LINE_HEIGHT_FACTOR: f64 = 1.2;

    pub fn for_font_size(font_size: f64) -> Self {
        let font_size = font_size.max(1.0);
        Self {
            char_width: font_size * Self::CHAR_WIDTH_FACTOR,
            char_height: font_size * Self::LINE_HEIGHT_FACTOR,
        }
    }

    pub fn text_width(&self, text: &str) -> f64 {
        self.char_width * text.chars().count() as f64
    }

    pub fn text_height(&self) -> f64 {
        self.char_height
    }
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self::for_font_size(Self::DEFAULT_FONT_SIZE)
    }
}
