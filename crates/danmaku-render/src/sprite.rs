#![forbid(unsafe_code)]

//! Text sprite: the terminal render handle.

use danmaku_core::{Point, Rgba, Size};
use danmaku_runtime::RenderHandle;
use unicode_segmentation::UnicodeSegmentation;

use crate::buffer::Buffer;
use crate::cell::grapheme_width;

/// One line of text positioned in cell coordinates.
///
/// Width is measured in display columns over grapheme clusters; height is
/// always one row.
#[derive(Debug, Clone, Default)]
pub struct TextSprite {
    text: String,
    columns: usize,
    color: Rgba,
    position: Point,
    active: bool,
}

impl TextSprite {
    /// A blank, hidden sprite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display width of the text in columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Current color, alpha included.
    #[inline]
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Current top-left position.
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Draw into `buffer` if active. Returns columns written.
    pub fn paint(&self, buffer: &mut Buffer) -> usize {
        if !self.active || !self.position.x.is_finite() || !self.position.y.is_finite() {
            return 0;
        }
        let x = self.position.x.floor() as i32;
        let y = self.position.y.floor() as i32;
        buffer.draw_text(x, y, &self.text, self.color)
    }
}

impl RenderHandle for TextSprite {
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.columns = text.graphemes(true).map(grapheme_width).sum();
    }

    fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn measure(&self) -> Size {
        Size::new(self.columns as f32, 1.0)
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
