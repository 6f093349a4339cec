#![forbid(unsafe_code)]

//! Terminal cells.
//!
//! A [`Cell`] holds one grapheme and its colors. Graphemes two columns wide
//! occupy a head cell followed by a [`CellContent::Continuation`] cell that
//! the presenter skips.

use danmaku_core::Rgba;
use unicode_width::UnicodeWidthStr;

/// What a cell displays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellContent {
    /// Blank.
    #[default]
    Empty,
    /// A single-codepoint grapheme.
    Char(char),
    /// A multi-codepoint grapheme cluster (emoji with modifiers, combining
    /// marks).
    Cluster(Box<str>),
    /// Right half of a wide grapheme in the cell to the left.
    Continuation,
}

impl CellContent {
    /// Content for one grapheme cluster.
    pub fn from_grapheme(grapheme: &str) -> Self {
        let mut chars = grapheme.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Self::Empty,
            (Some(c), None) => Self::Char(c),
            _ => Self::Cluster(grapheme.into()),
        }
    }

    /// Display columns this content takes, 0 for continuations.
    pub fn width(&self) -> usize {
        match self {
            Self::Empty => 1,
            Self::Char(c) => grapheme_width(c.encode_utf8(&mut [0; 4])).max(1),
            Self::Cluster(s) => grapheme_width(s).max(1),
            Self::Continuation => 0,
        }
    }

    /// Whether this is the tail of a wide grapheme.
    #[inline]
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::Continuation)
    }
}

/// Display width of a grapheme cluster in terminal columns, capped at 2.
pub fn grapheme_width(grapheme: &str) -> usize {
    grapheme.width().min(2)
}

/// One terminal cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// What is drawn.
    pub content: CellContent,
    /// Foreground color.
    pub fg: Rgba,
    /// Background color; transparent means the terminal default.
    pub bg: Rgba,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: CellContent::Empty,
            fg: Rgba::WHITE,
            bg: Rgba::TRANSPARENT,
        }
    }
}

impl Cell {
    /// A cell showing `c` with default colors.
    pub fn from_char(c: char) -> Self {
        Self {
            content: CellContent::Char(c),
            ..Self::default()
        }
    }

    /// Builder: set the foreground.
    #[must_use]
    pub fn with_fg(mut self, fg: Rgba) -> Self {
        self.fg = fg;
        self
    }

    /// Builder: set the background.
    #[must_use]
    pub fn with_bg(mut self, bg: Rgba) -> Self {
        self.bg = bg;
        self
    }

    /// Whether the cell shows nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content == CellContent::Empty
    }
}
