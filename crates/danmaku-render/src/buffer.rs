#![forbid(unsafe_code)]

//! Cell grid that sprites are composed into each frame.
//!
//! # Layout
//!
//! Cells are stored in row-major order: `index = y * width + x`.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. A wide grapheme's head is always followed by a continuation cell on the
//!    same row; neither is ever left behind alone.

use danmaku_core::Rgba;
use unicode_segmentation::UnicodeSegmentation;

use crate::cell::{Cell, CellContent, grapheme_width};

/// Color assumed behind transparent backgrounds when blending.
const BACKDROP: Rgba = Rgba::BLACK;

/// A 2D grid of terminal cells.
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Buffer {
    /// Create a blank buffer. Zero dimensions are raised to 1.
    pub fn new(width: u16, height: u16) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    /// Width in columns.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Total cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a buffer has at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Overwrite the cell at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.clear_with(Cell::default());
    }

    /// Reset every cell to `cell`.
    pub fn clear_with(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Change dimensions, clearing content.
    pub fn resize(&mut self, width: u16, height: u16) {
        let width = width.max(1);
        let height = height.max(1);
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(width as usize * height as usize, Cell::default());
    }

    /// All cells, row-major.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// One row of cells.
    pub fn row_cells(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Draw `text` starting at column `x` on row `y`, clipped to the grid.
    ///
    /// `x` may be negative or past the right edge; graphemes that do not fit
    /// entirely are skipped. The foreground is blended over the cell's
    /// background (or the backdrop where that is transparent). Fully
    /// transparent text draws nothing. Returns the number of columns written.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Rgba) -> usize {
        if fg.a() == 0 || y < 0 || y >= i32::from(self.height) {
            return 0;
        }
        let row = y as u16;
        let right = i32::from(self.width);
        let mut col = x;
        let mut written = 0;
        for grapheme in text.graphemes(true) {
            if col >= right {
                break;
            }
            let width = grapheme_width(grapheme);
            if width == 0 {
                continue;
            }
            let end = col + width as i32;
            if col >= 0 && end <= right {
                self.put_grapheme(col as u16, row, grapheme, width, fg);
                written += width;
            }
            col = end;
        }
        written
    }

    fn put_grapheme(&mut self, x: u16, y: u16, grapheme: &str, width: usize, fg: Rgba) {
        self.break_wide_at(x, y);
        if width == 2 {
            self.break_wide_at(x + 1, y);
        }
        let bg = self.get(x, y).map_or(Rgba::TRANSPARENT, |c| c.bg);
        let base = if bg.a() == 0 { BACKDROP } else { bg };
        let cell = Cell {
            content: CellContent::from_grapheme(grapheme),
            fg: fg.over(base),
            bg,
        };
        self.set(x, y, cell);
        if width == 2 {
            let tail_bg = self.get(x + 1, y).map_or(Rgba::TRANSPARENT, |c| c.bg);
            self.set(
                x + 1,
                y,
                Cell {
                    content: CellContent::Continuation,
                    fg: Rgba::TRANSPARENT,
                    bg: tail_bg,
                },
            );
        }
    }

    /// Blank out any wide grapheme that covers `(x, y)` so overwriting one of
    /// its halves never leaves the other dangling.
    fn break_wide_at(&mut self, x: u16, y: u16) {
        let Some((continuation, wide)) = self
            .get(x, y)
            .map(|c| (c.content.is_continuation(), c.content.width() == 2))
        else {
            return;
        };
        if continuation {
            if x > 0 {
                self.blank(x - 1, y);
            }
            self.blank(x, y);
        } else if wide {
            self.blank(x, y);
            self.blank(x + 1, y);
        }
    }

    fn blank(&mut self, x: u16, y: u16) {
        if let Some(i) = self.index(x, y) {
            let bg = self.cells[i].bg;
            self.cells[i] = Cell::default().with_bg(bg);
        }
    }

    /// Text content of row `y`, blanks as spaces, continuations omitted.
    pub fn row_text(&self, y: u16) -> String {
        let mut out = String::new();
        for cell in self.row_cells(y) {
            match &cell.content {
                CellContent::Empty => out.push(' '),
                CellContent::Char(c) => out.push(*c),
                CellContent::Cluster(s) => out.push_str(s),
                CellContent::Continuation => {}
            }
        }
        out
    }

    /// Whether both buffers have the same size and cells.
    pub fn content_eq(&self, other: &Buffer) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}
