#![forbid(unsafe_code)]

//! Presenter: state-tracked ANSI emission of buffer diffs.
//!
//! The presenter remembers the last colors and cursor position it emitted
//! and only writes sequences when they change. Each frame is wrapped in
//! synchronized output and flushed once.
//!
//! ```ignore
//! let mut presenter = Presenter::new(std::io::stdout());
//! let diff = BufferDiff::compute(&previous, &next);
//! presenter.present(&next, &diff)?;
//! std::mem::swap(&mut previous, &mut next);
//! ```

use std::io::{self, BufWriter, Write};

use danmaku_core::Rgba;

use crate::ansi;
use crate::buffer::Buffer;
use crate::cell::{Cell, CellContent};
use crate::diff::BufferDiff;

/// Size of the internal write buffer.
const BUFFER_CAPACITY: usize = 64 * 1024;

/// What one call to [`Presenter::present`] emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentStats {
    /// Cells written.
    pub cells: usize,
    /// Runs (cursor moves at most one per run).
    pub runs: usize,
}

/// Writes buffer diffs to a terminal.
pub struct Presenter<W: Write> {
    writer: BufWriter<W>,
    fg: Option<Rgba>,
    bg: Option<Rgba>,
    cursor: Option<(u16, u16)>,
    sync_output: bool,
}

impl<W: Write> Presenter<W> {
    /// Create a presenter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            fg: None,
            bg: None,
            cursor: None,
            sync_output: true,
        }
    }

    /// Enable or disable DEC 2026 synchronized output.
    #[must_use]
    pub fn with_sync_output(mut self, enabled: bool) -> Self {
        self.sync_output = enabled;
        self
    }

    /// Emit the cells of `buffer` listed in `diff`.
    pub fn present(&mut self, buffer: &Buffer, diff: &BufferDiff) -> io::Result<PresentStats> {
        let mut stats = PresentStats::default();
        if diff.is_empty() {
            return Ok(stats);
        }
        if self.sync_output {
            ansi::sync_begin(&mut self.writer)?;
        }
        for run in diff.runs() {
            stats.runs += 1;
            for x in run.x0..=run.x1 {
                let Some(cell) = buffer.get(x, run.y) else {
                    continue;
                };
                if cell.content.is_continuation() {
                    continue;
                }
                self.move_cursor_to(x, run.y)?;
                self.emit_cell(cell)?;
                stats.cells += 1;
                self.cursor = Some((x.saturating_add(cell.content.width() as u16), run.y));
            }
        }
        ansi::sgr_reset(&mut self.writer)?;
        self.fg = None;
        self.bg = None;
        if self.sync_output {
            ansi::sync_end(&mut self.writer)?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "danmaku.render",
            cells = stats.cells,
            runs = stats.runs,
            "frame presented"
        );

        self.writer.flush()?;
        Ok(stats)
    }

    fn move_cursor_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        if self.cursor == Some((x, y)) {
            return Ok(());
        }
        ansi::cup(&mut self.writer, y, x)?;
        self.cursor = Some((x, y));
        Ok(())
    }

    fn emit_cell(&mut self, cell: &Cell) -> io::Result<()> {
        if self.fg != Some(cell.fg) {
            ansi::sgr_fg(&mut self.writer, cell.fg)?;
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            ansi::sgr_bg(&mut self.writer, cell.bg)?;
            self.bg = Some(cell.bg);
        }
        match &cell.content {
            CellContent::Empty | CellContent::Continuation => self.writer.write_all(b" "),
            CellContent::Char(c) => {
                let mut utf8 = [0; 4];
                self.writer.write_all(c.encode_utf8(&mut utf8).as_bytes())
            }
            CellContent::Cluster(s) => self.writer.write_all(s.as_bytes()),
        }
    }

    /// Clear the screen and forget tracked state.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        ansi::sgr_reset(&mut self.writer)?;
        ansi::erase_display(&mut self.writer)?;
        ansi::cup(&mut self.writer, 0, 0)?;
        self.reset();
        self.cursor = Some((0, 0));
        self.writer.flush()
    }

    /// Hide the cursor.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_hide(&mut self.writer)?;
        self.writer.flush()
    }

    /// Show the cursor.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_show(&mut self.writer)?;
        self.writer.flush()
    }

    /// Forget tracked colors and cursor. Use after a resize or anything
    /// else that leaves terminal state unknown.
    pub fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
        self.cursor = None;
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W, io::Error> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(buffer: &Buffer, diff: &BufferDiff) -> (String, PresentStats) {
        let mut presenter = Presenter::new(Vec::new()).with_sync_output(false);
        let stats = presenter.present(buffer, diff).unwrap();
        let bytes = presenter.into_inner().unwrap();
        (String::from_utf8(bytes).unwrap(), stats)
    }

    #[test]
    fn empty_diff_writes_nothing() {
        let buf = Buffer::new(4, 1);
        let (out, stats) = output(&buf, &BufferDiff::new());
        assert!(out.is_empty());
        assert_eq!(stats, PresentStats::default());
    }

    #[test]
    fn one_cursor_move_per_run() {
        let old = Buffer::new(10, 2);
        let mut new = Buffer::new(10, 2);
        new.draw_text(1, 0, "ab", Rgba::WHITE);
        new.draw_text(5, 1, "c", Rgba::WHITE);
        let (out, stats) = output(&new, &BufferDiff::compute(&old, &new));
        assert_eq!(stats, PresentStats { cells: 3, runs: 2 });
        assert_eq!(out.matches('H').count(), 2);
        assert!(out.contains("\x1b[1;2H"));
        assert!(out.contains("\x1b[2;6H"));
        // Same colors for every cell: one fg and one bg sequence.
        assert_eq!(out.matches("\x1b[38;2;").count(), 1);
        assert!(out.ends_with("\x1b[0m"));
    }

    #[test]
    fn wide_grapheme_emitted_once() {
        let old = Buffer::new(4, 1);
        let mut new = Buffer::new(4, 1);
        new.draw_text(0, 0, "弾x", Rgba::WHITE);
        let (out, stats) = output(&new, &BufferDiff::compute(&old, &new));
        assert_eq!(stats.cells, 2);
        assert!(out.contains("弾x"));
        assert_eq!(out.matches('H').count(), 1);
    }

    #[test]
    fn sync_output_wraps_frame() {
        let old = Buffer::new(2, 1);
        let mut new = Buffer::new(2, 1);
        new.draw_text(0, 0, "a", Rgba::WHITE);
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&new, &BufferDiff::compute(&old, &new)).unwrap();
        let out = String::from_utf8(presenter.into_inner().unwrap()).unwrap();
        assert!(out.starts_with("\x1b[?2026h"));
        assert!(out.ends_with("\x1b[?2026l"));
    }
}
