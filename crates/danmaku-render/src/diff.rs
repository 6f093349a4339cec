#![forbid(unsafe_code)]

//! Changed cells between two frames.
//!
//! Scrolling text shifts left by a column or so per frame, so most of the
//! screen is unchanged between frames. The diff records changed positions
//! in row-major order and coalesces them into runs, one cursor move each.

use crate::buffer::Buffer;

/// A contiguous run of changed cells on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    /// Row index.
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// End column (inclusive).
    pub x1: u16,
}

impl ChangeRun {
    /// Create a run.
    #[inline]
    pub const fn new(y: u16, x0: u16, x1: u16) -> Self {
        Self { y, x0, x1 }
    }

    /// Number of cells in the run.
    #[inline]
    pub const fn len(&self) -> u16 {
        self.x1 - self.x0 + 1
    }

    /// Never true; a run holds at least one cell.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Positions where two buffers differ.
#[derive(Debug, Clone, Default)]
pub struct BufferDiff {
    changes: Vec<(u16, u16)>,
}

impl BufferDiff {
    /// An empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cell of `buffer`, for a full redraw.
    pub fn full(buffer: &Buffer) -> Self {
        let mut changes = Vec::with_capacity(buffer.len());
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                changes.push((x, y));
            }
        }
        Self { changes }
    }

    /// Compare two buffers of the same size. A size mismatch yields a full
    /// diff of `new`.
    pub fn compute(old: &Buffer, new: &Buffer) -> Self {
        if old.width() != new.width() || old.height() != new.height() {
            return Self::full(new);
        }
        let changes: Vec<(u16, u16)> = old
            .cells()
            .iter()
            .zip(new.cells())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| {
                let width = new.width() as usize;
                ((i % width) as u16, (i / width) as u16)
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::trace!(target: "danmaku.render", changes = changes.len(), "diff computed");

        Self { changes }
    }

    /// Number of changed cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether nothing changed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changed positions as `(x, y)`, row-major.
    #[inline]
    pub fn changes(&self) -> &[(u16, u16)] {
        &self.changes
    }

    /// Coalesce changes into per-row runs.
    pub fn runs(&self) -> Vec<ChangeRun> {
        let mut runs: Vec<ChangeRun> = Vec::new();
        for &(x, y) in &self.changes {
            match runs.last_mut() {
                Some(run) if run.y == y && run.x1 + 1 == x => run.x1 = x,
                _ => runs.push(ChangeRun::new(y, x, x)),
            }
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_core::Rgba;

    #[test]
    fn identical_buffers_have_no_diff() {
        let a = Buffer::new(8, 3);
        let b = Buffer::new(8, 3);
        assert!(BufferDiff::compute(&a, &b).is_empty());
    }

    #[test]
    fn adjacent_changes_form_one_run() {
        let old = Buffer::new(10, 3);
        let mut new = Buffer::new(10, 3);
        new.draw_text(2, 1, "abc", Rgba::WHITE);
        new.draw_text(7, 1, "z", Rgba::WHITE);
        new.draw_text(0, 2, "q", Rgba::WHITE);
        let diff = BufferDiff::compute(&old, &new);
        assert_eq!(diff.len(), 5);
        assert_eq!(
            diff.runs(),
            vec![
                ChangeRun::new(1, 2, 4),
                ChangeRun::new(1, 7, 7),
                ChangeRun::new(2, 0, 0),
            ]
        );
        assert_eq!(diff.runs()[0].len(), 3);
    }

    #[test]
    fn runs_do_not_wrap_rows() {
        let old = Buffer::new(3, 2);
        let mut new = Buffer::new(3, 2);
        new.draw_text(2, 0, "a", Rgba::WHITE);
        new.draw_text(0, 1, "b", Rgba::WHITE);
        assert_eq!(BufferDiff::compute(&old, &new).runs().len(), 2);
    }

    #[test]
    fn size_mismatch_is_full_redraw() {
        let old = Buffer::new(2, 2);
        let new = Buffer::new(3, 2);
        let diff = BufferDiff::compute(&old, &new);
        assert_eq!(diff.len(), 6);
        assert_eq!(diff.runs(), vec![ChangeRun::new(0, 0, 2), ChangeRun::new(1, 0, 2)]);
    }
}
