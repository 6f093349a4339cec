#![forbid(unsafe_code)]

//! Terminal surface: one pixel per cell.

use danmaku_core::Size;
use danmaku_runtime::{ActiveMessage, Surface};

use crate::buffer::Buffer;
use crate::sprite::TextSprite;

/// A region of the terminal that scrolling messages are drawn on.
#[derive(Debug, Clone)]
pub struct CellSurface {
    size: Option<(u16, u16)>,
    created: u64,
}

impl CellSurface {
    /// A live surface of `columns` x `rows` cells.
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            size: Some((columns, rows)),
            created: 0,
        }
    }

    /// Follow a terminal resize.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        if self.size.is_some() {
            self.size = Some((columns, rows));
        }
    }

    /// Mark the surface as gone; the scheduler halts on its next tick.
    pub fn detach(&mut self) {
        self.size = None;
    }

    /// Whether the surface is still attached.
    pub fn is_attached(&self) -> bool {
        self.size.is_some()
    }

    /// Sprites created on this surface.
    pub fn created(&self) -> u64 {
        self.created
    }
}

impl Surface for CellSurface {
    type Handle = TextSprite;

    fn size(&self) -> Option<Size> {
        self.size.map(Size::from)
    }

    fn create_handle(&mut self) -> TextSprite {
        self.created += 1;
        TextSprite::new()
    }
}

/// Paint every active message into `buffer`, oldest first so newer
/// messages win where they overlap.
pub fn compose(buffer: &mut Buffer, messages: &[ActiveMessage<TextSprite>]) -> usize {
    messages.iter().map(|m| m.handle().paint(buffer)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_runtime::RenderHandle;

    #[test]
    fn size_in_cells() {
        let mut surface = CellSurface::new(80, 24);
        assert_eq!(surface.size(), Some(Size::new(80.0, 24.0)));
        surface.resize(100, 30);
        assert_eq!(surface.size(), Some(Size::new(100.0, 30.0)));
        surface.detach();
        assert_eq!(surface.size(), None);
        surface.resize(10, 10);
        assert!(!surface.is_attached());
    }

    #[test]
    fn handles_start_hidden() {
        let mut surface = CellSurface::new(10, 2);
        let sprite = surface.create_handle();
        assert!(!sprite.is_active());
        assert_eq!(surface.created(), 1);
    }
}
