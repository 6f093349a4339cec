#![forbid(unsafe_code)]

//! Terminal binding for the danmaku scheduler.
//!
//! [`CellSurface`] and [`TextSprite`] implement the scheduler's host seam
//! with one pixel per terminal cell. After each tick, [`compose`] paints the
//! active messages into a [`Buffer`], [`BufferDiff`] finds what changed
//! since the previous frame, and a [`Presenter`] writes only those cells.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod diff;
pub mod presenter;
pub mod sprite;
pub mod surface;

pub use buffer::Buffer;
pub use cell::{Cell, CellContent};
pub use diff::{BufferDiff, ChangeRun};
pub use presenter::{PresentStats, Presenter};
pub use sprite::TextSprite;
pub use surface::{CellSurface, compose};
