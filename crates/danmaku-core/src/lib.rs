#![forbid(unsafe_code)]

//! Core: geometry, colors, the frame clock, and fade animation.
//!
//! Everything here is host-agnostic plain data. The scheduling engine in
//! `danmaku-runtime` builds on these types, and rendering bindings such as
//! `danmaku-render` translate them to a concrete surface.

pub mod animation;
pub mod clock;
pub mod color;
pub mod geometry;

pub use clock::{Deadline, FrameClock};
pub use color::Rgba;
pub use geometry::{Point, Size};
