#![forbid(unsafe_code)]

//! Host seam: the display surface and the text elements drawn on it.
//!
//! The scheduler knows nothing about fonts, pixels on a GPU, or terminal
//! cells. It asks a [`Surface`] how big it is and for fresh
//! [`RenderHandle`]s, then positions those handles. A host renders by walking
//! [`Scheduler::active_messages`](crate::Scheduler::active_messages) after
//! each tick.

use danmaku_core::{Point, Rgba, Size};

/// One on-screen text element.
///
/// Handles are plain owned values: the pool holds idle ones and each active
/// message holds exactly one, so a handle can never be shared between two
/// messages.
pub trait RenderHandle {
    /// Replace the displayed text.
    fn set_text(&mut self, text: &str);

    /// Replace the text color.
    fn set_color(&mut self, color: Rgba);

    /// Move the element's top-left corner.
    fn set_position(&mut self, position: Point);

    /// Extent of the current text under the current style.
    fn measure(&self) -> Size;

    /// Show or hide the element.
    fn set_active(&mut self, active: bool);

    /// Whether the element is currently shown.
    fn is_active(&self) -> bool;
}

/// A fixed-size 2D display surface owned by the host.
pub trait Surface {
    /// Handle type this surface hands out.
    type Handle: RenderHandle;

    /// Current drawable size, or `None` once the host has torn the surface
    /// down.
    fn size(&self) -> Option<Size>;

    /// Allocate a new, inactive handle bound to this surface.
    fn create_handle(&mut self) -> Self::Handle;
}
