#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Surface coordinates are in abstract pixels with the origin at the
//! top-left corner, x growing rightward and y growing downward. A terminal
//! binding treats one pixel as one cell.

/// A position on the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal offset from the left edge.
    pub x: f32,
    /// Vertical offset from the top edge.
    pub y: f32,
}

impl Point {
    /// The surface origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The same point shifted horizontally by `dx`.
    #[inline]
    #[must_use]
    pub fn offset_x(self, dx: f32) -> Self {
        Self::new(self.x + dx, self.y)
    }
}

/// Width and height of a surface or a measured piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// A zero-area size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero, negative, or not a number.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Replace non-finite or negative dimensions with zero.
    ///
    /// Measurements come from external collaborators; downstream arithmetic
    /// relies on finite, non-negative extents.
    #[must_use]
    pub fn sanitized(self) -> Self {
        fn fix(v: f32) -> f32 {
            if v.is_finite() && v > 0.0 { v } else { 0.0 }
        }
        Self::new(fix(self.width), fix(self.height))
    }
}

impl From<(u16, u16)> for Size {
    fn from((width, height): (u16, u16)) -> Self {
        Self::new(f32::from(width), f32::from(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_x_moves_only_horizontally() {
        let p = Point::new(10.0, 4.0).offset_x(-2.5);
        assert_eq!(p, Point::new(7.5, 4.0));
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(10.0, 0.0).is_empty());
        assert!(Size::new(f32::NAN, 3.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn sanitized_drops_garbage() {
        let s = Size::new(f32::INFINITY, -3.0).sanitized();
        assert_eq!(s, Size::ZERO);
        let s = Size::new(12.0, f32::NAN).sanitized();
        assert_eq!(s, Size::new(12.0, 0.0));
    }

    #[test]
    fn from_cell_dimensions() {
        assert_eq!(Size::from((80u16, 24u16)), Size::new(80.0, 24.0));
    }
}
