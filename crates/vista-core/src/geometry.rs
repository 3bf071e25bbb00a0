#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All lengths are logical pixels stored as `f32`. Host environments hand
//! the renderer raw measurements which may be zero, negative, or NaN before
//! the first real layout pass; [`sanitize`] folds all of those to `0.0` so
//! the downstream arithmetic never sees them.

/// Fold non-finite and negative lengths to zero.
#[inline]
#[must_use]
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// A zero-sized value.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and strictly positive.
    #[inline]
    #[must_use]
    pub fn is_measured(&self) -> bool {
        sanitize(self.width) > 0.0 && sanitize(self.height) > 0.0
    }

    /// Copy with both dimensions passed through [`sanitize`].
    #[inline]
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self::new(sanitize(self.width), sanitize(self.height))
    }
}

/// Scroll position plus the container's measured size.
///
/// Owned by the host and only ever replaced wholesale through events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    /// Distance scrolled from the top of the content.
    pub scroll_offset: f32,
    /// Container width.
    pub width: f32,
    /// Container height.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport.
    #[inline]
    pub const fn new(scroll_offset: f32, width: f32, height: f32) -> Self {
        Self {
            scroll_offset,
            width,
            height,
        }
    }

    /// Container size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// False until the host has reported a positive width and height.
    #[inline]
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.size().is_measured()
    }

    /// Copy with a new container size, keeping the scroll offset.
    #[inline]
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.width = size.width;
        self.height = size.height;
        self
    }

    /// Copy with a new scroll offset.
    #[inline]
    #[must_use]
    pub fn with_scroll_offset(mut self, offset: f32) -> Self {
        self.scroll_offset = offset;
        self
    }
}

/// Absolute placement of one render slot inside the scrollable content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotRect {
    /// Left edge.
    pub x: f32,
    /// Top edge, measured from the start of the content (not the viewport).
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl SlotRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the point lies inside the rectangle (right/bottom exclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Translate into viewport coordinates for a given scroll offset.
    #[inline]
    #[must_use]
    pub fn relative_to(&self, scroll_offset: f32) -> Self {
        Self::new(self.x, self.y - sanitize(scroll_offset), self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_folds_garbage() {
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), 0.0);
        assert_eq!(sanitize(-3.0), 0.0);
        assert_eq!(sanitize(12.5), 12.5);
    }

    #[test]
    fn viewport_measured_requires_both_dimensions() {
        assert!(!Viewport::new(0.0, 0.0, 600.0).is_measured());
        assert!(!Viewport::new(0.0, 800.0, -1.0).is_measured());
        assert!(!Viewport::new(0.0, f32::NAN, 600.0).is_measured());
        assert!(Viewport::new(0.0, 800.0, 600.0).is_measured());
    }

    #[test]
    fn slot_rect_contains_is_half_open() {
        let r = SlotRect::new(10.0, 20.0, 5.0, 5.0);
        assert!(r.contains(10.0, 20.0));
        assert!(r.contains(14.9, 24.9));
        assert!(!r.contains(15.0, 20.0));
        assert!(!r.contains(10.0, 25.0));
    }

    #[test]
    fn relative_to_shifts_only_vertically() {
        let r = SlotRect::new(0.0, 300.0, 100.0, 100.0).relative_to(250.0);
        assert_eq!(r, SlotRect::new(0.0, 50.0, 100.0, 100.0));
    }
}
