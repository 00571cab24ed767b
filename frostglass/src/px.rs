//! Physical pixel geometry used by the blur effect.
//!
//! Render targets, source regions and presentation rectangles are all
//! expressed in physical pixels. Screen-space geometry reported by the host
//! is fractional; [`PxRect::enclosing`] snaps it outward to whole pixels.
//!
//! # Coordinate System
//!
//! - Origin (0, 0) at the top-left corner
//! - X-axis increases to the right
//! - Y-axis increases downward
//! - Negative coordinates are allowed for off-screen positioning

/// A physical pixel coordinate value.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Px(pub i32);

impl Px {
    /// A constant representing zero pixels.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Px` instance from an i32 value.
    pub const fn new(value: i32) -> Self {
        Px(value)
    }

    /// Returns the raw i32 value.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Returns only the positive value, or zero if negative.
    ///
    /// ```
    /// use frostglass::px::Px;
    ///
    /// assert_eq!(Px::new(10).positive(), 10);
    /// assert_eq!(Px::new(-5).positive(), 0);
    /// ```
    pub fn positive(self) -> u32 {
        if self.0 < 0 { 0 } else { self.0 as u32 }
    }

    /// Converts the pixel value to f32.
    pub fn to_f32(self) -> f32 {
        self.0 as f32
    }

    /// Creates a `Px` from an f32 value, saturating at the numeric bounds
    /// instead of overflowing. NaN maps to zero.
    ///
    /// ```
    /// use frostglass::px::Px;
    ///
    /// assert_eq!(Px::saturating_from_f32(42.7).raw(), 42);
    /// assert_eq!(Px::saturating_from_f32(f32::MAX).raw(), i32::MAX);
    /// ```
    pub fn saturating_from_f32(value: f32) -> Self {
        let clamped_value = value.clamp(i32::MIN as f32, i32::MAX as f32);
        Px(clamped_value as i32)
    }

    /// Saturating integer addition.
    pub fn saturating_add(self, rhs: Self) -> Self {
        Px(self.0.saturating_add(rhs.0))
    }
}

impl From<u32> for Px {
    fn from(value: u32) -> Self {
        Px(value.min(i32::MAX as u32) as i32)
    }
}

/// A 2D position in physical pixel space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PxPosition {
    /// The x-coordinate in physical pixels
    pub x: Px,
    /// The y-coordinate in physical pixels
    pub y: Px,
}

impl PxPosition {
    /// A constant representing the zero position (0, 0).
    pub const ZERO: Self = Self { x: Px(0), y: Px(0) };

    /// Creates a new position from x and y coordinates.
    pub const fn new(x: Px, y: Px) -> Self {
        Self { x, y }
    }

    /// Converts the position to a 2D f32 array.
    pub fn to_f32_arr2(self) -> [f32; 2] {
        [self.x.to_f32(), self.y.to_f32()]
    }
}

/// A 2D size in physical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PxSize {
    /// The width in physical pixels
    pub width: Px,
    /// The height in physical pixels
    pub height: Px,
}

impl PxSize {
    /// Creates a new size from width and height.
    pub const fn new(width: Px, height: Px) -> Self {
        Self { width, height }
    }

    /// Creates a size from unsigned dimensions.
    pub fn from_u32(width: u32, height: u32) -> Self {
        Self::new(Px::from(width), Px::from(height))
    }

    /// Returns `true` when either dimension is zero or negative.
    pub fn is_empty(self) -> bool {
        self.width.0 <= 0 || self.height.0 <= 0
    }

    /// Divides both dimensions by `factor`, rounding down.
    ///
    /// ```
    /// use frostglass::px::PxSize;
    ///
    /// assert_eq!(PxSize::from_u32(1025, 769).div_floor(2), PxSize::from_u32(512, 384));
    /// ```
    pub fn div_floor(self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self::from_u32(self.width.positive() / factor, self.height.positive() / factor)
    }

    /// Converts the size to a 2D f32 array.
    pub fn to_f32_arr2(self) -> [f32; 2] {
        [self.width.to_f32(), self.height.to_f32()]
    }
}

/// A 2D rectangle in physical pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PxRect {
    /// The x-coordinate of the top-left corner
    pub x: Px,
    /// The y-coordinate of the top-left corner
    pub y: Px,
    /// The width of the rectangle
    pub width: Px,
    /// The height of the rectangle
    pub height: Px,
}

impl PxRect {
    /// Creates a new rectangle from position and size.
    pub const fn new(x: Px, y: Px, width: Px, height: Px) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a new rectangle from a position and size.
    pub fn from_position_size(position: PxPosition, size: PxSize) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Smallest whole-pixel rectangle that covers the fractional box
    /// `position .. position + size`.
    ///
    /// ```
    /// use frostglass::px::{Px, PxRect};
    ///
    /// let rect = PxRect::enclosing([10.4, 20.6], [100.2, 50.0]);
    /// assert_eq!(rect, PxRect::new(Px(10), Px(20), Px(101), Px(51)));
    /// ```
    pub fn enclosing(position: [f32; 2], size: [f32; 2]) -> Self {
        let left = position[0].floor();
        let top = position[1].floor();
        let right = (position[0] + size[0].max(0.0)).ceil();
        let bottom = (position[1] + size[1].max(0.0)).ceil();
        let x = Px::saturating_from_f32(left);
        let y = Px::saturating_from_f32(top);
        Self {
            x,
            y,
            width: Px::saturating_from_f32(right - left),
            height: Px::saturating_from_f32(bottom - top),
        }
    }

    /// Returns the top-left corner.
    pub fn position(&self) -> PxPosition {
        PxPosition::new(self.x, self.y)
    }

    /// Returns the size of the rectangle.
    pub fn size(&self) -> PxSize {
        PxSize::new(self.width, self.height)
    }

    /// Returns `true` when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Gets the intersection of this rectangle with another rectangle.
    ///
    /// If the rectangles do not intersect, returns `None`.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x1 = self.x.0.max(other.x.0);
        let y1 = self.y.0.max(other.y.0);
        let x2 = (self.x.0.saturating_add(self.width.0))
            .min(other.x.0.saturating_add(other.width.0));
        let y2 = (self.y.0.saturating_add(self.height.0))
            .min(other.y.0.saturating_add(other.height.0));

        if x1 < x2 && y1 < y2 {
            Some(Self {
                x: Px(x1),
                y: Px(y1),
                width: Px(x2 - x1),
                height: Px(y2 - y1),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_saturating_from_f32() {
        assert_eq!(Px::saturating_from_f32(f32::MAX), Px(i32::MAX));
        assert_eq!(Px::saturating_from_f32(f32::MIN), Px(i32::MIN));
        assert_eq!(Px::saturating_from_f32(100.5), Px(100));
        assert_eq!(Px::saturating_from_f32(-100.5), Px(-100));
    }

    #[test]
    fn test_size_div_floor() {
        let size = PxSize::from_u32(1024, 768);
        assert_eq!(size.div_floor(1), size);
        assert_eq!(size.div_floor(4), PxSize::from_u32(256, 192));
        assert_eq!(PxSize::from_u32(3, 3).div_floor(2), PxSize::from_u32(1, 1));
        assert_eq!(size.div_floor(0), size);
    }

    #[test]
    fn test_enclosing_snaps_outward() {
        let rect = PxRect::enclosing([-0.5, 0.25], [10.0, 10.0]);
        assert_eq!(rect, PxRect::new(Px(-1), Px(0), Px(11), Px(11)));

        let exact = PxRect::enclosing([4.0, 8.0], [16.0, 32.0]);
        assert_eq!(exact, PxRect::new(Px(4), Px(8), Px(16), Px(32)));
    }

    #[test]
    fn test_enclosing_negative_size_is_empty() {
        let rect = PxRect::enclosing([4.0, 4.0], [-3.0, 2.0]);
        assert!(rect.is_empty());
    }

    #[test]
    fn test_intersection() {
        let frame = PxRect::new(Px(0), Px(0), Px(100), Px(100));
        let region = PxRect::new(Px(-20), Px(90), Px(50), Px(50));
        assert_eq!(
            frame.intersection(&region),
            Some(PxRect::new(Px(0), Px(90), Px(30), Px(10)))
        );

        let outside = PxRect::new(Px(200), Px(0), Px(10), Px(10));
        assert_eq!(frame.intersection(&outside), None);
    }
}
