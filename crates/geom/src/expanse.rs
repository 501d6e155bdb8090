use serde::{Deserialize, Serialize};

use super::{Point, Rect};
use crate::clamp_extent;

/// An `Expanse` is a rectangle that has a width and height but no location.
/// Both dimensions are always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Expanse {
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Expanse {
    /// Construct an expanse, clamping degenerate dimensions to zero.
    pub fn new(w: f32, h: f32) -> Self {
        Self {
            w: clamp_extent(w),
            h: clamp_extent(h),
        }
    }

    /// The zero expanse.
    pub fn zero() -> Self {
        Self { w: 0.0, h: 0.0 }
    }

    /// The area of this expanse.
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Return a `Rect` with the same dimensions as the `Expanse`, but a location at (0, 0).
    pub fn rect(&self) -> Rect {
        Rect {
            tl: Point::zero(),
            w: self.w,
            h: self.h,
        }
    }

    /// True if this expanse can completely enclose the target in both dimensions.
    pub fn contains(&self, other: &Self) -> bool {
        self.w >= other.w && self.h >= other.h
    }
}

impl From<Rect> for Expanse {
    fn from(r: Rect) -> Self {
        Self { w: r.w, h: r.h }
    }
}

impl From<(f32, f32)> for Expanse {
    fn from(v: (f32, f32)) -> Self {
        Self::new(v.0, v.1)
    }
}

/// A size in whole pixels, used for render targets.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpanseI32 {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl ExpanseI32 {
    /// Construct a pixel size. Negative dimensions become zero.
    pub fn new(w: i32, h: i32) -> Self {
        Self {
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// Round a view-space expanse up to whole pixels.
    pub fn ceil(e: Expanse) -> Self {
        Self::new(e.w.ceil() as i32, e.h.ceil() as i32)
    }

    /// Number of pixels covered.
    pub fn area(&self) -> i64 {
        i64::from(self.w) * i64::from(self.h)
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl From<(i32, i32)> for ExpanseI32 {
    fn from(v: (i32, i32)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<ExpanseI32> for Expanse {
    fn from(e: ExpanseI32) -> Self {
        Self::new(e.w as f32, e.h as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_degenerate() {
        assert_eq!(Expanse::new(-3.0, f32::NAN), Expanse::zero());
        assert!(Expanse::new(0.0, 10.0).is_empty());
        assert_eq!(ExpanseI32::new(-1, 4), ExpanseI32::new(0, 4));
    }

    #[test]
    fn ceil_rounds_up() {
        assert_eq!(
            ExpanseI32::ceil(Expanse::new(10.2, 3.0)),
            ExpanseI32::new(11, 3)
        );
        assert_eq!(ExpanseI32::ceil(Expanse::zero()), ExpanseI32::new(0, 0));
    }

    #[test]
    fn contains() {
        let big = Expanse::new(10.0, 10.0);
        assert!(big.contains(&Expanse::new(10.0, 2.0)));
        assert!(!big.contains(&Expanse::new(10.5, 2.0)));
    }
}
