use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::finite_or_zero;

/// A location in view space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate, increasing to the right.
    pub x: f32,
    /// Y coordinate, increasing downwards.
    pub y: f32,
}

impl Point {
    /// Construct a point. Non-finite coordinates become zero.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: finite_or_zero(x),
            y: finite_or_zero(y),
        }
    }

    /// The origin.
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl From<(f32, f32)> for Point {
    #[inline]
    fn from(v: (f32, f32)) -> Self {
        Self::new(v.0, v.1)
    }
}

/// A signed location in pixel space.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointI32 {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl PointI32 {
    /// Construct a new signed point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return the origin point.
    pub fn zero() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl Add for PointI32 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x.saturating_add(other.x),
            y: self.y.saturating_add(other.y),
        }
    }
}

impl From<(i32, i32)> for PointI32 {
    #[inline]
    fn from(v: (i32, i32)) -> Self {
        Self { x: v.0, y: v.1 }
    }
}

impl From<PointI32> for Point {
    fn from(p: PointI32) -> Self {
        Self {
            x: p.x as f32,
            y: p.y as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 5.0);
        assert_eq!(a + b, Point::new(4.0, 7.0));
        assert_eq!(b - a, Point::new(2.0, 3.0));
        assert_eq!(Point::new(f32::NAN, 1.0), Point::new(0.0, 1.0));
    }

    #[test]
    fn signed_add_saturates() {
        let p = PointI32::new(i32::MAX, 0) + PointI32::new(1, 1);
        assert_eq!(p, PointI32::new(i32::MAX, 1));
    }
}
