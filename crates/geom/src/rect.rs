use serde::{Deserialize, Serialize};

use super::{Expanse, Insets, Point};
use crate::clamp_extent;

/// A rectangle in view space, defined by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub tl: Point,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Construct a rect. Degenerate extents clamp to zero.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            tl: Point::new(x, y),
            w: clamp_extent(w),
            h: clamp_extent(h),
        }
    }

    /// A zero rect at the origin.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Construct a rect from a location and an expanse.
    pub fn from_parts(tl: Point, e: Expanse) -> Self {
        Self::new(tl.x, tl.y, e.w, e.h)
    }

    /// The same extent placed at a different location.
    pub fn at(&self, tl: Point) -> Self {
        Self { tl, ..*self }
    }

    /// The extent of this rect.
    pub fn expanse(&self) -> Expanse {
        Expanse {
            w: self.w,
            h: self.h,
        }
    }

    /// The bottom-right corner.
    pub fn br(&self) -> Point {
        Point {
            x: self.tl.x + self.w,
            y: self.tl.y + self.h,
        }
    }

    /// The centre point.
    pub fn center(&self) -> Point {
        Point {
            x: self.tl.x + self.w / 2.0,
            y: self.tl.y + self.h / 2.0,
        }
    }

    /// True if the rect covers no area.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Does this rect contain the point? The far edges are exclusive.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.tl.x && p.x < self.tl.x + self.w && p.y >= self.tl.y && p.y < self.tl.y + self.h
    }

    /// The overlap of two rects, or `None` if they do not overlap with
    /// positive area.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x0 = self.tl.x.max(other.tl.x);
        let y0 = self.tl.y.max(other.tl.y);
        let x1 = (self.tl.x + self.w).min(other.tl.x + other.w);
        let y1 = (self.tl.y + self.h).min(other.tl.y + other.h);
        if x1 > x0 && y1 > y0 {
            Some(Self::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    /// Shrink the rect by the given insets. The extent clamps at zero, and
    /// the origin never moves past the far edge.
    pub fn inset(&self, i: Insets) -> Self {
        Self::new(
            self.tl.x + i.left.min(self.w),
            self.tl.y + i.top.min(self.h),
            self.w - i.horizontal(),
            self.h - i.vertical(),
        )
    }

    /// Shift the rect by an offset.
    pub fn translate(&self, by: Point) -> Self {
        Self {
            tl: self.tl + by,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(14.9, 14.9)));
        assert!(!r.contains(Point::new(15.0, 12.0)));
        assert!(!r.contains(Point::new(9.9, 12.0)));
    }

    #[test]
    fn intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn inset() {
        let r = Rect::new(0.0, 0.0, 800.0, 80.0);
        assert_eq!(
            r.inset(Insets::uniform(6.0)),
            Rect::new(6.0, 6.0, 788.0, 68.0)
        );
        // Too large an inset collapses the rect but keeps the origin inside.
        let small = Rect::new(0.0, 0.0, 4.0, 4.0).inset(Insets::uniform(6.0));
        assert_eq!(small, Rect::new(4.0, 4.0, 0.0, 0.0));
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (-100.0f32..100.0, -100.0f32..100.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn intersection_lies_within_both(a in rect_strategy(), b in rect_strategy()) {
            if let Some(i) = a.intersect(&b) {
                prop_assert!(i.w <= a.w + 1e-3 && i.w <= b.w + 1e-3);
                prop_assert!(i.h <= a.h + 1e-3 && i.h <= b.h + 1e-3);
                prop_assert!(i.tl.x >= a.tl.x && i.tl.x >= b.tl.x);
                prop_assert!(i.tl.y >= a.tl.y && i.tl.y >= b.tl.y);
            }
        }

        #[test]
        fn inset_never_negative(r in rect_strategy(), m in -50.0f32..300.0) {
            let i = r.inset(Insets::uniform(m));
            prop_assert!(i.w >= 0.0 && i.h >= 0.0);
            prop_assert!(i.tl.x <= r.tl.x + r.w);
            prop_assert!(i.tl.y <= r.tl.y + r.h);
        }
    }
}
