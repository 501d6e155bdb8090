use serde::{Deserialize, Serialize};

use super::{ExpanseI32, PointI32, Rect};

/// A rectangle in pixel space, used for scissor clipping.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RectI32 {
    /// Origin corner.
    pub tl: PointI32,
    /// Width in pixels, never negative.
    pub w: i32,
    /// Height in pixels, never negative.
    pub h: i32,
}

impl RectI32 {
    /// Construct a pixel rect. Negative extents clamp to zero.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            tl: PointI32::new(x, y),
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// The smallest pixel rect enclosing a view-space rect.
    pub fn enclosing(r: Rect) -> Self {
        let x0 = r.tl.x.floor() as i32;
        let y0 = r.tl.y.floor() as i32;
        let x1 = (r.tl.x + r.w).ceil() as i32;
        let y1 = (r.tl.y + r.h).ceil() as i32;
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// The size of this rect.
    pub fn expanse(&self) -> ExpanseI32 {
        ExpanseI32::new(self.w, self.h)
    }

    /// True if the rect covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// The overlap of two rects. Disjoint rects produce a zero-sized rect, so
    /// repeated intersection can only ever shrink a region.
    pub fn intersect(&self, other: &Self) -> Self {
        let x0 = self.tl.x.max(other.tl.x);
        let y0 = self.tl.y.max(other.tl.y);
        let x1 = self
            .tl
            .x
            .saturating_add(self.w)
            .min(other.tl.x.saturating_add(other.w));
        let y1 = self
            .tl
            .y
            .saturating_add(self.h)
            .min(other.tl.y.saturating_add(other.h));
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// True if `other` lies entirely within this rect.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.tl.x >= self.tl.x
            && other.tl.y >= self.tl.y
            && other.tl.x.saturating_add(other.w) <= self.tl.x.saturating_add(self.w)
            && other.tl.y.saturating_add(other.h) <= self.tl.y.saturating_add(self.h)
    }
}
