//! Linear layout: stack a container's direct children along one axis.
//!
//! A [`Layout`] is attached to a container view and positions that view's
//! direct children inside the container's content bounds (its size minus the
//! margin). Children are stacked along the primary axis in insertion order,
//! separated by `padding`, and placed on the cross axis according to
//! `alignment`. The pass is a single O(n) sweep: it never iterates to a fixed
//! point and never recurses into grandchildren.

use geom::{Expanse, Insets, Rect, clamp_extent};
use serde::{Deserialize, Serialize};

/// The axis along which children are stacked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Top to bottom, Y increasing.
    #[default]
    Vertical,
    /// Left to right, X increasing.
    Horizontal,
}

/// Primary-axis sizing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Children keep their preferred extent. An extent that would overflow the
    /// content bounds is clamped to the space that remains.
    #[default]
    Fixed,
    /// Children share the content extent equally.
    Fill,
    /// Children keep their preferred extent and the unused space is spread
    /// evenly between them. `padding` is the minimum gap.
    Distribute,
}

impl Mode {
    /// Number of modes.
    pub const NUM_MODES: usize = 3;
    /// Every mode, in successor order.
    pub const ALL: [Self; Self::NUM_MODES] = [Self::Fixed, Self::Fill, Self::Distribute];

    /// The next mode, wrapping around after the last.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::NUM_MODES]
    }

    /// Position of this mode in [`Mode::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Fill => 1,
            Self::Distribute => 2,
        }
    }
}

/// Cross-axis placement of each child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Against the leading edge (left or top).
    #[default]
    Start,
    /// Centred.
    Center,
    /// Against the trailing edge (right or bottom).
    End,
    /// Stretched across the whole content extent.
    Fill,
}

impl Alignment {
    /// Number of alignments.
    pub const NUM_ALIGNMENTS: usize = 4;
    /// Every alignment, in successor order.
    pub const ALL: [Self; Self::NUM_ALIGNMENTS] =
        [Self::Start, Self::Center, Self::End, Self::Fill];

    /// The next alignment, wrapping around after the last.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::NUM_ALIGNMENTS]
    }

    /// Position of this alignment in [`Alignment::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Start => 0,
            Self::Center => 1,
            Self::End => 2,
            Self::Fill => 3,
        }
    }

    /// Offset and extent of a child on the cross axis.
    fn place(self, preferred: f32, available: f32) -> (f32, f32) {
        let extent = clamp_extent(preferred).min(available);
        match self {
            Self::Start => (0.0, extent),
            Self::Center => ((available - extent) / 2.0, extent),
            Self::End => (available - extent, extent),
            Self::Fill => (0.0, available),
        }
    }
}

/// Linear layout configuration. The direction is the variant tag; everything
/// else is shared between vertical and horizontal layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Stacking axis.
    pub direction: Direction,
    /// Gap between consecutive children along the primary axis.
    pub padding: f32,
    /// Inset from the container's bounds.
    pub margin: Insets,
    /// Primary-axis sizing policy.
    pub mode: Mode,
    /// Cross-axis placement.
    pub alignment: Alignment,
}

impl Layout {
    /// A top-to-bottom layout.
    pub fn vertical() -> Self {
        Self {
            direction: Direction::Vertical,
            ..Default::default()
        }
    }

    /// A left-to-right layout.
    pub fn horizontal() -> Self {
        Self {
            direction: Direction::Horizontal,
            ..Default::default()
        }
    }

    /// Set the gap between children.
    pub fn padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Set the margin.
    pub fn margin(mut self, margin: Insets) -> Self {
        self.margin = margin;
        self
    }

    /// Set the sizing mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the cross-axis alignment.
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// The content bounds of a container of the given size: its extent minus
    /// the margin, placed at the margin's top-left corner.
    pub fn content_rect(&self, bounds: Expanse) -> Rect {
        Rect::new(
            self.margin.left,
            self.margin.top,
            bounds.w - self.margin.horizontal(),
            bounds.h - self.margin.vertical(),
        )
    }

    /// Compute frames for children with the given preferred sizes inside a
    /// container of size `bounds`. Frames are in the container's coordinate
    /// space and are returned in the same order as `preferred`.
    ///
    /// All arithmetic clamps: the result is finite and non-negative for any
    /// input, and every frame lies within the content rect along the primary
    /// axis. When the padding alone would overflow the content extent, the
    /// gaps shrink to share it and the children collapse to zero extent.
    pub fn arrange(&self, bounds: Expanse, preferred: &[Expanse]) -> Vec<Rect> {
        let n = preferred.len();
        if n == 0 {
            return Vec::new();
        }

        let content = self.content_rect(bounds);
        let content_main = main(self.direction, content.expanse());
        let content_cross = cross(self.direction, content.expanse());
        // Gaps shrink before they overflow the content extent.
        let padding = if n > 1 {
            clamp_extent(self.padding).min(clamp_extent(content_main) / (n - 1) as f32)
        } else {
            clamp_extent(self.padding)
        };
        let gaps = padding * (n - 1) as f32;
        let usable = clamp_extent(content_main - gaps);

        let extents: Vec<f32> = match self.mode {
            Mode::Fill => vec![usable / n as f32; n],
            Mode::Fixed | Mode::Distribute => {
                let mut consumed = 0.0;
                preferred
                    .iter()
                    .map(|p| {
                        let extent = clamp_extent(main(self.direction, *p))
                            .min(clamp_extent(usable - consumed));
                        consumed += extent;
                        extent
                    })
                    .collect()
            }
        };

        let gap = match self.mode {
            Mode::Distribute if n > 1 => {
                let used: f32 = extents.iter().sum();
                padding + clamp_extent(usable - used) / (n - 1) as f32
            }
            _ => padding,
        };

        let mut cursor = 0.0;
        let mut frames = Vec::with_capacity(n);
        for (p, extent) in preferred.iter().zip(extents) {
            let (offset, cross_extent) = self
                .alignment
                .place(cross(self.direction, *p), content_cross);
            let frame = match self.direction {
                Direction::Vertical => Rect::new(
                    content.tl.x + offset,
                    content.tl.y + cursor,
                    cross_extent,
                    extent,
                ),
                Direction::Horizontal => Rect::new(
                    content.tl.x + cursor,
                    content.tl.y + offset,
                    extent,
                    cross_extent,
                ),
            };
            frames.push(frame);
            cursor += extent + gap;
        }
        frames
    }
}

/// Extent of `e` along the primary axis of `direction`.
fn main(direction: Direction, e: Expanse) -> f32 {
    match direction {
        Direction::Vertical => e.h,
        Direction::Horizontal => e.w,
    }
}

/// Extent of `e` along the cross axis of `direction`.
fn cross(direction: Direction, e: Expanse) -> f32 {
    match direction {
        Direction::Vertical => e.w,
        Direction::Horizontal => e.h,
    }
}
