use serde::{Deserialize, Serialize};

use crate::clamp_extent;

/// Four-sided insets, used for layout margins.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    /// Left inset.
    pub left: f32,
    /// Top inset.
    pub top: f32,
    /// Right inset.
    pub right: f32,
    /// Bottom inset.
    pub bottom: f32,
}

impl Insets {
    /// Construct insets. Negative or non-finite values become zero.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: clamp_extent(left),
            top: clamp_extent(top),
            right: clamp_extent(right),
            bottom: clamp_extent(bottom),
        }
    }

    /// The same inset on every side.
    pub fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Zero insets.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Sum of the left and right insets.
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Sum of the top and bottom insets.
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}
