//! Colors, blend modes and view backgrounds.

/// Color type and helpers.
mod color;

use serde::{Deserialize, Serialize};

pub use color::ColorA;

/// How drawn pixels combine with the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// Straight alpha blending.
    #[default]
    Alpha,
    /// Blending for sources whose color is already multiplied by alpha, as
    /// frame buffer contents are.
    PremultAlpha,
}

/// An outline drawn around a view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Outline color.
    pub color: ColorA,
    /// Line width, centred on the view edge.
    pub width: f32,
}

/// The fill drawn behind a view's children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Fill color.
    pub color: ColorA,
    /// Optional outline.
    pub stroke: Option<Stroke>,
}

impl Background {
    /// A plain solid fill.
    pub fn solid(color: ColorA) -> Self {
        Self {
            color,
            stroke: None,
        }
    }

    /// Add an outline to this background.
    pub fn with_stroke(mut self, color: ColorA, width: f32) -> Self {
        self.stroke = Some(Stroke { color, width });
        self
    }
}
