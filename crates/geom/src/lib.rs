//! Geometry primitives used across vu.
//!
//! View geometry lives in floating point ([`Point`], [`Expanse`], [`Rect`],
//! [`Insets`]). Render targets and scissor regions live in whole pixels
//! ([`PointI32`], [`ExpanseI32`], [`RectI32`]).
//!
//! Constructors never produce negative or non-finite extents: degenerate input
//! is clamped to zero rather than reported as an error.

#![warn(missing_docs)]

/// Width/height size types.
mod expanse;
/// Four-sided insets.
mod insets;
/// Point types.
mod point;
/// Floating point rectangles.
mod rect;
/// Pixel rectangles.
mod rect_i32;

pub use expanse::{Expanse, ExpanseI32};
pub use insets::Insets;
pub use point::{Point, PointI32};
pub use rect::Rect;
pub use rect_i32::RectI32;

/// Clamp a scalar extent so it is finite and non-negative.
#[inline]
pub fn clamp_extent(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Replace a non-finite coordinate with zero.
#[inline]
pub fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
