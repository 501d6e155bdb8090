//! vu: a retained-mode view toolkit core.
//!
//! vu keeps a tree of views in an arena, lays out each container's children
//! along one axis, and paints the tree through a stateful renderer that owns a
//! cache of offscreen frame buffers.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`ViewTree`] - The view arena, layout pass and hit testing
//! - [`Layout`] - Linear layout configuration attached to a container
//! - [`Renderer`] - Color, blend and clip stacks over a [`RenderBackend`]
//!
//! A host drives one frame at a time: mark views dirty as state changes, then
//! call [`ViewTree::frame`], which runs the layout pass, paints the tree and
//! checks that every renderer stack is balanced.

#![warn(missing_docs)]

/// Render pass over a view tree.
mod draw;
/// Debug dumps.
pub mod dump;
/// Error types.
pub mod error;
/// View identifiers.
mod id;
pub mod layout;
pub mod render;
pub mod style;
/// Recording backend for tests.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
/// The view arena.
mod tree;
/// View node data.
mod view;

pub use error::{Error, Result};
pub use geom;
pub use id::ViewId;
pub use layout::{Alignment, Direction, Layout, Mode};
pub use render::{RenderBackend, Renderer, RendererOptions};
pub use style::{Background, BlendMode, ColorA};
pub use tree::ViewTree;
pub use view::View;
