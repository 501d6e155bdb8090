//! The rendering boundary: backend protocol, frame buffer cache and the
//! stateful renderer facade.

/// Backend primitive protocol.
mod backend;
/// Pooled offscreen targets.
pub mod frame_buffer;
/// Renderer facade.
mod renderer;

pub use backend::{Image, ImageSource, RenderBackend, TargetId, Texture, TextureId};
pub use frame_buffer::{FrameBuffer, FrameBufferCache, FrameBufferId, Format};
pub use renderer::{Renderer, RendererOptions};
