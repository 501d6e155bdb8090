use std::fmt::Debug;

use geom::{ExpanseI32, Rect, RectI32};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::{
    error::Result,
    style::{BlendMode, ColorA},
};

new_key_type! {
    /// Backend handle for an offscreen render target.
    pub struct TargetId;
}

/// Backend handle for an externally loaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// An image that lives in a backend texture. Loading is the host's job; the
/// renderer only draws it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    /// Backend texture.
    pub texture: TextureId,
    /// Size in pixels.
    pub size: ExpanseI32,
}

/// A source of texels for a textured draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Texture {
    /// The contents of an offscreen target.
    Target(TargetId),
    /// An externally loaded image.
    Image(Image),
}

/// CPU-side copy of a target's pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// Size in pixels.
    pub size: ExpanseI32,
    /// Tightly packed RGBA8 rows, top row first.
    pub pixels: Vec<u8>,
}

impl ImageSource {
    /// A fully transparent image of the given size.
    pub fn transparent(size: ExpanseI32) -> Self {
        Self {
            size,
            pixels: vec![0; size.area().max(0) as usize * 4],
        }
    }
}

/// The primitive set a GPU backend must provide. The renderer is a stateful
/// facade over this trait: it decides what is bound, scissored and blended,
/// and the backend only executes.
///
/// Pixel rects use a top-left origin with Y increasing downwards; a backend
/// whose native convention differs flips at this boundary.
pub trait RenderBackend: Debug {
    /// Allocate an offscreen target of the given size. Fails with
    /// `Error::ResourceExhausted` when texture memory runs out.
    fn create_target(&mut self, size: ExpanseI32) -> Result<TargetId>;

    /// Free an offscreen target.
    fn destroy_target(&mut self, target: TargetId) -> Result<()>;

    /// Direct subsequent draws at a target, or at the main surface for `None`.
    fn bind_target(&mut self, target: Option<TargetId>) -> Result<()>;

    /// Restrict drawing to a pixel rect, or lift the restriction for `None`.
    fn set_scissor(&mut self, rect: Option<RectI32>) -> Result<()>;

    /// Set the blend equation for subsequent draws.
    fn set_blend(&mut self, mode: BlendMode) -> Result<()>;

    /// Set the color uniform for subsequent draws.
    fn set_color(&mut self, color: ColorA) -> Result<()>;

    /// Fill rects with the current color.
    fn draw_solid_rects(&mut self, rects: &[Rect]) -> Result<()>;

    /// Draw a textured quad. `source` selects a texel region, or the whole
    /// texture for `None`. The texture is modulated by the current color.
    fn draw_textured_rect(
        &mut self,
        texture: Texture,
        source: Option<RectI32>,
        dest: Rect,
    ) -> Result<()>;

    /// Copy a target's pixels back to the CPU.
    fn read_pixels(&mut self, target: TargetId) -> Result<ImageSource>;
}
