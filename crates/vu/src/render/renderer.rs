use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use geom::{ExpanseI32, Rect, RectI32};
use serde::{Deserialize, Serialize};

use super::{
    backend::{Image, ImageSource, RenderBackend, TargetId, Texture},
    frame_buffer::{FrameBuffer, FrameBufferCache, FrameBufferId},
};
use crate::{
    error::{Error, Result},
    style::{BlendMode, ColorA},
};

/// Renderer behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Keep released frame buffers pooled for reuse. When off, a released
    /// buffer is never reissued and is destroyed at the end of the frame.
    pub cache_frame_buffers: bool,
    /// Coalesce consecutive solid rects drawn under identical state into one
    /// backend call.
    pub batch_solid_rects: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            cache_frame_buffers: true,
            batch_solid_rects: true,
        }
    }
}

/// A frame buffer currently bound as the render target.
#[derive(Debug, Clone, Copy)]
struct BoundTarget {
    /// Buffer being drawn into.
    fb: FrameBufferId,
    /// Its backend target.
    target: TargetId,
    /// Active clip when the buffer was pushed.
    saved_clip: Option<RectI32>,
    /// Clip stack depth when the buffer was pushed.
    clip_depth: usize,
}

/// State last sent to the backend. `None` means unknown, so the next draw
/// sends it unconditionally.
#[derive(Debug, Default)]
struct Applied {
    /// Color uniform.
    color: Option<ColorA>,
    /// Blend equation.
    blend: Option<BlendMode>,
    /// Scissor rect.
    scissor: Option<Option<RectI32>>,
}

/// Stateful draw facade.
///
/// The renderer keeps the active color, blend mode and clip, each with a save
/// stack, plus a stack of frame buffers bound as render targets. State is sent
/// to the backend lazily, right before the draw that needs it, so that solid
/// rects drawn under unchanged state can be batched.
///
/// Every `push_*` must be balanced by a `pop_*`. Popping an empty stack fails
/// with [`Error::InvariantViolation`] and leaves all state untouched;
/// [`Renderer::end_frame`] reports any stack left unbalanced.
#[derive(Debug)]
pub struct Renderer {
    /// Backend that executes primitives.
    backend: Box<dyn RenderBackend>,
    /// Behaviour switches.
    options: RendererOptions,
    /// Pooled offscreen targets.
    frame_buffers: FrameBufferCache,

    /// Active color.
    color: ColorA,
    /// Saved colors.
    color_stack: Vec<ColorA>,
    /// Active blend mode.
    blend_mode: BlendMode,
    /// Saved blend modes.
    blend_stack: Vec<BlendMode>,
    /// Active clip in target pixels. `None` means unclipped.
    clip: Option<RectI32>,
    /// Saved clips.
    clip_stack: Vec<Option<RectI32>>,

    /// Bound frame buffers, innermost last. Empty means the main surface.
    targets: Vec<BoundTarget>,
    /// Pending solid rects, all sharing the applied state.
    batch: Vec<Rect>,
    /// Backend state shadow.
    applied: Applied,
}

impl Renderer {
    /// Construct a renderer with default options.
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self::with_options(backend, RendererOptions::default())
    }

    /// Construct a renderer with explicit options.
    pub fn with_options(backend: Box<dyn RenderBackend>, options: RendererOptions) -> Self {
        Self {
            backend,
            options,
            frame_buffers: FrameBufferCache::with_reuse(options.cache_frame_buffers),
            color: ColorA::WHITE,
            color_stack: Vec::new(),
            blend_mode: BlendMode::default(),
            blend_stack: Vec::new(),
            clip: None,
            clip_stack: Vec::new(),
            targets: Vec::new(),
            batch: Vec::new(),
            applied: Applied::default(),
        }
    }

    /// The options this renderer was built with.
    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// The active color.
    pub fn color(&self) -> ColorA {
        self.color
    }

    /// Replace the active color without touching the stack.
    pub fn set_color(&mut self, color: ColorA) {
        self.color = color;
    }

    /// Save the active color, then make `color` active.
    pub fn push_color(&mut self, color: ColorA) {
        self.color_stack.push(self.color);
        self.color = color;
    }

    /// Save the active color without changing it.
    pub fn push_current_color(&mut self) {
        self.color_stack.push(self.color);
    }

    /// Restore the most recently saved color.
    pub fn pop_color(&mut self) -> Result<()> {
        self.color = self
            .color_stack
            .pop()
            .ok_or_else(|| Error::invariant("pop_color with an empty color stack"))?;
        Ok(())
    }

    /// Number of saved colors.
    pub fn color_depth(&self) -> usize {
        self.color_stack.len()
    }

    /// The active blend mode.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Replace the active blend mode without touching the stack.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    /// Save the active blend mode, then make `mode` active.
    pub fn push_blend_mode(&mut self, mode: BlendMode) {
        self.blend_stack.push(self.blend_mode);
        self.blend_mode = mode;
    }

    /// Save the active blend mode without changing it.
    pub fn push_current_blend_mode(&mut self) {
        self.blend_stack.push(self.blend_mode);
    }

    /// Restore the most recently saved blend mode.
    pub fn pop_blend_mode(&mut self) -> Result<()> {
        self.blend_mode = self
            .blend_stack
            .pop()
            .ok_or_else(|| Error::invariant("pop_blend_mode with an empty blend mode stack"))?;
        Ok(())
    }

    /// Number of saved blend modes.
    pub fn blend_mode_depth(&self) -> usize {
        self.blend_stack.len()
    }

    /// The active clip, in pixels of the bound target.
    pub fn clip(&self) -> Option<RectI32> {
        self.clip
    }

    /// Replace the active clip without touching the stack.
    pub fn set_clip(&mut self, clip: Option<RectI32>) {
        self.clip = clip;
    }

    /// Save the active clip, then narrow it to its intersection with `rect`.
    /// The clip region can only shrink while pushing.
    pub fn push_clip(&mut self, rect: RectI32) {
        self.clip_stack.push(self.clip);
        self.clip = Some(match self.clip {
            Some(active) => active.intersect(&rect),
            None => rect,
        });
    }

    /// Save the active clip without changing it.
    pub fn push_current_clip(&mut self) {
        self.clip_stack.push(self.clip);
    }

    /// Restore the most recently saved clip.
    pub fn pop_clip(&mut self) -> Result<()> {
        let depth = self.targets.last().map_or(0, |t| t.clip_depth);
        if self.clip_stack.len() <= depth {
            return Err(Error::invariant(
                "pop_clip with no clip pushed in the current target",
            ));
        }
        if let Some(clip) = self.clip_stack.pop() {
            self.clip = clip;
        }
        Ok(())
    }

    /// Number of saved clips.
    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }

    /// Lease a frame buffer of the given size from the cache.
    pub fn get_frame_buffer(&mut self, size: ExpanseI32) -> Result<FrameBufferId> {
        self.frame_buffers.checkout(self.backend.as_mut(), size)
    }

    /// Direct subsequent draws into a leased frame buffer. The active clip is
    /// saved and disabled until the matching pop.
    pub fn push_frame_buffer(&mut self, id: FrameBufferId) -> Result<()> {
        let fb = self.frame_buffers.get(id)?;
        if !fb.in_use() {
            return Err(Error::invariant(
                "a frame buffer must be leased before it is pushed",
            ));
        }
        if self.is_bound(id) {
            return Err(Error::invariant("frame buffer is already bound"));
        }
        let target = fb.target();
        self.flush()?;
        self.backend.bind_target(Some(target))?;
        self.targets.push(BoundTarget {
            fb: id,
            target,
            saved_clip: self.clip,
            clip_depth: self.clip_stack.len(),
        });
        self.clip = None;
        Ok(())
    }

    /// Stop drawing into `id`, which must be the most recently pushed frame
    /// buffer. Restores the previous target and clip and releases the lease.
    /// The buffer's contents stay valid until it is leased again or pruned.
    pub fn pop_frame_buffer(&mut self, id: FrameBufferId) -> Result<()> {
        let top = *self
            .targets
            .last()
            .ok_or_else(|| Error::invariant("pop_frame_buffer with no frame buffer bound"))?;
        if top.fb != id {
            return Err(Error::invariant(
                "pop_frame_buffer does not match the most recent push",
            ));
        }
        if self.clip_stack.len() != top.clip_depth {
            return Err(Error::invariant(
                "clips pushed inside a frame buffer must be popped first",
            ));
        }
        self.flush()?;
        self.targets.pop();
        self.backend
            .bind_target(self.targets.last().map(|t| t.target))?;
        self.clip = top.saved_clip;
        self.frame_buffers.release(id)
    }

    /// Return a lease for a buffer that was never pushed.
    pub fn release_frame_buffer(&mut self, id: FrameBufferId) -> Result<()> {
        if self.is_bound(id) {
            return Err(Error::invariant(
                "a bound frame buffer is released by popping it",
            ));
        }
        self.frame_buffers.release(id)
    }

    /// Destroy all idle frame buffers. Returns the number removed.
    pub fn clear_unused_frame_buffers(&mut self) -> Result<usize> {
        self.frame_buffers.clear_unused(self.backend.as_mut())
    }

    /// Number of pooled frame buffers, leased or idle.
    pub fn num_frame_buffers_cached(&self) -> usize {
        self.frame_buffers.len()
    }

    /// The frame buffer pool.
    pub fn frame_buffers(&self) -> &FrameBufferCache {
        &self.frame_buffers
    }

    /// Look up a pooled frame buffer.
    pub fn frame_buffer(&self, id: FrameBufferId) -> Result<&FrameBuffer> {
        self.frame_buffers.get(id)
    }

    /// The innermost bound frame buffer, or `None` for the main surface.
    pub fn bound_frame_buffer(&self) -> Option<FrameBufferId> {
        self.targets.last().map(|t| t.fb)
    }

    /// Is `id` anywhere on the target stack?
    fn is_bound(&self, id: FrameBufferId) -> bool {
        self.targets.iter().any(|t| t.fb == id)
    }

    /// Copy a frame buffer's pixels back to the CPU.
    pub fn create_image_source(&mut self, id: FrameBufferId) -> Result<ImageSource> {
        let target = self.frame_buffers.get(id)?.target();
        self.flush()?;
        self.backend.read_pixels(target)
    }

    /// A table of every pooled frame buffer and its state.
    pub fn frame_buffer_report(&self) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["frame buffer", "size", "state"]);
        for (id, fb) in self.frame_buffers.iter() {
            let (state, color) = if self.is_bound(id) {
                ("bound", Color::Yellow)
            } else if fb.in_use() {
                ("in use", Color::Green)
            } else {
                ("idle", Color::DarkGrey)
            };
            table.add_row(vec![
                Cell::new(format!("{id:?}")),
                Cell::new(format!("{}x{}", fb.size().w, fb.size().h)),
                Cell::new(state).fg(color),
            ]);
        }
        format!(
            "{table}\n{} cached, {} in use",
            self.frame_buffers.len(),
            self.frame_buffers.in_use_count()
        )
    }

    /// Draw a frame buffer's whole contents into `dest`.
    pub fn draw_frame_buffer(&mut self, id: FrameBufferId, dest: Rect) -> Result<()> {
        self.draw_frame_buffer_source(id, None, dest)
    }

    /// Draw part of a frame buffer into `dest`.
    pub fn draw_frame_buffer_area(
        &mut self,
        id: FrameBufferId,
        source: RectI32,
        dest: Rect,
    ) -> Result<()> {
        self.draw_frame_buffer_source(id, Some(source), dest)
    }

    /// Shared frame buffer draw path.
    fn draw_frame_buffer_source(
        &mut self,
        id: FrameBufferId,
        source: Option<RectI32>,
        dest: Rect,
    ) -> Result<()> {
        let target = self.frame_buffers.get(id)?.target();
        if self.is_bound(id) {
            return Err(Error::invariant(
                "a frame buffer cannot be drawn while it is bound",
            ));
        }
        self.draw_texture(Texture::Target(target), source, dest)
    }

    /// Draw an externally loaded image into `dest`.
    pub fn draw_image(&mut self, image: &Image, dest: Rect) -> Result<()> {
        self.draw_texture(Texture::Image(*image), None, dest)
    }

    /// Textured draws always end the current batch.
    fn draw_texture(
        &mut self,
        texture: Texture,
        source: Option<RectI32>,
        dest: Rect,
    ) -> Result<()> {
        if self.clipped_out(dest) {
            return Ok(());
        }
        self.flush()?;
        self.sync_state()?;
        self.backend.draw_textured_rect(texture, source, dest)
    }

    /// Fill a rect with the active color.
    pub fn draw_solid_rect(&mut self, rect: Rect) -> Result<()> {
        if self.clipped_out(rect) {
            return Ok(());
        }
        self.sync_state()?;
        if self.options.batch_solid_rects {
            self.batch.push(rect);
            Ok(())
        } else {
            self.backend.draw_solid_rects(&[rect])
        }
    }

    /// Outline a rect with a one pixel line.
    pub fn draw_stroked_rect(&mut self, rect: Rect) -> Result<()> {
        self.draw_stroked_rect_width(rect, 1.0)
    }

    /// Outline a rect with a line of the given width, centred on the rect's
    /// edge. The outline is drawn as four non-overlapping solid rects.
    pub fn draw_stroked_rect_width(&mut self, rect: Rect, width: f32) -> Result<()> {
        let width = geom::clamp_extent(width);
        if width == 0.0 {
            return Ok(());
        }
        let half = width / 2.0;
        let (x, y, w, h) = (rect.tl.x, rect.tl.y, rect.w, rect.h);
        let edges = [
            Rect::new(x - half, y - half, w + width, width),
            Rect::new(x - half, y + h - half, w + width, width),
            Rect::new(x - half, y + half, width, h - width),
            Rect::new(x + w - half, y + half, width, h - width),
        ];
        for edge in edges {
            self.draw_solid_rect(edge)?;
        }
        Ok(())
    }

    /// Nothing can be drawn: the rect is empty or the clip is.
    fn clipped_out(&self, rect: Rect) -> bool {
        rect.is_empty() || self.clip.is_some_and(|c| c.is_empty())
    }

    /// Send any state that differs from what the backend last saw. A pending
    /// batch was drawn under the old state, so it goes out first.
    fn sync_state(&mut self) -> Result<()> {
        let color = self.applied.color != Some(self.color);
        let blend = self.applied.blend != Some(self.blend_mode);
        let scissor = self.applied.scissor != Some(self.clip);
        if !(color || blend || scissor) {
            return Ok(());
        }
        self.flush()?;
        if color {
            self.backend.set_color(self.color)?;
            self.applied.color = Some(self.color);
        }
        if blend {
            self.backend.set_blend(self.blend_mode)?;
            self.applied.blend = Some(self.blend_mode);
        }
        if scissor {
            self.backend.set_scissor(self.clip)?;
            self.applied.scissor = Some(self.clip);
        }
        Ok(())
    }

    /// Send any batched solid rects to the backend.
    pub fn flush(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let sent = self.backend.draw_solid_rects(&self.batch);
        self.batch.clear();
        sent
    }

    /// Finish a frame: flush pending draws and check that every stack is back
    /// at its base. Idle frame buffers are pruned when caching is off.
    pub fn end_frame(&mut self) -> Result<()> {
        self.flush()?;
        let unbalanced: Vec<String> = [
            ("color", self.color_stack.len()),
            ("blend mode", self.blend_stack.len()),
            ("clip", self.clip_stack.len()),
            ("frame buffer", self.targets.len()),
        ]
        .into_iter()
        .filter(|(_, depth)| *depth > 0)
        .map(|(name, depth)| format!("{name} ({depth})"))
        .collect();
        if !unbalanced.is_empty() {
            return Err(Error::invariant(format!(
                "unbalanced stacks at end of frame: {}",
                unbalanced.join(", ")
            )));
        }
        if !self.options.cache_frame_buffers {
            self.clear_unused_frame_buffers()?;
        }
        Ok(())
    }
}
