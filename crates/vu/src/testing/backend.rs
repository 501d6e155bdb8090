use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geom::{ExpanseI32, Rect, RectI32};
use slotmap::SlotMap;

use crate::{
    error::{Error, Result},
    render::{ImageSource, RenderBackend, TargetId, Texture},
    style::{BlendMode, ColorA},
};

/// A backend primitive, as received.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// A target was allocated.
    CreateTarget {
        /// New target.
        target: TargetId,
        /// Its size.
        size: ExpanseI32,
    },
    /// A target was freed.
    DestroyTarget(TargetId),
    /// The render target changed.
    BindTarget(Option<TargetId>),
    /// The scissor rect changed.
    SetScissor(Option<RectI32>),
    /// The blend equation changed.
    SetBlend(BlendMode),
    /// The color uniform changed.
    SetColor(ColorA),
    /// A batch of solid rects.
    SolidRects(Vec<Rect>),
    /// A textured quad.
    TexturedRect {
        /// Texel source.
        texture: Texture,
        /// Texel region.
        source: Option<RectI32>,
        /// Destination rect.
        dest: Rect,
    },
    /// Pixels were read back.
    ReadPixels(TargetId),
}

/// What a replayed draw produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawKind {
    /// One solid rect.
    Solid(Rect),
    /// A textured quad.
    Textured {
        /// Texel source.
        texture: Texture,
        /// Texel region.
        source: Option<RectI32>,
        /// Destination rect.
        dest: Rect,
    },
}

/// A draw together with the backend state it was issued under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    /// Bound target, `None` for the main surface.
    pub target: Option<TargetId>,
    /// Color uniform.
    pub color: ColorA,
    /// Blend equation.
    pub blend: BlendMode,
    /// Scissor rect.
    pub scissor: Option<RectI32>,
    /// The draw itself.
    pub kind: DrawKind,
}

/// The shared log behind a [`RecordingBackend`].
#[derive(Debug, Default)]
pub struct Recording {
    /// Every command received, in order.
    pub commands: Vec<DrawCommand>,
    /// Live targets and their sizes.
    targets: SlotMap<TargetId, ExpanseI32>,
    /// Maximum number of live targets, if limited.
    budget: Option<usize>,
}

impl Recording {
    /// Forget recorded commands. Live targets are kept.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of live targets.
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    /// Number of `draw_solid_rects` calls.
    pub fn solid_rect_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::SolidRects(_)))
            .count()
    }

    /// Every solid rect drawn, flattened across batches.
    pub fn solid_rects(&self) -> Vec<Rect> {
        self.draws()
            .into_iter()
            .filter_map(|d| match d.kind {
                DrawKind::Solid(r) => Some(r),
                DrawKind::Textured { .. } => None,
            })
            .collect()
    }

    /// Replay the log and pair each draw with the state in force when it was
    /// issued. Solid rect batches are split into one draw per rect.
    pub fn draws(&self) -> Vec<Draw> {
        let mut target = None;
        let mut color = ColorA::WHITE;
        let mut blend = BlendMode::default();
        let mut scissor = None;
        let mut out = Vec::new();
        for c in &self.commands {
            let state = move |kind| Draw {
                target,
                color,
                blend,
                scissor,
                kind,
            };
            match c {
                DrawCommand::BindTarget(t) => target = *t,
                DrawCommand::SetScissor(s) => scissor = *s,
                DrawCommand::SetBlend(b) => blend = *b,
                DrawCommand::SetColor(c) => color = *c,
                DrawCommand::SolidRects(rects) => {
                    out.extend(rects.iter().map(|r| state(DrawKind::Solid(*r))));
                }
                DrawCommand::TexturedRect {
                    texture,
                    source,
                    dest,
                } => out.push(state(DrawKind::Textured {
                    texture: *texture,
                    source: *source,
                    dest: *dest,
                })),
                DrawCommand::CreateTarget { .. }
                | DrawCommand::DestroyTarget(_)
                | DrawCommand::ReadPixels(_) => {}
            }
        }
        out
    }
}

/// A render backend for testing, which records every primitive it receives.
/// Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    /// Shared log.
    pub log: Arc<Mutex<Recording>>,
}

impl RecordingBackend {
    /// A backend with unlimited texture memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that fails target allocation once `budget` targets are live.
    pub fn with_target_budget(budget: usize) -> Self {
        let backend = Self::new();
        backend.recording().budget = Some(budget);
        backend
    }

    /// Lock the shared log.
    pub fn recording(&self) -> MutexGuard<'_, Recording> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of every command received so far.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.recording().commands.clone()
    }

    /// Number of live targets.
    pub fn live_targets(&self) -> usize {
        self.recording().live_targets()
    }

    /// Append a command to the log.
    fn record(&self, c: DrawCommand) {
        self.recording().commands.push(c);
    }
}

impl RenderBackend for RecordingBackend {
    fn create_target(&mut self, size: ExpanseI32) -> Result<TargetId> {
        let mut rec = self.recording();
        if rec.budget.is_some_and(|b| rec.targets.len() >= b) {
            return Err(Error::ResourceExhausted(format!(
                "no texture memory for a {}x{} target",
                size.w, size.h
            )));
        }
        let target = rec.targets.insert(size);
        rec.commands.push(DrawCommand::CreateTarget { target, size });
        Ok(target)
    }

    fn destroy_target(&mut self, target: TargetId) -> Result<()> {
        let mut rec = self.recording();
        if rec.targets.remove(target).is_none() {
            return Err(Error::Render(format!("unknown target {target:?}")));
        }
        rec.commands.push(DrawCommand::DestroyTarget(target));
        Ok(())
    }

    fn bind_target(&mut self, target: Option<TargetId>) -> Result<()> {
        self.record(DrawCommand::BindTarget(target));
        Ok(())
    }

    fn set_scissor(&mut self, rect: Option<RectI32>) -> Result<()> {
        self.record(DrawCommand::SetScissor(rect));
        Ok(())
    }

    fn set_blend(&mut self, mode: BlendMode) -> Result<()> {
        self.record(DrawCommand::SetBlend(mode));
        Ok(())
    }

    fn set_color(&mut self, color: ColorA) -> Result<()> {
        self.record(DrawCommand::SetColor(color));
        Ok(())
    }

    fn draw_solid_rects(&mut self, rects: &[Rect]) -> Result<()> {
        self.record(DrawCommand::SolidRects(rects.to_vec()));
        Ok(())
    }

    fn draw_textured_rect(
        &mut self,
        texture: Texture,
        source: Option<RectI32>,
        dest: Rect,
    ) -> Result<()> {
        self.record(DrawCommand::TexturedRect {
            texture,
            source,
            dest,
        });
        Ok(())
    }

    fn read_pixels(&mut self, target: TargetId) -> Result<ImageSource> {
        let mut rec = self.recording();
        let size = *rec
            .targets
            .get(target)
            .ok_or_else(|| Error::Render(format!("unknown target {target:?}")))?;
        rec.commands.push(DrawCommand::ReadPixels(target));
        Ok(ImageSource::transparent(size))
    }
}
