//! Pooled offscreen render targets.
//!
//! The cache owns every frame buffer. A caller holds a lease on a buffer from
//! `checkout` until `release`; while leased, a buffer is never handed out
//! again. Idle buffers stay pooled for reuse until pruned.

use geom::ExpanseI32;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use super::backend::{RenderBackend, TargetId};
use crate::error::{Error, Result};

new_key_type! {
    /// Handle for a pooled frame buffer.
    pub struct FrameBufferId;
}

/// The properties that decide whether a pooled buffer can be reused. Equality
/// is exact on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Format {
    /// Size in pixels.
    pub size: ExpanseI32,
}

impl Format {
    /// A format of the given size.
    pub fn new(size: ExpanseI32) -> Self {
        Self { size }
    }
}

/// An offscreen target owned by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Reuse key.
    pub(crate) format: Format,
    /// Backing target.
    pub(crate) target: TargetId,
    /// True while leased.
    pub(crate) in_use: bool,
}

impl FrameBuffer {
    /// The buffer's format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// The buffer's size in pixels.
    pub fn size(&self) -> ExpanseI32 {
        self.format.size
    }

    /// The backend target holding the buffer's pixels.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// True while a caller holds the lease.
    pub fn in_use(&self) -> bool {
        self.in_use
    }
}

/// Pool of frame buffers keyed by format. Several buffers of the same format
/// may coexist so that nested compositing can hold more than one at once.
#[derive(Debug)]
pub struct FrameBufferCache {
    /// Pooled buffers, in allocation order.
    buffers: SlotMap<FrameBufferId, FrameBuffer>,
    /// When false, idle buffers are never handed out again and only wait to
    /// be pruned.
    reuse: bool,
}

impl Default for FrameBufferCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBufferCache {
    /// An empty cache that reuses idle buffers.
    pub fn new() -> Self {
        Self::with_reuse(true)
    }

    /// An empty cache, optionally with reuse disabled.
    pub fn with_reuse(reuse: bool) -> Self {
        Self {
            buffers: SlotMap::with_key(),
            reuse,
        }
    }

    /// Lease a buffer of the given size: the first idle buffer with an equal
    /// format, or a freshly allocated one.
    pub fn checkout(
        &mut self,
        backend: &mut dyn RenderBackend,
        size: ExpanseI32,
    ) -> Result<FrameBufferId> {
        if size.is_empty() {
            return Err(Error::invariant(format!(
                "cannot allocate a {}x{} frame buffer",
                size.w, size.h
            )));
        }
        let format = Format::new(size);
        if self.reuse
            && let Some((id, fb)) = self
                .buffers
                .iter_mut()
                .find(|(_, fb)| !fb.in_use && fb.format == format)
        {
            fb.in_use = true;
            return Ok(id);
        }

        let target = backend.create_target(size)?;
        let id = self.buffers.insert(FrameBuffer {
            format,
            target,
            in_use: true,
        });
        tracing::debug!(
            w = size.w,
            h = size.h,
            total = self.buffers.len(),
            "frame buffer allocated"
        );
        Ok(id)
    }

    /// Return a lease to the pool.
    pub fn release(&mut self, id: FrameBufferId) -> Result<()> {
        let fb = self
            .buffers
            .get_mut(id)
            .ok_or(Error::FrameBufferNotFound(id))?;
        if !fb.in_use {
            return Err(Error::invariant("frame buffer released twice"));
        }
        fb.in_use = false;
        Ok(())
    }

    /// Destroy every idle buffer. Leased buffers survive. Returns the number of
    /// buffers removed.
    pub fn clear_unused(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        let idle: Vec<(FrameBufferId, TargetId)> = self
            .buffers
            .iter()
            .filter(|(_, fb)| !fb.in_use)
            .map(|(id, fb)| (id, fb.target))
            .collect();
        // A buffer leaves the pool only once its target is gone. A failure
        // keeps that buffer pooled and pruning carries on with the rest.
        let mut removed = 0;
        let mut failed = None;
        for (id, target) in idle {
            match backend.destroy_target(target) {
                Ok(()) => {
                    self.buffers.remove(id);
                    removed += 1;
                }
                Err(e) => {
                    failed.get_or_insert(e);
                }
            }
        }
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = self.buffers.len(),
                "frame buffers pruned"
            );
        }
        match failed {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }

    /// Look a buffer up.
    pub fn get(&self, id: FrameBufferId) -> Result<&FrameBuffer> {
        self.buffers.get(id).ok_or(Error::FrameBufferNotFound(id))
    }

    /// Number of pooled buffers, leased or idle.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// True if nothing is pooled.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of leased buffers.
    pub fn in_use_count(&self) -> usize {
        self.buffers.values().filter(|fb| fb.in_use).count()
    }

    /// Iterate over pooled buffers.
    pub fn iter(&self) -> impl Iterator<Item = (FrameBufferId, &FrameBuffer)> {
        self.buffers.iter()
    }
}
