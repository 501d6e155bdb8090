//! Test support: a backend that records what the renderer sends it.

/// Recording render backend.
mod backend;

pub use backend::{Draw, DrawCommand, DrawKind, Recording, RecordingBackend};
