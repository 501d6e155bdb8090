use std::result::Result as StdResult;

use thiserror::Error;

use crate::{id::ViewId, render::FrameBufferId};

/// Result type for vu operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// A usage precondition was broken: popping an empty stack, popping a
    /// frame buffer that is not on top, detaching a missing layout, and so on.
    /// State is left untouched when this is returned.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The backend could not allocate a resource.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The view handle is stale or was never issued by this tree.
    #[error("view not found: {0:?}")]
    ViewNotFound(ViewId),

    /// The frame buffer handle is stale or was pruned from the cache.
    #[error("frame buffer not found: {0:?}")]
    FrameBufferNotFound(FrameBufferId),

    #[error("render: {0}")]
    /// Backend rendering failure.
    Render(String),

    #[error("internal: {0}")]
    /// Internal error.
    Internal(String),
}

impl Error {
    /// Shorthand for building an invariant violation.
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("invariant violation: {msg}");
        Self::InvariantViolation(msg)
    }
}
