use std::fmt::Display;

use thiserror::Error;

pub type Result<T, E = ScopeError> = std::result::Result<T, E>;

/// Lifecycle and bookkeeping failures surfaced by a [`StateScope`](crate::StateScope)
/// and the cells bound to it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("scope `{}` was disposed twice", .label.as_deref().unwrap_or("<unnamed>"))]
    DisposedTwice { label: Option<String> },

    #[error("`{op}` called on disposed scope `{}`", .label.as_deref().unwrap_or("<unnamed>"))]
    UseAfterDispose {
        op: &'static str,
        label: Option<String>,
    },

    #[error("scope `{}` notified from inside its own notification", .label.as_deref().unwrap_or("<unnamed>"))]
    ReentrantNotify { label: Option<String> },

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A failure reported by an external source (a stream item error, a rejected
/// future, or an executor that refused the task).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("source failed: {0}")]
    Failed(String),

    #[error("could not spawn source task: {0}")]
    Spawn(String),
}

impl SourceError {
    pub fn new(err: impl Display) -> Self {
        Self::Failed(err.to_string())
    }

    pub fn spawn(err: impl Display) -> Self {
        Self::Spawn(err.to_string())
    }
}
