use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::cancel::Cancelled;

/// Result alias for errors emitted by actor-clippy internals.
pub type ClippyResult<T> = Result<T, ActorClippyError>;

/// Structured error type for actor-clippy subsystems.
#[derive(Debug, Error)]
pub enum ActorClippyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl ActorClippyError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Convert to anyhow::Error for interop with anyhow-based code.
    pub fn into_anyhow(self) -> AnyhowError {
        AnyhowError::new(self)
    }
}

impl From<Cancelled> for ActorClippyError {
    fn from(_: Cancelled) -> Self {
        ActorClippyError::Cancelled
    }
}

impl From<AnyhowError> for ActorClippyError {
    fn from(err: AnyhowError) -> Self {
        match err.downcast::<ActorClippyError>() {
            Ok(inner) => inner,
            Err(err) => ActorClippyError::other(format!("{err:#}")),
        }
    }
}
