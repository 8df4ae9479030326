//! Topic-level error types.

use thiserror::Error;

use crate::posts::PostError;
use crate::store::StoreError;

/// Errors surfaced by topic operations.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Caller lacks the privilege the operation requires.
    #[error("no privileges")]
    NoPrivileges,

    /// Referenced topic does not exist.
    #[error("no such topic")]
    NoTopic,

    /// Title or content failed validation.
    #[error("invalid topic data")]
    InvalidData,

    /// Failure in the underlying post operation.
    #[error(transparent)]
    Post(#[from] PostError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TopicError {
    /// Stable machine-readable code for API serialization.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoPrivileges => "no-privileges",
            Self::NoTopic => "no-topic",
            Self::InvalidData => "invalid-data",
            Self::Post(inner) => inner.code(),
            Self::Store(_) => "internal-error",
        }
    }
}

/// Result alias for topic operations.
pub type TopicResult<T> = Result<T, TopicError>;
