//! Post-level error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by post operations.
#[derive(Debug, Error)]
pub enum PostError {
    /// Caller is posting faster than the configured delay allows.
    #[error("please wait {seconds} seconds before posting again")]
    TooManyPosts {
        /// Seconds of the configured delay.
        seconds: i64,
    },

    /// Operation referenced a guest where a user is required.
    #[error("invalid uid")]
    InvalidUid,

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PostError {
    /// Stable machine-readable code for API serialization.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TooManyPosts { .. } => "too-many-posts",
            Self::InvalidUid => "invalid-uid",
            Self::Store(_) => "internal-error",
        }
    }
}

/// Result alias for post operations.
pub type PostResult<T> = Result<T, PostError>;
