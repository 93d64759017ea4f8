//! Sync errors - error types for engine operations
//!
//! Two classes matter to callers: validation errors are rejected locally
//! and never reach the store; transport errors come back from the store and
//! are surfaced without automatic retry. Missing lookup documents are not
//! errors at all - they resolve to documented defaults.

use thiserror::Error;

use crate::traits::StoreError;
use crate::value_objects::UserId;

/// Engine operation errors
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Validation (rejected locally, zero remote writes)
    // =========================================================================
    #[error("message body is empty")]
    EmptyMessage,

    #[error("message too long: max {max} characters")]
    MessageTooLong { max: usize },

    #[error("no user is signed in")]
    NotAuthenticated,

    #[error("cannot like or nudge yourself: {0}")]
    SelfTarget(UserId),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("message edit and delete are reserved and not supported")]
    Unsupported,

    // =========================================================================
    // Transport (surfaced from the store, not retried)
    // =========================================================================
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Get an error code string for host surfaces
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::MessageTooLong { .. } => "MESSAGE_TOO_LONG",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::SelfTarget(_) => "SELF_TARGET",
            Self::InvalidUsername(_) => "INVALID_USERNAME",
            Self::Unsupported => "UNSUPPORTED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Check if this error was rejected locally, before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyMessage
                | Self::MessageTooLong { .. }
                | Self::NotAuthenticated
                | Self::SelfTarget(_)
                | Self::InvalidUsername(_)
                | Self::Unsupported
        )
    }

    /// Check if this error came back from the remote store
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type for engine operations
pub type SyncResult<T> = Result<T, SyncError>;
