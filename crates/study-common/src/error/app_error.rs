//! Application error types
//!
//! Unified error surface for an embedding host: every lower-layer error
//! converts into `AppError` and carries a stable code string.

use study_core::{StoreError, SyncError};

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Engine errors (validation or transport; see `SyncError` predicates)
    #[error(transparent)]
    Sync(#[from] SyncError),

    // Store transport errors reaching the host directly
    #[error(transparent)]
    Store(#[from] StoreError),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for host surfaces
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sync(e) => e.code(),
            Self::Store(_) => "STORE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error was caused by invalid caller input
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Sync(e) if e.is_validation())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
