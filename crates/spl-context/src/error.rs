//! Context-specific error types

use thiserror::Error;

/// Context-specific error types
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Indexing error: {0}")]
    Indexing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContextError {
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    pub fn indexing(msg: impl Into<String>) -> Self {
        Self::Indexing(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

impl From<ContextError> for spl_core::AppError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Retrieval(msg) => spl_core::AppError::service_unavailable(msg),
            ContextError::Indexing(msg) => spl_core::AppError::internal(msg),
            ContextError::Internal(msg) => spl_core::AppError::internal(msg),
        }
    }
}
