//! NLP-specific error types

use thiserror::Error;

/// NLP-specific error types
#[derive(Error, Debug)]
pub enum NlpError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Enhancement error: {0}")]
    Enhancement(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NlpError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    pub fn enhancement(msg: impl Into<String>) -> Self {
        Self::Enhancement(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for NLP operations
pub type Result<T> = std::result::Result<T, NlpError>;

impl From<NlpError> for spl_core::AppError {
    fn from(err: NlpError) -> Self {
        match err {
            NlpError::Validation(msg) => spl_core::AppError::invalid_input(msg),
            NlpError::Classification(msg) => spl_core::AppError::internal(msg),
            NlpError::Enhancement(msg) => spl_core::AppError::internal(msg),
            NlpError::Internal(msg) => spl_core::AppError::internal(msg),
        }
    }
}
