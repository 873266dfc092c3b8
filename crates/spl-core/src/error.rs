//! Application error taxonomy.
//!
//! Matcher and enhancer failures are absorbed inside their stages; only
//! the variants below ever reach a caller. Each variant carries a stable
//! `kind()` tag so a transport layer can pick a user-appropriate message
//! without matching on display strings.

use thiserror::Error;

/// Top-level application error.
#[derive(Error, Debug)]
pub enum AppError {
    /// Query rejected before any pipeline stage ran (empty or oversized).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An external call exceeded its bounded timeout.
    #[error("External service timeout: {0}")]
    ServiceTimeout(String),

    /// Embedding or generative service could not be reached.
    #[error("External service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Model output was malformed or unparsable at the generation stage.
    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    /// Catalog files missing or failed validation at startup.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn service_timeout(msg: impl Into<String>) -> Self {
        Self::ServiceTimeout(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn generation_failure(msg: impl Into<String>) -> Self {
        Self::GenerationFailure(msg.into())
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable taxonomy tag for transport layers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ServiceTimeout(_) => "external_service_timeout",
            Self::ServiceUnavailable(_) => "external_service_unavailable",
            Self::GenerationFailure(_) => "generation_failure",
            Self::Catalog(_) => "catalog_error",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller may safely retry the request as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceTimeout(_) | Self::ServiceUnavailable(_))
    }
}

/// Result type for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
