//! # SPL Adapters
//!
//! Narrow interfaces to the external capabilities the pipeline consumes:
//! a generative text service, an embedding service, and a pairwise
//! rerank scorer. Each capability is a trait so pipeline stages can be
//! tested in isolation against the mock implementations in [`mock`].
//!
//! Every HTTP client here carries a bounded timeout and retries a failed
//! call at most once; unbounded silent retries are never performed.

pub mod completion;
pub mod embedding;
pub mod mock;
pub mod rerank;
pub mod retry;
pub mod traits;

pub use completion::CompletionClient;
pub use embedding::EmbeddingClient;
pub use mock::{MockCompletionProvider, MockEmbeddingProvider, MockRerankProvider};
pub use rerank::EmbeddingReranker;
pub use retry::{with_retry, RetryPolicy};
pub use traits::{
    cosine_similarity, CompletionProvider, Embedding, EmbeddingProvider, RerankProvider,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AdapterError {
    /// Transient failures are worth one retry; malformed responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) => true,
            Self::RequestFailed(_) => true,
            Self::Timeout(_) => true,
            Self::ServiceUnavailable(_) => true,
            Self::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionError(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

impl From<AdapterError> for spl_core::AppError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Timeout(msg) => spl_core::AppError::service_timeout(msg),
            AdapterError::ConnectionError(msg) | AdapterError::ServiceUnavailable(msg) => {
                spl_core::AppError::service_unavailable(msg)
            }
            AdapterError::RequestFailed(msg) => spl_core::AppError::service_unavailable(msg),
            AdapterError::InvalidResponse(msg) => spl_core::AppError::generation_failure(msg),
        }
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AdapterError::Timeout("t".into()).is_retryable());
        assert!(AdapterError::ConnectionError("c".into()).is_retryable());
        assert!(!AdapterError::InvalidResponse("i".into()).is_retryable());
    }

    #[test]
    fn test_conversion_to_app_error_kinds() {
        let app: spl_core::AppError = AdapterError::Timeout("t".into()).into();
        assert_eq!(app.kind(), "external_service_timeout");

        let app: spl_core::AppError = AdapterError::InvalidResponse("bad".into()).into();
        assert_eq!(app.kind(), "generation_failure");
    }
}
