//! # SPL Context
//!
//! Context-side stages of the translation pipeline: picking the
//! organization profile a query is scoped to, and retrieving few-shot
//! exemplars from the training corpus by embedding similarity plus
//! pairwise reranking.

pub mod error;
pub mod retriever;
pub mod selector;

pub use error::{ContextError, Result};
pub use retriever::{ExampleIndex, RetrieverConfig};
pub use selector::ContextSelector;
