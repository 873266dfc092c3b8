//! # SPL NLP
//!
//! Language-side stages of the translation pipeline: the matcher
//! ensemble and relevance classifier, the LLM-backed query enhancer,
//! and the semantic-role field normalizer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use spl_adapters::MockEmbeddingProvider;
//! use spl_nlp::{RelevanceClassifier, ClassifierConfig};
//! use spl_core::Query;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let embeddings = Arc::new(MockEmbeddingProvider::default());
//!     let classifier =
//!         RelevanceClassifier::build(embeddings, None, ClassifierConfig::default()).await?;
//!
//!     let result = classifier.classify(&Query::new("show failed logins")).await?;
//!     println!("relevant={} via {}", result.is_relevant, result.winning_method);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod enhancer;
pub mod error;
pub mod fields;
pub mod matchers;
pub mod semantic;

pub use classifier::{ClassifierConfig, RelevanceClassifier};
pub use enhancer::QueryEnhancer;
pub use error::{NlpError, Result};
pub use fields::{FieldNormalizer, FieldPlan, Platform, RoleChain};
pub use matchers::{
    DomainMatcher, Matcher, SecurityKeywordMatcher, SyntaxMatcher, TimePatternMatcher,
};
pub use semantic::SemanticMatcher;
