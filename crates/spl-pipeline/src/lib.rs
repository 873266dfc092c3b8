//! # SPL Pipeline
//!
//! End-to-end translation of a natural-language security question into
//! a validated SPL search. `TranslationPipeline::translate` is the one
//! call surface the core exposes; transports wrap it however they like.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use spl_adapters::{MockCompletionProvider, MockEmbeddingProvider, MockRerankProvider};
//! use spl_core::{CatalogSet, PipelineConfig, Query};
//! use spl_pipeline::TranslationPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = TranslationPipeline::build(
//!         Arc::new(MockCompletionProvider::new().with_default("index=main | stats count")),
//!         Arc::new(MockEmbeddingProvider::default()),
//!         Arc::new(MockRerankProvider::new()),
//!         Arc::new(CatalogSet::builtin()),
//!         &PipelineConfig::default(),
//!     )
//!     .await?;
//!
//!     let result = pipeline.translate(&Query::new("show failed logins")).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod generator;
pub mod validator;

pub use engine::TranslationPipeline;
pub use generator::{GeneratorConfig, QueryGenerator};
pub use validator::SyntaxValidator;
