//! # SPL Core
//!
//! Shared foundation for the SPL CoPilot translation pipeline: the data
//! model carried between pipeline stages, the application error taxonomy,
//! configuration loading, and the read-only catalogs (organization
//! profiles, field mappings, training corpus) populated once at startup.

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use catalog::{CatalogSet, FieldMapping, OrganizationProfile, TrainingExample};
pub use config::{AppConfig, EmbeddingConfig, LlmConfig, PipelineConfig};
pub use error::{AppError, AppResult};
pub use types::{
    EnhancedQuery, GeneratedQuery, MatchMethod, MatchSignal, Query, QueryId, RelevanceResult,
    RetrievalResult, RetrievedExample, Translation, ValidationResult,
};
