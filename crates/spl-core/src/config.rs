//! Application configuration, loaded from environment variables with an
//! optional file source layered underneath.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("SPL")
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("llm.base_url", "https://api.groq.com/openai/v1")?
            .set_default("llm.model", "llama-3.3-70b-versatile")?
            .set_default("llm.api_key", "")?
            .set_default("llm.max_tokens", 1024)?
            .set_default("llm.temperature", 0.1)?
            .set_default("llm.timeout_secs", 30)?
            .set_default("embedding.base_url", "http://localhost:8081")?
            .set_default("embedding.model", "all-MiniLM-L6-v2")?
            .set_default("embedding.dimension", 384)?
            .set_default("embedding.timeout_secs", 30)?
            .set_default("pipeline.decision_threshold", 0.35)?
            .set_default("pipeline.similarity_threshold", 0.35)?
            .set_default("pipeline.retrieval_candidates", 8)?
            .set_default("pipeline.max_query_chars", 2000)?
            .set_default("catalog.data_dir", "data")?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("SPL").separator("__"));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

/// Generative text service configuration (chat-completions style API).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url,
            model,
            api_key,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    30
}

/// Embedding service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_dimension() -> usize {
    384
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Minimum confidence for a query to be treated as in-domain.
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
    /// Minimum cosine similarity for the semantic matcher to hit.
    /// Independent of the decision threshold.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Stage-one candidate pool size (N) for retrieval.
    #[serde(default = "default_retrieval_candidates")]
    pub retrieval_candidates: usize,
    /// Queries longer than this are rejected before classification.
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decision_threshold: default_decision_threshold(),
            similarity_threshold: default_similarity_threshold(),
            retrieval_candidates: default_retrieval_candidates(),
            max_query_chars: default_max_query_chars(),
        }
    }
}

fn default_decision_threshold() -> f64 {
    0.35
}

fn default_similarity_threshold() -> f32 {
    0.35
}

fn default_retrieval_candidates() -> usize {
    8
}

fn default_max_query_chars() -> usize {
    2000
}

/// Catalog file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.decision_threshold, 0.35);
        assert_eq!(config.similarity_threshold, 0.35);
        assert_eq!(config.retrieval_candidates, 8);
        assert!(config.max_query_chars > 0);
    }

    #[test]
    fn test_llm_config_builders() {
        let config = LlmConfig::new(
            "https://api.example.com".to_string(),
            "test-model".to_string(),
            "sk-test".to_string(),
        )
        .with_max_tokens(2048)
        .with_temperature(0.0);

        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_env_defaults() {
        // Prefix deliberately unused so the set_default chain applies.
        let config = AppConfig::load_from_env("SPL_TEST_UNSET").unwrap();
        assert_eq!(config.pipeline.decision_threshold, 0.35);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.catalog.data_dir, "data");
    }
}
