//! Semantic matcher: embedding similarity against intent anchors.

use std::sync::Arc;
use tracing::debug;

use spl_adapters::{
    traits::{cosine_similarity, Embedding},
    AdapterResult, EmbeddingProvider,
};

/// Reference descriptions of the query intents the system serves.
/// Anchor embeddings are computed once at startup and never mutated.
const INTENT_ANCHORS: &[&str] = &[
    "Find logs or events matching specific criteria",
    "Search for specific patterns in log data",
    "Filter events by time range",
    "Analyze system performance metrics",
    "Monitor security incidents",
    "Extract fields from log data",
    "Create statistics from event data",
    "Visualize trends in time-series data",
    "Detect anomalies in system behavior",
    "Detect suspicious login activities",
    "Find unusual access patterns",
    "Monitor authentication failures",
    "Track network connections",
    "Investigate security alerts",
    "Monitor application performance",
    "Track system resource utilization",
    "Analyze error rates",
    "Report on system availability",
];

/// Embeds query text and compares to the fixed reference-domain anchors.
/// Also consulted for the reported confidence when no matcher hits.
pub struct SemanticMatcher {
    provider: Arc<dyn EmbeddingProvider>,
    anchors: Vec<Embedding>,
    threshold: f32,
}

impl SemanticMatcher {
    /// Build the matcher, embedding all intent anchors up front.
    pub async fn build(
        provider: Arc<dyn EmbeddingProvider>,
        threshold: f32,
    ) -> AdapterResult<Self> {
        let anchors = provider.embed_batch(INTENT_ANCHORS).await?;
        debug!(anchors = anchors.len(), "Semantic matcher ready");
        Ok(Self {
            provider,
            anchors,
            threshold,
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Maximum cosine similarity between the query and any anchor.
    pub async fn similarity(&self, query: &str) -> AdapterResult<f32> {
        let query_embedding = self.provider.embed(query).await?;
        let best = self
            .anchors
            .iter()
            .map(|anchor| cosine_similarity(&query_embedding, anchor))
            .fold(0.0f32, f32::max);
        Ok(best)
    }

    /// Whether a similarity value counts as a hit for this matcher.
    pub fn is_hit(&self, similarity: f32) -> bool {
        similarity >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_adapters::MockEmbeddingProvider;

    async fn matcher() -> SemanticMatcher {
        let provider = Arc::new(MockEmbeddingProvider::new(256));
        SemanticMatcher::build(provider, 0.35).await.unwrap()
    }

    #[tokio::test]
    async fn test_anchor_vocabulary_scores_high() {
        let m = matcher().await;
        let sim = m
            .similarity("monitor authentication failures on servers")
            .await
            .unwrap();
        assert!(m.is_hit(sim), "similarity {} below threshold", sim);
    }

    #[tokio::test]
    async fn test_unrelated_text_scores_low() {
        let m = matcher().await;
        let sim = m.similarity("What is the weather today?").await.unwrap();
        assert!(!m.is_hit(sim), "similarity {} unexpectedly high", sim);
    }

    #[tokio::test]
    async fn test_similarity_is_deterministic() {
        let m = matcher().await;
        let a = m.similarity("track network connections").await.unwrap();
        let b = m.similarity("track network connections").await.unwrap();
        assert_eq!(a, b);
    }
}
