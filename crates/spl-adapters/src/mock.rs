//! Mock providers for tests and offline operation.

use async_trait::async_trait;

use crate::{
    traits::{CompletionProvider, Embedding, EmbeddingProvider, RerankProvider},
    AdapterError, AdapterResult,
};

/// Deterministic bag-of-words embedding provider.
///
/// Tokens are hashed into a fixed number of buckets, so texts sharing
/// vocabulary produce similar vectors and unrelated texts are close to
/// orthogonal. Good enough to exercise cosine-similarity code paths
/// without a model.
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, word: &str) -> usize {
        let hash = word
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        (hash % self.dimension as u64) as usize
    }

    fn embed_sync(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0f32; self.dimension];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
        {
            embedding[self.bucket(word)] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }
        embedding
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> AdapterResult<Embedding> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> AdapterResult<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Scripted completion provider: responds based on prompt content.
///
/// Rules are checked in insertion order; the first whose marker appears
/// in the prompt wins. Without a matching rule the default response is
/// returned, or an error if none was set.
pub struct MockCompletionProvider {
    rules: Vec<(String, String)>,
    default_response: Option<String>,
    fail: bool,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_response: None,
            fail: false,
        }
    }

    /// Provider that fails every call, for degradation tests.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default_response: None,
            fail: true,
        }
    }

    pub fn with_rule(mut self, marker: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((marker.into(), response.into()));
        self
    }

    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(
        &self,
        prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> AdapterResult<String> {
        if self.fail {
            return Err(AdapterError::ServiceUnavailable(
                "mock completion provider configured to fail".into(),
            ));
        }

        for (marker, response) in &self.rules {
            if prompt.contains(marker.as_str()) {
                return Ok(response.clone());
            }
        }

        self.default_response.clone().ok_or_else(|| {
            AdapterError::InvalidResponse("no mock rule matched the prompt".into())
        })
    }
}

/// Overlap-based pairwise scorer standing in for a cross-encoder.
pub struct MockRerankProvider;

impl MockRerankProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockRerankProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RerankProvider for MockRerankProvider {
    async fn score_pairs(&self, query: &str, documents: &[&str]) -> AdapterResult<Vec<f32>> {
        let query_words: std::collections::HashSet<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .map(String::from)
            .collect();

        let scores = documents
            .iter()
            .map(|doc| {
                let doc_words: std::collections::HashSet<String> = doc
                    .to_lowercase()
                    .split_whitespace()
                    .filter(|w| w.len() > 2)
                    .map(String::from)
                    .collect();

                let overlap = query_words.intersection(&doc_words).count();
                let total = query_words.len().max(1);
                (overlap as f32 / total as f32).clamp(0.0, 1.0)
            })
            .collect();

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::cosine_similarity;

    #[tokio::test]
    async fn test_mock_embedding_similar_texts_score_high() {
        let provider = MockEmbeddingProvider::new(128);
        let a = provider.embed("failed login attempts last night").await.unwrap();
        let b = provider.embed("show failed login attempts").await.unwrap();
        let c = provider.embed("banana smoothie recipe").await.unwrap();

        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[tokio::test]
    async fn test_mock_embedding_is_deterministic() {
        let provider = MockEmbeddingProvider::new(64);
        let a = provider.embed("monitor authentication failures").await.unwrap();
        let b = provider.embed("monitor authentication failures").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_scripted_completion_rules() {
        let provider = MockCompletionProvider::new()
            .with_rule("Rewrite", "enhanced text")
            .with_default("fallback");

        let hit = provider.complete("Rewrite this query", 0.0, 64).await.unwrap();
        assert_eq!(hit, "enhanced text");

        let miss = provider.complete("something else", 0.0, 64).await.unwrap();
        assert_eq!(miss, "fallback");
    }

    #[tokio::test]
    async fn test_failing_completion() {
        let provider = MockCompletionProvider::failing();
        let result = provider.complete("anything", 0.0, 64).await;
        assert!(matches!(result, Err(AdapterError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_rerank_scores_align_with_overlap() {
        let provider = MockRerankProvider::new();
        let scores = provider
            .score_pairs(
                "failed login attempts",
                &["count failed login events", "disk usage report"],
            )
            .await
            .unwrap();

        assert!(scores[0] > scores[1]);
    }
}
