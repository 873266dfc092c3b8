//! Bi-encoder reranker backed by the embedding service.
//!
//! A dedicated cross-encoder service gives finer pairwise scores, but
//! embedding both sides and taking cosine similarity is a serviceable
//! stand-in that needs no extra deployment. Scores land in [-1, 1].

use async_trait::async_trait;
use std::sync::Arc;

use crate::traits::{cosine_similarity, EmbeddingProvider, RerankProvider};
use crate::AdapterResult;

pub struct EmbeddingReranker {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingReranker {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RerankProvider for EmbeddingReranker {
    async fn score_pairs(&self, query: &str, documents: &[&str]) -> AdapterResult<Vec<f32>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = self.provider.embed(query).await?;
        let document_embeddings = self.provider.embed_batch(documents).await?;
        Ok(document_embeddings
            .iter()
            .map(|d| cosine_similarity(&query_embedding, d))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingProvider;

    #[tokio::test]
    async fn test_scores_follow_vocabulary_overlap() {
        let reranker = EmbeddingReranker::new(Arc::new(MockEmbeddingProvider::new(256)));
        let scores = reranker
            .score_pairs(
                "failed login attempts",
                &["show failed login attempts by user", "disk usage by host"],
            )
            .await
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_empty_documents() {
        let reranker = EmbeddingReranker::new(Arc::new(MockEmbeddingProvider::new(64)));
        let scores = reranker.score_pairs("anything", &[]).await.unwrap();
        assert!(scores.is_empty());
    }
}
