//! Two-stage example retriever.
//!
//! Stage 1 is cheap vector recall: cosine similarity between the query
//! embedding and the precomputed corpus embeddings, top-N candidates.
//! Stage 2 is precise: a pairwise scorer reads each (query, candidate)
//! pair directly and keeps the top-K. Corpus embeddings are computed
//! once when the index is built and never mutated, so retrieval for a
//! fixed query is fully deterministic; ties fall to corpus order.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use spl_adapters::{cosine_similarity, Embedding, EmbeddingProvider, RerankProvider};
use spl_core::{RetrievalResult, RetrievedExample, TrainingExample};

use crate::error::{ContextError, Result};

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Stage-1 candidate count; never below the requested K.
    pub candidates: usize,
    pub min_k: usize,
    pub max_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            candidates: 8,
            min_k: 2,
            max_k: 6,
        }
    }
}

struct IndexedExample {
    example: TrainingExample,
    embedding: Embedding,
}

/// Immutable retrieval index over the training corpus.
pub struct ExampleIndex {
    entries: Vec<IndexedExample>,
    embeddings: Arc<dyn EmbeddingProvider>,
    reranker: Arc<dyn RerankProvider>,
    config: RetrieverConfig,
}

impl ExampleIndex {
    /// Embed the whole corpus up front. Called once at startup.
    pub async fn build(
        corpus: Vec<TrainingExample>,
        embeddings: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn RerankProvider>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        if corpus.is_empty() {
            return Err(ContextError::indexing("training corpus is empty"));
        }

        let questions: Vec<&str> = corpus.iter().map(|e| e.question.as_str()).collect();
        let vectors = embeddings
            .embed_batch(&questions)
            .await
            .map_err(|e| ContextError::indexing(format!("failed to embed corpus: {}", e)))?;
        if vectors.len() != corpus.len() {
            return Err(ContextError::indexing(format!(
                "embedding count mismatch: {} questions, {} vectors",
                corpus.len(),
                vectors.len()
            )));
        }

        let entries = corpus
            .into_iter()
            .zip(vectors)
            .map(|(example, embedding)| IndexedExample { example, embedding })
            .collect::<Vec<_>>();

        info!(corpus_size = entries.len(), "Example index built");
        Ok(Self {
            entries,
            embeddings,
            reranker,
            config,
        })
    }

    pub fn corpus_size(&self) -> usize {
        self.entries.len()
    }

    /// Retrieve the K best exemplars for a query. K comes from the
    /// complexity heuristic unless `k_hint` pins it; either way it is
    /// clamped to the configured [min_k, max_k] band and to the corpus
    /// size.
    #[instrument(skip(self, text))]
    pub async fn retrieve(&self, text: &str, k_hint: Option<usize>) -> Result<RetrievalResult> {
        let k = k_hint
            .unwrap_or_else(|| choose_k(text, &self.config))
            .clamp(self.config.min_k, self.config.max_k)
            .min(self.entries.len());

        let query_embedding = self
            .embeddings
            .embed(text)
            .await
            .map_err(|e| ContextError::retrieval(format!("failed to embed query: {}", e)))?;

        // Stage 1: cosine recall, ties broken by corpus order.
        let n = self.config.candidates.max(k).min(self.entries.len());
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&query_embedding, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(n);

        // Stage 2: pairwise reranking over the candidates only. If the
        // scorer is down, fall back to the similarity order.
        let documents: Vec<&str> = scored
            .iter()
            .map(|(i, _)| self.entries[*i].example.question.as_str())
            .collect();
        let rerank_scores = match self.reranker.score_pairs(text, &documents).await {
            Ok(scores) if scores.len() == documents.len() => scores,
            Ok(scores) => {
                warn!(
                    expected = documents.len(),
                    got = scores.len(),
                    "Reranker returned wrong score count, falling back to similarity order"
                );
                scored.iter().map(|(_, sim)| *sim).collect()
            }
            Err(e) => {
                warn!(error = %e, "Reranker unavailable, falling back to similarity order");
                scored.iter().map(|(_, sim)| *sim).collect()
            }
        };

        let mut reranked: Vec<RetrievedExample> = scored
            .iter()
            .zip(rerank_scores)
            .map(|(&(i, similarity), rerank_score)| {
                let entry = &self.entries[i];
                RetrievedExample {
                    question: entry.example.question.clone(),
                    answer: entry.example.answer.clone(),
                    similarity,
                    rerank_score,
                    corpus_index: i,
                }
            })
            .collect();
        reranked.sort_by(|a, b| {
            b.rerank_score
                .partial_cmp(&a.rerank_score)
                .unwrap_or(Ordering::Equal)
                .then(a.corpus_index.cmp(&b.corpus_index))
        });
        reranked.truncate(k);

        debug!(k, candidates = n, "Examples retrieved");
        Ok(RetrievalResult { examples: reranked })
    }
}

/// Complexity heuristic for K: longer and entity-richer questions get
/// more demonstrations.
fn choose_k(text: &str, config: &RetrieverConfig) -> usize {
    let words = text.split_whitespace().count();
    let entities = text
        .split_whitespace()
        .filter(|w| {
            w.chars().next().is_some_and(|c| c.is_uppercase())
                || w.chars().any(|c| c.is_ascii_digit())
        })
        .count();

    let mut k = config.min_k;
    if words > 8 {
        k += 1;
    }
    if words > 16 {
        k += 1;
    }
    k += entities / 2;
    k.clamp(config.min_k, config.max_k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_adapters::{MockEmbeddingProvider, MockRerankProvider};
    use spl_core::CatalogSet;

    async fn index() -> ExampleIndex {
        ExampleIndex::build(
            CatalogSet::builtin().corpus,
            Arc::new(MockEmbeddingProvider::new(256)),
            Arc::new(MockRerankProvider::new()),
            RetrieverConfig::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_choose_k_stays_in_band() {
        let config = RetrieverConfig::default();
        assert_eq!(choose_k("logins", &config), 2);
        let long = "For TechCorp and SafeBank show every failed login attempt from remote \
                    addresses over the previous 7 days grouped by user and source";
        let k = choose_k(long, &config);
        assert!(k >= 2 && k <= 6);
        assert_eq!(choose_k(long, &config), k);
    }

    #[tokio::test]
    async fn test_retrieve_returns_exactly_k() {
        let idx = index().await;
        let result = idx.retrieve("failed logins last day", Some(3)).await.unwrap();
        assert_eq!(result.examples.len(), 3);
    }

    #[tokio::test]
    async fn test_k_hint_is_clamped() {
        let idx = index().await;
        let low = idx.retrieve("failed logins", Some(0)).await.unwrap();
        assert_eq!(low.examples.len(), 2);
        let high = idx.retrieve("failed logins", Some(50)).await.unwrap();
        assert!(high.examples.len() <= 6);
    }

    #[tokio::test]
    async fn test_retrieval_is_deterministic() {
        let idx = index().await;
        let text = "show failed logins for TechCorp in the last 24 hours";
        let first = idx.retrieve(text, Some(4)).await.unwrap();
        for _ in 0..3 {
            let again = idx.retrieve(text, Some(4)).await.unwrap();
            let a: Vec<usize> = first.examples.iter().map(|e| e.corpus_index).collect();
            let b: Vec<usize> = again.examples.iter().map(|e| e.corpus_index).collect();
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn test_results_come_from_similarity_candidates() {
        let idx = index().await;
        let text = "failed login attempts in the last 24 hours";

        // Recompute the stage-1 candidate set independently.
        let provider = MockEmbeddingProvider::new(256);
        let query = provider.embed(text).await.unwrap();
        let mut sims: Vec<(usize, f32)> = Vec::new();
        for (i, example) in CatalogSet::builtin().corpus.iter().enumerate() {
            let v = provider.embed(&example.question).await.unwrap();
            sims.push((i, cosine_similarity(&query, &v)));
        }
        sims.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
        let candidates: Vec<usize> = sims.iter().take(8).map(|(i, _)| *i).collect();

        let result = idx.retrieve(text, Some(5)).await.unwrap();
        for example in &result.examples {
            assert!(candidates.contains(&example.corpus_index));
        }
    }

    #[tokio::test]
    async fn test_best_example_matches_query_vocabulary() {
        let idx = index().await;
        let result = idx
            .retrieve("For TechCorp, show all failed logins in the last 24 hours", Some(3))
            .await
            .unwrap();
        let top = &result.examples[0];
        assert!(top.question.to_lowercase().contains("failed login"));
    }

    #[tokio::test]
    async fn test_empty_corpus_rejected() {
        let built = ExampleIndex::build(
            Vec::new(),
            Arc::new(MockEmbeddingProvider::new(256)),
            Arc::new(MockRerankProvider::new()),
            RetrieverConfig::default(),
        )
        .await;
        assert!(built.is_err());
    }
}
